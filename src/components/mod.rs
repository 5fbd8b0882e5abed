pub mod career_graph;
