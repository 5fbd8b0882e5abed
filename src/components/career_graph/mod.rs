mod component;
mod config;
mod easing;
mod graph;
mod highlight;
mod interaction;
mod layout;
mod overlay;
mod render;
mod sequencer;
mod state;
mod surface;
mod types;

pub use component::CareerGraphCanvas;
pub use types::{Domain, EntityNode, GraphData, GraphEdge, GraphNode, SkillNode};
