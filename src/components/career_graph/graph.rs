use std::collections::{BTreeSet, HashMap};

use log::error;

use super::types::{EntityNode, GraphData, GraphNode, SkillNode};

/// A validated edge, endpoints resolved to node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEdge {
	pub entity: usize,
	pub skill: usize,
	pub strength: f64,
}

/// Static topology of one graph instance: node lookup and derived adjacency.
///
/// Indices are positions in `nodes`; every other module addresses nodes and edges by index
/// and only goes through ids at the boundaries.
#[derive(Clone, Debug)]
pub struct CareerGraph {
	nodes: Vec<GraphNode>,
	edges: Vec<ResolvedEdge>,
	by_id: HashMap<String, usize>,
	/// Incident edge indices per node, in edge order.
	incident: Vec<Vec<usize>>,
}

impl CareerGraph {
	pub fn new(data: &GraphData) -> Self {
		if let Err(errors) = data.validate() {
			for err in &errors {
				error!("career graph data: {err}");
			}
			debug_assert!(errors.is_empty(), "malformed career graph data: {errors:?}");
		}

		let mut by_id = HashMap::new();
		let mut nodes = Vec::with_capacity(data.nodes.len());
		for node in &data.nodes {
			if by_id.contains_key(node.id()) {
				continue;
			}
			by_id.insert(node.id().to_string(), nodes.len());
			nodes.push(node.clone());
		}

		let mut incident = vec![Vec::new(); nodes.len()];
		let mut edges = Vec::with_capacity(data.edges.len());
		for edge in &data.edges {
			if data.edge_error(edge).is_some() {
				continue;
			}
			let (Some(&entity), Some(&skill)) = (by_id.get(&edge.source), by_id.get(&edge.target))
			else {
				continue;
			};
			incident[entity].push(edges.len());
			incident[skill].push(edges.len());
			edges.push(ResolvedEdge {
				entity,
				skill,
				strength: edge.strength,
			});
		}

		Self {
			nodes,
			edges,
			by_id,
			incident,
		}
	}

	#[cfg(test)]
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[ResolvedEdge] {
		&self.edges
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn node(&self, idx: usize) -> Option<&GraphNode> {
		self.nodes.get(idx)
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.by_id.get(id).copied()
	}

	pub fn id_of(&self, idx: usize) -> Option<&str> {
		self.nodes.get(idx).map(GraphNode::id)
	}

	pub fn entity(&self, idx: usize) -> Option<&EntityNode> {
		self.node(idx).and_then(GraphNode::as_entity)
	}

	pub fn skill(&self, idx: usize) -> Option<&SkillNode> {
		self.node(idx).and_then(GraphNode::as_skill)
	}

	pub fn is_entity(&self, idx: usize) -> bool {
		self.node(idx).is_some_and(GraphNode::is_entity)
	}

	pub fn entity_indices(&self) -> impl Iterator<Item = usize> + '_ {
		(0..self.nodes.len()).filter(|&i| self.is_entity(i))
	}

	pub fn skill_indices(&self) -> impl Iterator<Item = usize> + '_ {
		(0..self.nodes.len()).filter(|&i| !self.is_entity(i))
	}

	/// Edge indices touching `idx`, in authoring order.
	pub fn incident_edges(&self, idx: usize) -> &[usize] {
		self.incident.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The node at the other end of `edge` from `idx`.
	pub fn opposite(&self, edge: usize, idx: usize) -> Option<usize> {
		let e = self.edges.get(edge)?;
		if e.entity == idx {
			Some(e.skill)
		} else if e.skill == idx {
			Some(e.entity)
		} else {
			None
		}
	}

	/// Nodes sharing an edge with `idx`, either direction.
	pub fn neighbors(&self, idx: usize) -> BTreeSet<usize> {
		self.incident_edges(idx)
			.iter()
			.filter_map(|&e| self.opposite(e, idx))
			.collect()
	}

	/// Skills linked from an entity, in edge order.
	pub fn skills_of(&self, entity: usize) -> Vec<usize> {
		self.incident_edges(entity)
			.iter()
			.filter_map(|&e| self.edges.get(e))
			.filter(|e| e.entity == entity)
			.map(|e| e.skill)
			.collect()
	}

	/// Entities referencing a skill, with edge strength.
	pub fn entities_of(&self, skill: usize) -> Vec<(usize, f64)> {
		self.incident_edges(skill)
			.iter()
			.filter_map(|&e| self.edges.get(e))
			.filter(|e| e.skill == skill)
			.map(|e| (e.entity, e.strength))
			.collect()
	}

	#[cfg(test)]
	pub fn edge_between(&self, entity: usize, skill: usize) -> Option<usize> {
		self.incident_edges(entity)
			.iter()
			.copied()
			.find(|&e| self.edges[e].entity == entity && self.edges[e].skill == skill)
	}

	/// Entity indices, newest start first. Ties keep authoring order.
	pub fn entities_newest_first(&self) -> Vec<usize> {
		let mut entities: Vec<usize> = self.entity_indices().collect();
		entities.sort_by_key(|&i| std::cmp::Reverse(self.entity(i).map_or(0, EntityNode::anchor)));
		entities
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::fixtures::*;
	use super::*;

	#[test]
	fn test_adjacency_is_symmetric() {
		let graph = CareerGraph::new(&two_roles());
		let sql = graph.index_of("sql").unwrap();
		let e2020 = graph.index_of("e2020").unwrap();
		let e2018 = graph.index_of("e2018").unwrap();

		assert_eq!(graph.neighbors(sql), BTreeSet::from([e2018, e2020]));
		assert!(graph.neighbors(e2020).contains(&sql));
		assert_eq!(graph.entities_of(sql).len(), 2);
	}

	#[test]
	fn test_skills_follow_edge_order() {
		let graph = CareerGraph::new(&two_roles());
		let e2018 = graph.index_of("e2018").unwrap();
		let ids: Vec<&str> = graph
			.skills_of(e2018)
			.into_iter()
			.filter_map(|i| graph.id_of(i))
			.collect();
		assert_eq!(ids, ["sql", "triage"]);
	}

	#[test]
	fn test_entities_newest_first() {
		let graph = CareerGraph::new(&two_roles());
		let ids: Vec<&str> = graph
			.entities_newest_first()
			.into_iter()
			.filter_map(|i| graph.id_of(i))
			.collect();
		assert_eq!(ids, ["e2020", "e2018"]);
	}

	#[test]
	fn test_unknown_lookups_degrade() {
		let graph = CareerGraph::new(&two_roles());
		assert_eq!(graph.index_of("nope"), None);
		assert!(graph.incident_edges(99).is_empty());
		assert!(graph.neighbors(99).is_empty());
		assert_eq!(graph.opposite(99, 0), None);
	}

	#[test]
	#[cfg(debug_assertions)]
	#[should_panic(expected = "malformed career graph data")]
	fn test_malformed_data_fails_loudly_in_development() {
		let mut data = two_roles();
		data.edges.push(edge("e2020", "ghost", 0.5));
		CareerGraph::new(&data);
	}
}
