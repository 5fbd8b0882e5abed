use std::collections::HashSet;

use thiserror::Error;

/// Competency area a skill belongs to. Declaration order is the overlay grouping order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
	Clinical,
	Technical,
	Leadership,
}

impl Domain {
	pub fn as_str(self) -> &'static str {
		match self {
			Domain::Clinical => "clinical",
			Domain::Technical => "technical",
			Domain::Leadership => "leadership",
		}
	}
}

/// A time-bounded role or education period, anchored on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityNode {
	pub id: String,
	pub label: String,
	pub organization: String,
	pub color: String,
	pub start_year: i32,
	/// 1..=12
	pub start_month: u8,
	/// `None` means ongoing.
	pub end_year: Option<i32>,
}

impl EntityNode {
	/// Months since year 0, used to order entities on the timeline.
	pub fn anchor(&self) -> i32 {
		month_key(self.start_year, self.start_month)
	}

	/// Last month covered by this entity (December of the end year, or the start when ongoing).
	pub fn end_anchor(&self) -> i32 {
		match self.end_year {
			Some(year) => month_key(year, 12).max(self.anchor()),
			None => self.anchor(),
		}
	}

	pub fn year_range(&self) -> String {
		match self.end_year {
			Some(end) if end == self.start_year => self.start_year.to_string(),
			Some(end) => format!("{}–{}", self.start_year, end),
			None => format!("{}–present", self.start_year),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkillNode {
	pub id: String,
	pub label: String,
	pub domain: Domain,
	/// Used instead of `label` in narrow layouts.
	pub short_label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphNode {
	Entity(EntityNode),
	Skill(SkillNode),
}

impl GraphNode {
	pub fn id(&self) -> &str {
		match self {
			GraphNode::Entity(e) => &e.id,
			GraphNode::Skill(s) => &s.id,
		}
	}

	pub fn label(&self) -> &str {
		match self {
			GraphNode::Entity(e) => &e.label,
			GraphNode::Skill(s) => &s.label,
		}
	}

	pub fn is_entity(&self) -> bool {
		matches!(self, GraphNode::Entity(_))
	}

	pub fn as_entity(&self) -> Option<&EntityNode> {
		match self {
			GraphNode::Entity(e) => Some(e),
			GraphNode::Skill(_) => None,
		}
	}

	pub fn as_skill(&self) -> Option<&SkillNode> {
		match self {
			GraphNode::Skill(s) => Some(s),
			GraphNode::Entity(_) => None,
		}
	}
}

/// Entity → skill link. Rendered undirected.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	/// In (0, 1].
	pub strength: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

/// Authoring defects in a [`GraphData`] set.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphDataError {
	#[error("duplicate node id: {0}")]
	DuplicateId(String),

	#[error("edge {from} -> {to} references missing node {missing}")]
	MissingEndpoint {
		from: String,
		to: String,
		missing: String,
	},

	#[error("edge {from} -> {to} must run from an entity to a skill")]
	WrongEndpointKind { from: String, to: String },

	#[error("edge {from} -> {to} has strength {strength}, expected (0, 1]")]
	InvalidStrength {
		from: String,
		to: String,
		strength: f64,
	},

	#[error("entity {id} has start month {month}, expected 1..=12")]
	InvalidMonth { id: String, month: u8 },

	#[error("entity {id} ends in {end} before it starts in {start}")]
	EndsBeforeStart { id: String, start: i32, end: i32 },
}

impl GraphData {
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id() == id)
	}

	/// Check every invariant of the data set, collecting all defects.
	pub fn validate(&self) -> Result<(), Vec<GraphDataError>> {
		let mut errors = Vec::new();
		let mut seen = HashSet::new();

		for node in &self.nodes {
			if !seen.insert(node.id()) {
				errors.push(GraphDataError::DuplicateId(node.id().to_string()));
			}
			if let GraphNode::Entity(e) = node {
				if !(1..=12).contains(&e.start_month) {
					errors.push(GraphDataError::InvalidMonth {
						id: e.id.clone(),
						month: e.start_month,
					});
				}
				if let Some(end) = e.end_year.filter(|&end| end < e.start_year) {
					errors.push(GraphDataError::EndsBeforeStart {
						id: e.id.clone(),
						start: e.start_year,
						end,
					});
				}
			}
		}

		for edge in &self.edges {
			if let Some(err) = self.edge_error(edge) {
				errors.push(err);
			}
		}

		if errors.is_empty() { Ok(()) } else { Err(errors) }
	}

	/// First defect of a single edge, if any.
	pub(crate) fn edge_error(&self, edge: &GraphEdge) -> Option<GraphDataError> {
		let missing = |id: &str| GraphDataError::MissingEndpoint {
			from: edge.source.clone(),
			to: edge.target.clone(),
			missing: id.to_string(),
		};
		let Some(source) = self.node(&edge.source) else {
			return Some(missing(&edge.source));
		};
		let Some(target) = self.node(&edge.target) else {
			return Some(missing(&edge.target));
		};
		if !source.is_entity() || target.is_entity() {
			return Some(GraphDataError::WrongEndpointKind {
				from: edge.source.clone(),
				to: edge.target.clone(),
			});
		}
		if !(edge.strength > 0.0 && edge.strength <= 1.0) {
			return Some(GraphDataError::InvalidStrength {
				from: edge.source.clone(),
				to: edge.target.clone(),
				strength: edge.strength,
			});
		}
		None
	}
}

/// Months since year 0 for a (year, 1-based month) pair.
pub fn month_key(year: i32, month: u8) -> i32 {
	year * 12 + (month.clamp(1, 12) as i32 - 1)
}

/// Inverse of [`month_key`].
pub fn from_month_key(key: i32) -> (i32, u8) {
	(key.div_euclid(12), (key.rem_euclid(12) + 1) as u8)
}
