use std::collections::BTreeSet;

use super::config::HighlightStyle;
use super::graph::CareerGraph;
use super::surface::{EdgeVisual, NodeVisual, VisualSurface};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Emphasis {
	Rest,
	Active,
	Connected,
	Dimmed,
}

/// Turns "which node is active" into emphasis attributes on the surface.
///
/// Total over its input: `None` and an out-of-range index resolve to the rest state. A hidden
/// active node still dims and emphasises the visible rest of the graph. Only visible nodes and
/// edges are touched, so playback visibility always wins.
#[derive(Clone, Debug, Default)]
pub struct HighlightResolver {
	style: HighlightStyle,
}

impl HighlightResolver {
	pub fn new(style: HighlightStyle) -> Self {
		Self { style }
	}

	pub fn apply(
		&self,
		graph: &CareerGraph,
		rest_radius: impl Fn(usize) -> f64,
		surface: &mut VisualSurface,
		active: Option<usize>,
	) {
		let active = active.filter(|&i| i < graph.node_count());
		let connected: BTreeSet<usize> = active.map(|a| graph.neighbors(a)).unwrap_or_default();

		for (i, visual) in surface.nodes.iter_mut().enumerate() {
			if !visual.visible {
				continue;
			}
			let emphasis = match active {
				None => Emphasis::Rest,
				Some(a) if a == i => Emphasis::Active,
				Some(_) if connected.contains(&i) => Emphasis::Connected,
				Some(_) => Emphasis::Dimmed,
			};
			let rest = rest_radius(i);
			if graph.is_entity(i) {
				self.style_entity(visual, rest, emphasis);
			} else {
				self.style_skill(visual, rest, emphasis);
			}
		}

		for (e, visual) in surface.edges.iter_mut().enumerate() {
			if !visual.visible {
				continue;
			}
			let Some(edge) = graph.edges().get(e) else {
				continue;
			};
			let emphasis = match active {
				None => Emphasis::Rest,
				Some(a) if edge.entity == a || edge.skill == a => Emphasis::Active,
				Some(_) => Emphasis::Dimmed,
			};
			self.style_edge(visual, edge.strength, emphasis);
		}
	}

	fn style_entity(&self, visual: &mut NodeVisual, rest: f64, emphasis: Emphasis) {
		let s = &self.style;
		visual.radius = rest;
		(visual.opacity, visual.stroke_width, visual.stroke_opacity) = match emphasis {
			Emphasis::Rest => (s.active_opacity, s.entity_stroke, s.entity_stroke_opacity),
			Emphasis::Active => (s.active_opacity, s.entity_stroke_active, 1.0),
			Emphasis::Connected => (s.active_opacity, s.entity_stroke_connected, 1.0),
			Emphasis::Dimmed => (s.dim_opacity, s.entity_stroke, s.dim_opacity),
		};
	}

	fn style_skill(&self, visual: &mut NodeVisual, rest: f64, emphasis: Emphasis) {
		let s = &self.style;
		visual.stroke_width = 0.0;
		visual.stroke_opacity = 0.0;
		(visual.opacity, visual.radius) = match emphasis {
			Emphasis::Rest => (s.rest_opacity, rest),
			Emphasis::Active => (s.active_opacity, rest * s.skill_enlarge_active),
			Emphasis::Connected => (s.active_opacity, rest * s.skill_enlarge_connected),
			Emphasis::Dimmed => (s.dim_opacity, rest),
		};
	}

	fn style_edge(&self, visual: &mut EdgeVisual, strength: f64, emphasis: Emphasis) {
		let s = &self.style;
		(visual.opacity, visual.width) = match emphasis {
			Emphasis::Active | Emphasis::Connected => (
				s.active_opacity,
				s.edge_rest_width + s.edge_active_width * strength,
			),
			Emphasis::Rest => (
				s.edge_ambient_base + s.edge_ambient_scale * strength,
				s.edge_rest_width,
			),
			Emphasis::Dimmed => (s.edge_dim_opacity, s.edge_rest_width),
		};
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::fixtures::*;
	use super::*;

	fn rest(i: usize) -> f64 {
		6.0 + i as f64
	}

	fn setup() -> (CareerGraph, HighlightResolver, VisualSurface) {
		let graph = CareerGraph::new(&two_roles());
		let surface = VisualSurface::new(graph.node_count(), graph.edges().len());
		(graph, HighlightResolver::default(), surface)
	}

	#[test]
	fn test_round_trip_restores_rest_state() {
		let (graph, resolver, mut surface) = setup();
		resolver.apply(&graph, rest, &mut surface, None);
		let rest_state = surface.clone();

		for id in ["e2020", "sql", "triage"] {
			resolver.apply(&graph, rest, &mut surface, graph.index_of(id));
			assert_ne!(surface, rest_state);
			resolver.apply(&graph, rest, &mut surface, None);
			assert_eq!(surface, rest_state);
		}
	}

	#[test]
	fn test_entity_highlight() {
		let (graph, resolver, mut surface) = setup();
		let style = HighlightStyle::default();
		let idx = |id| graph.index_of(id).unwrap();
		resolver.apply(&graph, rest, &mut surface, Some(idx("e2020")));

		assert_eq!(surface.nodes[idx("e2020")].stroke_width, style.entity_stroke_active);
		assert_eq!(
			surface.nodes[idx("sql")].radius,
			rest(idx("sql")) * style.skill_enlarge_connected
		);
		assert_eq!(surface.nodes[idx("rust")].opacity, style.active_opacity);
		assert_eq!(surface.nodes[idx("triage")].opacity, style.dim_opacity);
		assert_eq!(surface.nodes[idx("e2018")].opacity, style.dim_opacity);

		let incident = graph.edge_between(idx("e2020"), idx("rust")).unwrap();
		let other = graph.edge_between(idx("e2018"), idx("triage")).unwrap();
		assert_eq!(surface.edges[incident].opacity, 1.0);
		assert!(surface.edges[incident].width > style.edge_rest_width);
		assert_eq!(surface.edges[other].opacity, style.edge_dim_opacity);
	}

	#[test]
	fn test_skill_highlight_is_symmetric() {
		let (graph, resolver, mut surface) = setup();
		let style = HighlightStyle::default();
		let idx = |id| graph.index_of(id).unwrap();
		resolver.apply(&graph, rest, &mut surface, Some(idx("sql")));

		assert_eq!(
			surface.nodes[idx("sql")].radius,
			rest(idx("sql")) * style.skill_enlarge_active
		);
		for entity in ["e2020", "e2018"] {
			assert_eq!(
				surface.nodes[idx(entity)].stroke_width,
				style.entity_stroke_connected
			);
		}
		assert_eq!(surface.nodes[idx("rust")].opacity, style.dim_opacity);
		let rust_edge = graph.edge_between(idx("e2020"), idx("rust")).unwrap();
		assert_eq!(surface.edges[rust_edge].opacity, style.edge_dim_opacity);
	}

	#[test]
	fn test_rest_edges_scale_with_strength() {
		let (graph, resolver, mut surface) = setup();
		resolver.apply(&graph, rest, &mut surface, None);
		let idx = |id| graph.index_of(id).unwrap();
		let strong = graph.edge_between(idx("e2020"), idx("rust")).unwrap();
		let weak = graph.edge_between(idx("e2018"), idx("triage")).unwrap();
		assert!(surface.edges[strong].opacity > surface.edges[weak].opacity);
	}

	#[test]
	fn test_hidden_nodes_untouched_and_unknown_is_rest() {
		let (graph, resolver, mut surface) = setup();
		resolver.apply(&graph, rest, &mut surface, None);
		let rest_state = surface.clone();

		resolver.apply(&graph, rest, &mut surface, Some(999));
		assert_eq!(surface, rest_state);

		surface.hide_all();
		let hidden = surface.clone();
		resolver.apply(&graph, rest, &mut surface, graph.index_of("sql"));
		assert_eq!(surface, hidden);
	}

	#[test]
	fn test_hidden_active_node_still_dims_visible_nodes() {
		let (graph, resolver, mut surface) = setup();
		let style = HighlightStyle::default();
		let idx = |id| graph.index_of(id).unwrap();
		resolver.apply(&graph, rest, &mut surface, None);
		surface.nodes[idx("e2018")].visible = false;
		let before = surface.nodes[idx("e2018")].clone();

		resolver.apply(&graph, rest, &mut surface, Some(idx("e2018")));
		assert_eq!(surface.nodes[idx("e2018")], before);
		assert_eq!(surface.nodes[idx("e2020")].opacity, style.dim_opacity);
		assert_eq!(
			surface.nodes[idx("sql")].radius,
			rest(idx("sql")) * style.skill_enlarge_connected
		);
	}
}
