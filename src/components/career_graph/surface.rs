//! Visual attributes of the rendered graph.
//!
//! Two writers share these records. The reveal sequencer owns visibility and the entrance
//! factors (`visible`, `reveal`, `fade`, `draw`). The highlight resolver owns emphasis
//! (`opacity`, `radius`, `stroke_*`, `width`). Renderers combine both.

use super::types::from_month_key;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisual {
	pub visible: bool,
	/// Radius multiplier driven by reveal/pulse animations.
	pub reveal: f64,
	/// Opacity multiplier driven by entrance animations.
	pub fade: f64,
	pub opacity: f64,
	pub radius: f64,
	pub stroke_width: f64,
	pub stroke_opacity: f64,
}

impl Default for NodeVisual {
	fn default() -> Self {
		Self {
			visible: true,
			reveal: 1.0,
			fade: 1.0,
			opacity: 1.0,
			radius: 0.0,
			stroke_width: 0.0,
			stroke_opacity: 0.0,
		}
	}
}

impl NodeVisual {
	pub fn effective_radius(&self) -> f64 {
		if self.visible { (self.radius * self.reveal).max(0.0) } else { 0.0 }
	}

	pub fn effective_opacity(&self) -> f64 {
		if self.visible { (self.opacity * self.fade).clamp(0.0, 1.0) } else { 0.0 }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeVisual {
	pub visible: bool,
	/// Fraction of the path length drawn, 0..=1.
	pub draw: f64,
	pub opacity: f64,
	pub width: f64,
}

impl Default for EdgeVisual {
	fn default() -> Self {
		Self {
			visible: true,
			draw: 1.0,
			opacity: 1.0,
			width: 1.0,
		}
	}
}

/// Month/year readout scrolled by the sequencer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DateReadout {
	pub visible: bool,
	/// Month key, see [`super::types::month_key`].
	pub key: i32,
}

const MONTHS: [&str; 12] = [
	"Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl DateReadout {
	pub fn text(&self) -> String {
		let (year, month) = from_month_key(self.key);
		format!("{} {}", MONTHS[(month as usize - 1) % 12], year)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisualSurface {
	pub nodes: Vec<NodeVisual>,
	pub edges: Vec<EdgeVisual>,
	pub readout: DateReadout,
}

impl VisualSurface {
	/// Fully revealed surface; emphasis attributes are filled in by the resolver.
	pub fn new(node_count: usize, edge_count: usize) -> Self {
		Self {
			nodes: vec![NodeVisual::default(); node_count],
			edges: vec![EdgeVisual::default(); edge_count],
			readout: DateReadout::default(),
		}
	}

	pub fn hide_all(&mut self) {
		for node in &mut self.nodes {
			node.visible = false;
			node.reveal = 0.0;
			node.fade = 0.0;
		}
		for edge in &mut self.edges {
			edge.visible = false;
			edge.draw = 0.0;
		}
		self.readout.visible = false;
	}

	pub fn show_all(&mut self) {
		for node in &mut self.nodes {
			node.visible = true;
			node.reveal = 1.0;
			node.fade = 1.0;
		}
		for edge in &mut self.edges {
			edge.visible = true;
			edge.draw = 1.0;
		}
	}

	pub fn is_node_visible(&self, idx: usize) -> bool {
		self.nodes.get(idx).is_some_and(|n| n.visible)
	}

	pub fn visible_nodes(&self) -> usize {
		self.nodes.iter().filter(|n| n.visible).count()
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::month_key;
	use super::*;

	#[test]
	fn test_hidden_nodes_have_no_extent() {
		let mut surface = VisualSurface::new(2, 1);
		surface.nodes[0].radius = 8.0;
		surface.nodes[0].opacity = 0.9;
		assert_eq!(surface.nodes[0].effective_radius(), 8.0);

		surface.hide_all();
		assert_eq!(surface.nodes[0].effective_radius(), 0.0);
		assert_eq!(surface.nodes[0].effective_opacity(), 0.0);
		assert_eq!(surface.visible_nodes(), 0);
		assert_eq!(surface.nodes[0].radius, 8.0);

		surface.show_all();
		assert_eq!(surface.visible_nodes(), 2);
		assert_eq!(surface.edges[0].draw, 1.0);
	}

	#[test]
	fn test_readout_text() {
		let readout = DateReadout {
			visible: true,
			key: month_key(2019, 3),
		};
		assert_eq!(readout.text(), "Mar 2019");
	}
}
