use log::{debug, info};

use super::config::GraphConfig;
use super::graph::CareerGraph;
use super::highlight::HighlightResolver;
use super::interaction::{HighlightState, InteractionCoordinator, InteractionEvent, Outbound};
use super::layout::LayoutEngine;
use super::overlay::{self, OverlayControl, OverlayRect};
use super::sequencer::{RevealEvent, RevealSequencer, SequencerPhase};
use super::surface::VisualSurface;
use super::types::{GraphData, GraphNode, from_month_key};

/// Fixed simulation step per frame, in seconds.
pub const FRAME_DT: f32 = 0.016;
/// Ticks run before the first frame so playback does not wait on a cold layout.
pub const WARMUP_TICKS: u32 = 80;
/// Extra pointer slack around a node, in pixels.
pub const HIT_PADDING: f64 = 4.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
	pub outbound: Vec<Outbound>,
	pub reveal: Vec<RevealEvent>,
	pub highlight_changed: bool,
}

/// Everything one graph instance owns. No state is shared between instances.
pub struct CareerGraphState {
	pub graph: CareerGraph,
	pub layout: LayoutEngine,
	pub surface: VisualSurface,
	pub sequencer: RevealSequencer,
	pub controls: Vec<OverlayControl>,
	resolver: HighlightResolver,
	coordinator: InteractionCoordinator,
	highlight: HighlightState,
	/// Node under the canvas pointer, as last reported to the coordinator.
	pointer: Option<usize>,
	rest_radii_applied: bool,
	destroyed: bool,
}

impl CareerGraphState {
	pub fn new(
		data: &GraphData,
		width: f64,
		height: f64,
		config: GraphConfig,
		reduced_motion: bool,
	) -> Self {
		let graph = CareerGraph::new(data);
		let mut layout = LayoutEngine::new(&graph, width, height, config.layout);
		layout.warm_up(WARMUP_TICKS, FRAME_DT);
		let surface = VisualSurface::new(graph.node_count(), graph.edges().len());
		let sequencer = RevealSequencer::new(&graph, config.reveal, reduced_motion);
		let controls = overlay::controls(&graph);
		info!(
			"career graph: {} nodes, {} edges, {} reveal steps",
			graph.node_count(),
			graph.edges().len(),
			sequencer.steps().len()
		);

		let mut state = Self {
			graph,
			layout,
			surface,
			sequencer,
			controls,
			resolver: HighlightResolver::new(config.style),
			coordinator: InteractionCoordinator::new(),
			highlight: HighlightState::default(),
			pointer: None,
			rest_radii_applied: false,
			destroyed: false,
		};
		state.apply_highlight();
		state
	}

	/// Start playback (or jump to the final state under reduced motion).
	pub fn mount(&mut self, now: f64) {
		self.sequencer.start(now, &mut self.surface);
		self.apply_highlight();
	}

	/// Advance layout, playback and input by one frame.
	pub fn frame(&mut self, now: f64) -> FrameOutput {
		if self.destroyed {
			return FrameOutput::default();
		}
		if self.layout.is_running() {
			self.layout.tick(FRAME_DT);
		}

		let reveal = self
			.sequencer
			.advance(now, self.layout.is_settled(), &mut self.surface);
		let resets = reveal.iter().any(|e| {
			matches!(
				e,
				RevealEvent::Completed | RevealEvent::PhaseChanged(SequencerPhase::Resetting)
			)
		});
		if resets {
			debug!("reveal reset: {} nodes visible", self.surface.visible_nodes());
			// The coordinator forgets hover too; the next pointer move re-enters.
			self.pointer = None;
			self.coordinator.dispatch(InteractionEvent::Reset);
		}

		let flush = self.coordinator.flush(&self.graph);
		let highlight_changed = flush.changed.is_some();
		if let Some(state) = flush.changed {
			self.highlight = state;
		}
		let radii_ready = self.layout.rest_radii_final() && !self.rest_radii_applied;
		if highlight_changed || radii_ready || reveal.iter().any(RevealEvent::changes_visibility) {
			self.rest_radii_applied |= radii_ready;
			self.apply_highlight();
		}

		FrameOutput {
			outbound: flush.outbound,
			reveal,
			highlight_changed,
		}
	}

	/// Queue an input event; it is reduced on the next frame.
	pub fn dispatch(&mut self, event: InteractionEvent) {
		if !self.destroyed {
			self.coordinator.dispatch(event);
		}
	}

	/// Track the node under the canvas pointer. Returns whether a node is hit.
	pub fn pointer_moved(&mut self, x: f64, y: f64) -> bool {
		let hit = self.node_at_position(x, y);
		if hit != self.pointer {
			self.pointer_left();
			if let Some(id) = hit.and_then(|i| self.graph.id_of(i)).map(str::to_string) {
				self.dispatch(InteractionEvent::PointerEnter(id));
			}
			self.pointer = hit;
		}
		hit.is_some()
	}

	pub fn pointer_left(&mut self) {
		let previous = self.pointer.take();
		if let Some(id) = previous.and_then(|i| self.graph.id_of(i)).map(str::to_string) {
			self.dispatch(InteractionEvent::PointerLeave(id));
		}
	}

	pub fn toggle_play_pause(&mut self, now: f64) {
		if !self.destroyed {
			self.sequencer.toggle_play_pause(now, &mut self.surface);
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.layout.resize(width, height);
	}

	/// Stop the simulation and drop all pending timers.
	pub fn destroy(&mut self) {
		info!(
			"career graph destroyed with {} pending timers",
			self.sequencer.pending_timers()
		);
		self.sequencer.cancel();
		self.layout.stop();
		self.destroyed = true;
	}

	fn apply_highlight(&mut self) {
		let layout = &self.layout;
		self.resolver.apply(
			&self.graph,
			|i| layout.rest_radius(i),
			&mut self.surface,
			self.highlight.active,
		);
	}

	#[cfg(test)]
	pub fn highlight(&self) -> &HighlightState {
		&self.highlight
	}

	#[cfg(test)]
	pub fn pinned(&self) -> Option<usize> {
		self.coordinator.pinned()
	}

	pub fn implicated_entity(&self) -> Option<usize> {
		self.coordinator.implicated_entity(&self.graph)
	}

	/// Nearest visible node under a point.
	pub fn node_at_position(&self, x: f64, y: f64) -> Option<usize> {
		self.layout
			.positions()
			.iter()
			.enumerate()
			.filter_map(|(i, &(nx, ny))| {
				let visual = self.surface.nodes.get(i)?;
				if !visual.visible {
					return None;
				}
				let dist = ((nx - x).powi(2) + (ny - y).powi(2)).sqrt();
				(dist <= visual.effective_radius() + HIT_PADDING).then_some((i, dist))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	pub fn overlay_rects(&self) -> Vec<OverlayRect> {
		overlay::placements(&self.controls, self.layout.positions(), &self.surface)
	}

	/// Text drawn next to a node; skills shorten in narrow viewports.
	pub fn display_label(&self, idx: usize, narrow: bool) -> &str {
		match self.graph.node(idx) {
			Some(GraphNode::Skill(s)) if narrow => s.short_label.as_deref().unwrap_or(&s.label),
			Some(node) => node.label(),
			None => "",
		}
	}

	/// Live-region text for a reveal event.
	pub fn announcement(&self, event: &RevealEvent) -> Option<String> {
		match event {
			RevealEvent::StepStarted { entity, .. } => {
				let e = self.graph.entity(*entity)?;
				let (year, _) = from_month_key(e.anchor());
				Some(format!("{year} · {}, {}", e.label, e.organization))
			}
			RevealEvent::PhaseChanged(SequencerPhase::Paused) => Some("Timeline paused".into()),
			RevealEvent::Completed => Some("Timeline complete".into()),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::interaction::ActivationSource;
	use super::super::types::fixtures::*;
	use super::*;

	fn state(reduced_motion: bool) -> CareerGraphState {
		CareerGraphState::new(&two_roles(), 900.0, 700.0, GraphConfig::default(), reduced_motion)
	}

	fn run_until(state: &mut CareerGraphState, from: f64, until: f64) -> (f64, Vec<FrameOutput>) {
		let mut now = from;
		let mut out = Vec::new();
		while now < until {
			out.push(state.frame(now));
			now += 16.0;
		}
		(now, out)
	}

	#[test]
	fn test_reduced_motion_mounts_fully_revealed() {
		let mut s = state(true);
		s.mount(0.0);
		assert_eq!(s.sequencer.pending_timers(), 0);
		assert_eq!(s.sequencer.phase(), SequencerPhase::Completed);
		for i in 0..s.graph.node_count() {
			assert!(s.surface.nodes[i].visible);
			assert_eq!(s.surface.nodes[i].effective_radius(), s.layout.rest_radius(i));
			assert!(s.layout.position(i).is_some());
		}
	}

	#[test]
	fn test_overlay_activation_matches_pointer_click() {
		let mut by_keyboard = state(true);
		let mut by_pointer = state(true);
		by_keyboard.mount(0.0);
		by_pointer.mount(0.0);

		by_keyboard.dispatch(InteractionEvent::Activate {
			id: "sql".into(),
			source: ActivationSource::Keyboard,
		});
		by_pointer.dispatch(InteractionEvent::Activate {
			id: "sql".into(),
			source: ActivationSource::Pointer,
		});
		let a = by_keyboard.frame(16.0);
		let b = by_pointer.frame(16.0);
		assert_eq!(a.outbound, b.outbound);
		assert_eq!(a.outbound, [Outbound::SkillSelected("sql".into())]);
		assert_eq!(by_keyboard.pinned(), by_pointer.pinned());
		assert_eq!(by_keyboard.pinned(), by_keyboard.graph.index_of("sql"));
	}

	#[test]
	fn test_highlight_during_playback_respects_visibility() {
		let mut s = state(false);
		s.mount(0.0);
		let e2020 = s.graph.index_of("e2020").unwrap();
		let e2018 = s.graph.index_of("e2018").unwrap();

		let mut now = 0.0;
		while !s.surface.nodes[e2020].visible {
			s.frame(now);
			now += 16.0;
			assert!(now < 30_000.0);
		}
		s.dispatch(InteractionEvent::External(Some("e2018".into())));
		let out = s.frame(now);
		assert!(out.highlight_changed);
		assert!(!s.surface.nodes[e2018].visible);
		assert_eq!(s.surface.nodes[e2018].effective_opacity(), 0.0);
		assert!(s.surface.nodes[e2020].opacity < 0.5);

		let (_, _) = run_until(&mut s, now + 16.0, 30_000.0);
		assert_eq!(s.sequencer.phase(), SequencerPhase::Completed);
		assert!(s.surface.nodes.iter().all(|n| n.visible));
		assert_eq!(s.highlight(), &HighlightState::default());
	}

	#[test]
	fn test_instances_do_not_share_state() {
		let mut a = state(false);
		let mut b = state(false);
		a.mount(0.0);
		b.mount(0.0);
		run_until(&mut a, 0.0, 1000.0);
		a.toggle_play_pause(1000.0);
		assert_eq!(a.sequencer.phase(), SequencerPhase::Paused);
		assert_eq!(b.sequencer.phase(), SequencerPhase::Playing);
		assert!(b.sequencer.pending_timers() > 0);
	}

	#[test]
	fn test_destroy_stops_everything() {
		let mut s = state(false);
		s.mount(0.0);
		run_until(&mut s, 0.0, 500.0);
		s.destroy();
		assert_eq!(s.sequencer.pending_timers(), 0);
		assert!(!s.layout.is_running());
		let before = s.surface.clone();
		s.dispatch(InteractionEvent::PointerEnter("sql".into()));
		assert_eq!(s.frame(600.0), FrameOutput::default());
		assert_eq!(s.surface, before);
	}

	#[test]
	fn test_hover_returns_after_playback_completes() {
		let mut s = state(false);
		s.mount(0.0);
		let sql = s.graph.index_of("sql").unwrap();
		let mut now = 0.0;
		while !s.surface.nodes[sql].visible {
			s.frame(now);
			now += 16.0;
			assert!(now < 30_000.0);
		}
		let (x, y) = s.layout.position(sql).unwrap();
		assert!(s.pointer_moved(x, y));
		s.frame(now);
		assert_eq!(s.highlight().active, Some(sql));

		let (now, _) = run_until(&mut s, now + 16.0, 30_000.0);
		assert_eq!(s.sequencer.phase(), SequencerPhase::Completed);
		assert_eq!(s.highlight().active, None);

		// Pointer never left the node.
		let (x, y) = s.layout.position(sql).unwrap();
		assert!(s.pointer_moved(x, y));
		let out = s.frame(now);
		assert_eq!(s.highlight().active, Some(sql));
		assert_eq!(out.outbound, [Outbound::HoverChanged(Some("sql".into()))]);
	}

	#[test]
	fn test_pointer_moves_are_coalesced() {
		let mut s = state(true);
		s.mount(0.0);
		let sql = s.graph.index_of("sql").unwrap();
		let (x, y) = s.layout.position(sql).unwrap();
		s.pointer_moved(x, y);
		s.frame(16.0);
		s.pointer_moved(x + 1.0, y);
		assert_eq!(s.frame(32.0), FrameOutput::default());

		assert!(!s.pointer_moved(-500.0, -500.0));
		let out = s.frame(48.0);
		assert_eq!(out.outbound, [Outbound::HoverChanged(None)]);
		assert_eq!(s.highlight().active, None);
	}

	#[test]
	fn test_hit_testing_ignores_hidden_nodes() {
		let mut s = state(true);
		s.mount(0.0);
		let sql = s.graph.index_of("sql").unwrap();
		let (x, y) = s.layout.position(sql).unwrap();
		assert_eq!(s.node_at_position(x, y), Some(sql));
		s.surface.nodes[sql].visible = false;
		assert_ne!(s.node_at_position(x, y), Some(sql));
		assert_eq!(s.node_at_position(-500.0, -500.0), None);
	}

	#[test]
	fn test_position_lookup_by_id() {
		let mut s = state(false);
		s.mount(0.0);
		s.frame(0.0);
		for node in s.graph.nodes() {
			let idx = s.graph.index_of(node.id());
			assert!(idx.and_then(|i| s.layout.position(i)).is_some(), "{}", node.id());
		}
		assert_eq!(s.graph.index_of("missing"), None);
	}

	#[test]
	fn test_announcements() {
		let s = state(true);
		let e2020 = s.graph.index_of("e2020").unwrap();
		assert_eq!(
			s.announcement(&RevealEvent::StepStarted {
				step: 0,
				entity: e2020
			}),
			Some("2020 · Role e2020, Org e2020".into())
		);
		assert_eq!(s.announcement(&RevealEvent::EdgeDrawn(0)), None);
	}
}
