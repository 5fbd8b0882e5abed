//! Single authority over which node is active.
//!
//! Pointer, overlay keyboard and the external `highlighted_node_id` prop all become
//! [`InteractionEvent`]s. Events queue up and are reduced once per frame by
//! [`InteractionCoordinator::flush`], which reports at most one highlight change.

use std::collections::BTreeSet;

use log::debug;

use super::graph::CareerGraph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HighlightReason {
	Pinned,
	Hovered,
	External,
	#[default]
	None,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightState {
	pub active: Option<usize>,
	/// Nodes sharing an edge with `active`.
	pub connected: BTreeSet<usize>,
	pub reason: HighlightReason,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationSource {
	Pointer,
	Keyboard,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
	PointerEnter(String),
	PointerLeave(String),
	Focus(String),
	Blur(String),
	Activate { id: String, source: ActivationSource },
	/// Highlight request from sibling UI; `None` withdraws it.
	External(Option<String>),
	ClearPin,
	Reset,
}

/// Callbacks owed to the host after a flush.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
	EntitySelected(String),
	SkillSelected(String),
	HoverChanged(Option<String>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Flush {
	/// The new state, present only when it differs from the previous flush.
	pub changed: Option<HighlightState>,
	pub outbound: Vec<Outbound>,
}

#[derive(Debug, Default)]
pub struct InteractionCoordinator {
	queue: Vec<InteractionEvent>,
	seq: u64,
	/// Local hover (pointer or focus) with the sequence number that set it.
	hover: Option<(usize, u64)>,
	external: Option<(usize, u64)>,
	pin: Option<usize>,
	resolved: HighlightState,
	reported_hover: Option<usize>,
}

impl InteractionCoordinator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn dispatch(&mut self, event: InteractionEvent) {
		self.queue.push(event);
	}

	/// Reduce queued events and report what changed.
	pub fn flush(&mut self, graph: &CareerGraph) -> Flush {
		let mut outbound = Vec::new();
		for event in std::mem::take(&mut self.queue) {
			self.reduce(graph, event, &mut outbound);
		}

		let hover = self.hover.map(|(i, _)| i);
		if hover != self.reported_hover {
			self.reported_hover = hover;
			outbound.push(Outbound::HoverChanged(
				hover.and_then(|i| graph.id_of(i)).map(str::to_string),
			));
		}

		let next = self.resolve(graph);
		let changed = (next != self.resolved).then(|| {
			self.resolved = next.clone();
			next
		});
		Flush { changed, outbound }
	}

	fn reduce(&mut self, graph: &CareerGraph, event: InteractionEvent, outbound: &mut Vec<Outbound>) {
		self.seq += 1;
		let seq = self.seq;
		let lookup = |id: &str| {
			let idx = graph.index_of(id);
			if idx.is_none() {
				debug!("interaction: ignoring unknown node id {id:?}");
			}
			idx
		};

		match event {
			InteractionEvent::PointerEnter(id) | InteractionEvent::Focus(id) => {
				if let Some(idx) = lookup(&id) {
					self.hover = Some((idx, seq));
				}
			}
			InteractionEvent::PointerLeave(id) | InteractionEvent::Blur(id) => {
				if self.hover.is_some_and(|(h, _)| Some(h) == graph.index_of(&id)) {
					self.hover = None;
				}
			}
			InteractionEvent::Activate { id, source } => {
				let Some(idx) = lookup(&id) else {
					return;
				};
				if self.pin == Some(idx) {
					debug!("interaction: unpinned {id} via {source:?}");
					self.pin = None;
					return;
				}
				debug!("interaction: pinned {id} via {source:?}");
				self.pin = Some(idx);
				outbound.push(if graph.is_entity(idx) {
					Outbound::EntitySelected(id)
				} else {
					Outbound::SkillSelected(id)
				});
			}
			InteractionEvent::External(id) => {
				self.external = id.as_deref().and_then(lookup).map(|idx| (idx, seq));
			}
			InteractionEvent::ClearPin => self.pin = None,
			InteractionEvent::Reset => {
				self.hover = None;
				self.external = None;
				self.pin = None;
			}
		}
	}

	/// Pin wins once set; otherwise the most recent of hover and external; otherwise nothing.
	pub fn resolve(&self, graph: &CareerGraph) -> HighlightState {
		let transient = match (self.hover, self.external) {
			(Some(h), Some(e)) if e.1 > h.1 => Some((e.0, HighlightReason::External)),
			(Some(h), _) => Some((h.0, HighlightReason::Hovered)),
			(None, Some(e)) => Some((e.0, HighlightReason::External)),
			(None, None) => None,
		};
		let (active, reason) = match (self.pin, transient) {
			(Some(pin), _) => (Some(pin), HighlightReason::Pinned),
			(None, Some((idx, reason))) => (Some(idx), reason),
			(None, None) => (None, HighlightReason::None),
		};
		HighlightState {
			active,
			connected: active.map(|a| graph.neighbors(a)).unwrap_or_default(),
			reason,
		}
	}

	#[cfg(test)]
	pub fn state(&self) -> &HighlightState {
		&self.resolved
	}

	#[cfg(test)]
	pub fn pinned(&self) -> Option<usize> {
		self.pin
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hover.map(|(i, _)| i)
	}

	/// The entity an "entity highlight" should point at. Skills alone never qualify.
	pub fn implicated_entity(&self, graph: &CareerGraph) -> Option<usize> {
		let current = self
			.hovered()
			.or(self.external.map(|(i, _)| i))
			.or(self.pin);
		current
			.filter(|&i| graph.is_entity(i))
			.or(self.pin.filter(|&i| graph.is_entity(i)))
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::fixtures::*;
	use super::*;

	fn setup() -> (CareerGraph, InteractionCoordinator) {
		(CareerGraph::new(&two_roles()), InteractionCoordinator::new())
	}

	fn activate(id: &str, source: ActivationSource) -> InteractionEvent {
		InteractionEvent::Activate {
			id: id.into(),
			source,
		}
	}

	#[test]
	fn test_hover_sets_and_clears() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		let flush = coord.flush(&graph);
		let state = flush.changed.unwrap();
		assert_eq!(state.active, graph.index_of("sql"));
		assert_eq!(state.reason, HighlightReason::Hovered);
		assert_eq!(state.connected.len(), 2);
		assert_eq!(flush.outbound, [Outbound::HoverChanged(Some("sql".into()))]);

		coord.dispatch(InteractionEvent::PointerLeave("sql".into()));
		let flush = coord.flush(&graph);
		assert_eq!(flush.changed.unwrap(), HighlightState::default());
		assert_eq!(flush.outbound, [Outbound::HoverChanged(None)]);
	}

	#[test]
	fn test_burst_within_a_frame_coalesces() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		coord.flush(&graph);

		coord.dispatch(InteractionEvent::PointerLeave("sql".into()));
		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		let flush = coord.flush(&graph);
		assert_eq!(flush, Flush::default());

		coord.dispatch(InteractionEvent::PointerLeave("sql".into()));
		coord.dispatch(InteractionEvent::PointerEnter("rust".into()));
		coord.dispatch(InteractionEvent::PointerLeave("rust".into()));
		coord.dispatch(InteractionEvent::PointerEnter("triage".into()));
		let flush = coord.flush(&graph);
		assert_eq!(flush.changed.unwrap().active, graph.index_of("triage"));
		assert_eq!(flush.outbound.len(), 1);
	}

	#[test]
	fn test_stale_leave_does_not_clear_newer_hover() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("rust".into()));
		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		coord.dispatch(InteractionEvent::PointerLeave("rust".into()));
		let state = coord.flush(&graph).changed.unwrap();
		assert_eq!(state.active, graph.index_of("sql"));
	}

	#[test]
	fn test_most_recent_of_hover_and_external_wins() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("rust".into()));
		coord.dispatch(InteractionEvent::External(Some("triage".into())));
		let state = coord.flush(&graph).changed.unwrap();
		assert_eq!(state.active, graph.index_of("triage"));
		assert_eq!(state.reason, HighlightReason::External);

		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		let state = coord.flush(&graph).changed.unwrap();
		assert_eq!(state.active, graph.index_of("sql"));

		coord.dispatch(InteractionEvent::PointerLeave("sql".into()));
		let state = coord.flush(&graph).changed.unwrap();
		assert_eq!(state.active, graph.index_of("triage"));
	}

	#[test]
	fn test_external_changes_are_not_echoed_as_hover() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::External(Some("sql".into())));
		let flush = coord.flush(&graph);
		assert!(flush.changed.is_some());
		assert!(flush.outbound.is_empty());
	}

	#[test]
	fn test_pin_wins_and_survives_hover_out() {
		let (graph, mut coord) = setup();
		coord.dispatch(activate("e2018", ActivationSource::Pointer));
		let flush = coord.flush(&graph);
		assert_eq!(flush.outbound, [Outbound::EntitySelected("e2018".into())]);

		coord.dispatch(InteractionEvent::PointerEnter("rust".into()));
		coord.dispatch(InteractionEvent::External(Some("sql".into())));
		let flush = coord.flush(&graph);
		assert_eq!(flush.changed, None);
		assert_eq!(coord.state().reason, HighlightReason::Pinned);

		coord.dispatch(InteractionEvent::PointerLeave("rust".into()));
		coord.flush(&graph);
		assert_eq!(coord.state().active, graph.index_of("e2018"));

		coord.dispatch(InteractionEvent::ClearPin);
		let state = coord.flush(&graph).changed.unwrap();
		assert_eq!(state.active, graph.index_of("sql"));
		assert_eq!(state.reason, HighlightReason::External);
	}

	#[test]
	fn test_activating_pin_again_unpins() {
		let (graph, mut coord) = setup();
		coord.dispatch(activate("sql", ActivationSource::Pointer));
		coord.dispatch(activate("sql", ActivationSource::Pointer));
		let flush = coord.flush(&graph);
		assert_eq!(coord.pinned(), None);
		assert_eq!(flush.changed, None);
		assert_eq!(flush.outbound, [Outbound::SkillSelected("sql".into())]);
	}

	#[test]
	fn test_keyboard_and_pointer_activation_match() {
		let graph = CareerGraph::new(&two_roles());
		let mut by_pointer = InteractionCoordinator::new();
		let mut by_keyboard = InteractionCoordinator::new();
		by_pointer.dispatch(activate("sql", ActivationSource::Pointer));
		by_keyboard.dispatch(activate("sql", ActivationSource::Keyboard));

		let a = by_pointer.flush(&graph);
		let b = by_keyboard.flush(&graph);
		assert_eq!(a, b);
		assert_eq!(a.outbound, [Outbound::SkillSelected("sql".into())]);
		assert_eq!(by_pointer.pinned(), by_keyboard.pinned());
	}

	#[test]
	fn test_unknown_ids_are_no_ops() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("ghost".into()));
		coord.dispatch(activate("ghost", ActivationSource::Keyboard));
		coord.dispatch(InteractionEvent::External(Some("ghost".into())));
		assert_eq!(coord.flush(&graph), Flush::default());
	}

	#[test]
	fn test_implicated_entity_role_fallback() {
		let (graph, mut coord) = setup();
		coord.dispatch(InteractionEvent::PointerEnter("sql".into()));
		coord.flush(&graph);
		assert_eq!(coord.implicated_entity(&graph), None);

		coord.dispatch(activate("e2020", ActivationSource::Pointer));
		coord.flush(&graph);
		assert_eq!(coord.implicated_entity(&graph), graph.index_of("e2020"));

		coord.dispatch(InteractionEvent::PointerEnter("e2018".into()));
		coord.flush(&graph);
		assert_eq!(coord.implicated_entity(&graph), graph.index_of("e2018"));
	}

	#[test]
	fn test_reset_clears_everything() {
		let (graph, mut coord) = setup();
		coord.dispatch(activate("e2020", ActivationSource::Pointer));
		coord.dispatch(InteractionEvent::Focus("sql".into()));
		coord.flush(&graph);
		coord.dispatch(InteractionEvent::Reset);
		let flush = coord.flush(&graph);
		assert_eq!(flush.changed, Some(HighlightState::default()));
		assert_eq!(flush.outbound, [Outbound::HoverChanged(None)]);
	}
}
