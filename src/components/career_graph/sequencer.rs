//! Chronological reveal playback.
//!
//! Work is scheduled as timers on a [`TimerQueue`] and executed from [`RevealSequencer::advance`],
//! which the frame loop calls with the frame timestamp. Nothing blocks: waiting for the layout
//! to settle is a timer that re-arms itself until the layout reports settled.

use std::collections::HashSet;

use log::{debug, info, warn};

use super::config::RevealTimings;
use super::easing::{Easing, Tween, TweenTarget};
use super::graph::CareerGraph;
use super::surface::VisualSurface;
use super::types::EntityNode;

/// One unit of playback: an entity and the skills and edges it brings in.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationStep {
	pub entity: usize,
	/// Month key of the entity's start.
	pub anchor: i32,
	/// All of the entity's skills, in edge order.
	pub skills: Vec<usize>,
	/// Skills first seen at this step.
	pub new_skills: Vec<usize>,
	/// Skills already revealed by an earlier step.
	pub reinforced: Vec<usize>,
	pub edges: Vec<usize>,
}

impl AnimationStep {
	pub fn is_new(&self, skill: usize) -> bool {
		self.new_skills.contains(&skill)
	}
}

/// Steps newest-first, classifying skills with a single seen-set scan in that order.
pub fn build_steps(graph: &CareerGraph) -> Vec<AnimationStep> {
	let mut seen = HashSet::new();
	graph
		.entities_newest_first()
		.into_iter()
		.map(|entity| {
			let skills = graph.skills_of(entity);
			let (new_skills, reinforced): (Vec<usize>, Vec<usize>) =
				skills.iter().copied().partition(|&s| seen.insert(s));
			let edges = graph
				.incident_edges(entity)
				.iter()
				.copied()
				.filter(|&e| graph.edges()[e].entity == entity)
				.collect();
			AnimationStep {
				entity,
				anchor: graph.entity(entity).map_or(0, EntityNode::anchor),
				skills,
				new_skills,
				reinforced,
				edges,
			}
		})
		.collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequencerPhase {
	#[default]
	Idle,
	Playing,
	Paused,
	Completed,
	Resetting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Debug, PartialEq)]
enum RevealAction {
	PollSettle { since: f64 },
	BeginStep(usize),
	ReadoutTick(i32),
	RevealEntity(usize),
	RevealSkill(usize),
	PulseSkill(usize),
	DrawEdge(usize),
	RestartAfterReset,
}

#[derive(Clone, Debug)]
struct Timer {
	id: TimerId,
	due: f64,
	generation: u64,
	action: RevealAction,
}

/// Pending delayed actions. Cancelling bumps the generation, so anything scheduled before
/// the cancel can never run afterwards.
#[derive(Debug, Default)]
pub struct TimerQueue {
	timers: Vec<Timer>,
	next_id: u64,
	generation: u64,
}

impl TimerQueue {
	fn schedule(&mut self, at: f64, delay: f64, action: RevealAction) -> TimerId {
		let id = TimerId(self.next_id);
		self.next_id += 1;
		self.timers.push(Timer {
			id,
			due: at + delay.max(0.0),
			generation: self.generation,
			action,
		});
		id
	}

	/// Earliest timer due at or before `now`; ties run in scheduling order.
	fn pop_due(&mut self, now: f64) -> Option<Timer> {
		loop {
			let pos = self
				.timers
				.iter()
				.enumerate()
				.filter(|(_, t)| t.due <= now)
				.min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
				.map(|(i, _)| i)?;
			let timer = self.timers.swap_remove(pos);
			if timer.generation == self.generation {
				return Some(timer);
			}
		}
	}

	pub fn cancel_all(&mut self) {
		self.timers.clear();
		self.generation += 1;
	}

	pub fn len(&self) -> usize {
		self.timers.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.timers.is_empty()
	}

	#[cfg(test)]
	pub fn generation(&self) -> u64 {
		self.generation
	}
}

/// Things that happened during a call into the sequencer, in execution order.
#[derive(Clone, Debug, PartialEq)]
pub enum RevealEvent {
	PhaseChanged(SequencerPhase),
	StepStarted { step: usize, entity: usize },
	ReadoutChanged(i32),
	EntityRevealed(usize),
	SkillRevealed(usize),
	SkillPulsed(usize),
	EdgeDrawn(usize),
	Completed,
}

impl RevealEvent {
	/// Whether the event flipped visibility, which requires re-applying the highlight.
	pub fn changes_visibility(&self) -> bool {
		matches!(
			self,
			RevealEvent::PhaseChanged(_)
				| RevealEvent::EntityRevealed(_)
				| RevealEvent::SkillRevealed(_)
				| RevealEvent::SkillPulsed(_)
				| RevealEvent::EdgeDrawn(_)
				| RevealEvent::Completed
		)
	}
}

pub struct RevealSequencer {
	steps: Vec<AnimationStep>,
	timings: RevealTimings,
	phase: SequencerPhase,
	timers: TimerQueue,
	tweens: Vec<Tween>,
	readout_start: i32,
	reduced_motion: bool,
	pending: Vec<RevealEvent>,
}

impl RevealSequencer {
	pub fn new(graph: &CareerGraph, timings: RevealTimings, reduced_motion: bool) -> Self {
		let steps = build_steps(graph);
		let latest_end = graph
			.entity_indices()
			.filter_map(|i| graph.entity(i))
			.map(EntityNode::end_anchor)
			.max()
			.unwrap_or(0);
		let readout_start = steps.first().map_or(latest_end, |s| latest_end.max(s.anchor));
		Self {
			steps,
			timings,
			phase: SequencerPhase::Idle,
			timers: TimerQueue::default(),
			tweens: Vec::new(),
			readout_start,
			reduced_motion,
			pending: Vec::new(),
		}
	}

	pub fn steps(&self) -> &[AnimationStep] {
		&self.steps
	}

	pub fn phase(&self) -> SequencerPhase {
		self.phase
	}

	pub fn pending_timers(&self) -> usize {
		self.timers.len()
	}

	#[cfg(test)]
	pub fn generation(&self) -> u64 {
		self.timers.generation()
	}

	fn set_phase(&mut self, phase: SequencerPhase) {
		if self.phase != phase {
			info!("reveal sequencer: {:?} -> {:?}", self.phase, phase);
			self.phase = phase;
			self.pending.push(RevealEvent::PhaseChanged(phase));
		}
	}

	/// Begin playback from IDLE. Under reduced motion, jump straight to the final state.
	pub fn start(&mut self, now: f64, surface: &mut VisualSurface) {
		if self.phase != SequencerPhase::Idle {
			return;
		}
		if self.reduced_motion {
			self.show_final(surface);
			return;
		}
		surface.hide_all();
		self.set_phase(SequencerPhase::Playing);
		self.timers
			.schedule(now, 0.0, RevealAction::PollSettle { since: now });
	}

	pub fn toggle_play_pause(&mut self, now: f64, surface: &mut VisualSurface) {
		match self.phase {
			SequencerPhase::Idle => self.start(now, surface),
			_ if self.reduced_motion => self.show_final(surface),
			SequencerPhase::Playing => {
				self.halt();
				self.set_phase(SequencerPhase::Paused);
			}
			SequencerPhase::Paused | SequencerPhase::Completed => {
				self.halt();
				surface.hide_all();
				self.set_phase(SequencerPhase::Resetting);
				self.timers.schedule(
					now,
					self.timings.reset_delay,
					RevealAction::RestartAfterReset,
				);
			}
			SequencerPhase::Resetting => {
				self.halt();
				self.set_phase(SequencerPhase::Paused);
			}
		}
	}

	/// Cancel everything; used on teardown.
	pub fn cancel(&mut self) {
		self.halt();
	}

	/// Cancel timers and freeze tweens at their last sampled value.
	fn halt(&mut self) {
		self.timers.cancel_all();
		self.tweens.clear();
	}

	fn show_final(&mut self, surface: &mut VisualSurface) {
		self.halt();
		surface.show_all();
		if let Some(last) = self.steps.last() {
			surface.readout.key = last.anchor;
			surface.readout.visible = true;
		}
		self.set_phase(SequencerPhase::Completed);
	}

	/// Run every timer due by `now`, then sample running tweens.
	pub fn advance(
		&mut self,
		now: f64,
		settled: bool,
		surface: &mut VisualSurface,
	) -> Vec<RevealEvent> {
		while let Some(timer) = self.timers.pop_due(now) {
			self.run(timer.due, timer.action, settled, surface);
		}
		self.sample_tweens(now, surface);
		std::mem::take(&mut self.pending)
	}

	fn run(&mut self, at: f64, action: RevealAction, settled: bool, surface: &mut VisualSurface) {
		match action {
			RevealAction::PollSettle { since } => {
				let timed_out = at - since >= self.timings.settle_timeout;
				if !settled && !timed_out {
					self.timers
						.schedule(at, self.timings.settle_poll, RevealAction::PollSettle { since });
					return;
				}
				if timed_out && !settled {
					warn!(
						"layout did not settle within {}ms, revealing anyway",
						self.timings.settle_timeout
					);
				}
				surface.hide_all();
				surface.readout.key = self.readout_start;
				self.timers.schedule(at, 0.0, RevealAction::BeginStep(0));
			}
			RevealAction::BeginStep(i) => self.begin_step(at, i, surface),
			RevealAction::ReadoutTick(key) => {
				surface.readout.key = key;
				self.pending.push(RevealEvent::ReadoutChanged(key));
			}
			RevealAction::RevealEntity(n) => {
				if let Some(node) = surface.nodes.get_mut(n) {
					node.visible = true;
					node.reveal = 0.0;
					node.fade = 0.0;
				}
				let d = self.timings.entity_reveal;
				self.tween(TweenTarget::NodeReveal(n), at, d, 0.0, 1.0, Easing::OutCubic);
				self.tween(TweenTarget::NodeFade(n), at, d, 0.0, 1.0, Easing::OutCubic);
				self.pending.push(RevealEvent::EntityRevealed(n));
			}
			RevealAction::RevealSkill(n) => {
				if let Some(node) = surface.nodes.get_mut(n) {
					node.visible = true;
					node.reveal = 0.0;
					node.fade = 1.0;
				}
				let (d, s) = (self.timings.skill_reveal, self.timings.overshoot);
				self.tween(TweenTarget::NodeReveal(n), at, d, 0.0, 1.0, Easing::OutBack(s));
				self.pending.push(RevealEvent::SkillRevealed(n));
			}
			RevealAction::PulseSkill(n) => {
				if let Some(node) = surface.nodes.get_mut(n) {
					node.visible = true;
					node.reveal = 1.0;
					node.fade = 1.0;
				}
				let (d, peak) = (self.timings.pulse, self.timings.pulse_scale);
				self.tween(TweenTarget::NodeReveal(n), at, d, 1.0, peak, Easing::Pulse);
				self.pending.push(RevealEvent::SkillPulsed(n));
			}
			RevealAction::DrawEdge(e) => {
				if let Some(edge) = surface.edges.get_mut(e) {
					edge.visible = true;
					edge.draw = 0.0;
				}
				let d = self.timings.edge_draw;
				self.tween(TweenTarget::EdgeDraw(e), at, d, 0.0, 1.0, Easing::OutCubic);
				self.pending.push(RevealEvent::EdgeDrawn(e));
			}
			RevealAction::RestartAfterReset => {
				self.set_phase(SequencerPhase::Playing);
				self.timers
					.schedule(at, 0.0, RevealAction::PollSettle { since: at });
			}
		}
	}

	fn begin_step(&mut self, at: f64, i: usize, surface: &mut VisualSurface) {
		let Some(step) = self.steps.get(i).cloned() else {
			self.complete(surface);
			return;
		};
		let t = &self.timings;
		self.pending.push(RevealEvent::StepStarted {
			step: i,
			entity: step.entity,
		});
		debug!(
			"reveal step {i}: entity {} ({} new, {} reinforced)",
			step.entity,
			step.new_skills.len(),
			step.reinforced.len()
		);

		surface.readout.visible = true;
		let months = (surface.readout.key - step.anchor).max(0);
		let per_month = if months > 0 {
			t.month_tick.min(t.max_scroll / months as f64)
		} else {
			0.0
		};
		let mut delays = Vec::new();
		for k in 1..=months {
			delays.push((k as f64 * per_month, RevealAction::ReadoutTick(surface.readout.key - k)));
		}
		let t0 = months as f64 * per_month;

		delays.push((t0, RevealAction::RevealEntity(step.entity)));
		let mut slowest = t.entity_reveal;

		for (j, &skill) in step.skills.iter().enumerate() {
			let delay = t0 + t.skill_start + j as f64 * t.skill_stagger;
			let (action, duration) = if step.is_new(skill) {
				(RevealAction::RevealSkill(skill), t.skill_reveal)
			} else {
				(RevealAction::PulseSkill(skill), t.pulse)
			};
			delays.push((delay, action));
			slowest = slowest.max(delay - t0 + duration);
		}
		for (j, &edge) in step.edges.iter().enumerate() {
			let delay = t0 + t.edge_start + j as f64 * t.edge_stagger;
			delays.push((delay, RevealAction::DrawEdge(edge)));
			slowest = slowest.max(delay - t0 + t.edge_draw);
		}
		delays.push((t0 + slowest + t.step_gap, RevealAction::BeginStep(i + 1)));

		for (delay, action) in delays {
			self.timers.schedule(at, delay, action);
		}
	}

	fn complete(&mut self, surface: &mut VisualSurface) {
		self.timers.cancel_all();
		self.sample_tweens(f64::INFINITY, surface);
		self.tweens.clear();
		self.set_phase(SequencerPhase::Completed);
		self.pending.push(RevealEvent::Completed);
	}

	fn tween(
		&mut self,
		target: TweenTarget,
		start: f64,
		duration: f64,
		from: f64,
		to: f64,
		easing: Easing,
	) {
		self.tweens.retain(|t| t.target != target);
		self.tweens.push(Tween {
			target,
			start,
			duration,
			from,
			to,
			easing,
		});
	}

	fn sample_tweens(&mut self, now: f64, surface: &mut VisualSurface) {
		for tween in &self.tweens {
			let value = tween.value_at(now);
			match tween.target {
				TweenTarget::NodeReveal(n) => {
					if let Some(node) = surface.nodes.get_mut(n) {
						node.reveal = value;
					}
				}
				TweenTarget::NodeFade(n) => {
					if let Some(node) = surface.nodes.get_mut(n) {
						node.fade = value;
					}
				}
				TweenTarget::EdgeDraw(e) => {
					if let Some(edge) = surface.edges.get_mut(e) {
						edge.draw = value;
					}
				}
			}
		}
		self.tweens.retain(|t| !t.is_done(now));
	}
}
