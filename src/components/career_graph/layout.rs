use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};
use log::debug;

use super::config::LayoutConfig;
use super::graph::CareerGraph;
use super::types::EntityNode;

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Per-body payload carried through the force simulation.
#[derive(Clone, Debug, Default)]
pub struct SimBody {
	pub index: usize,
}

/// Force-directed positions for every node, with entities pinned to the timeline axis.
///
/// Positions are owned here. Everything else reads them through [`LayoutEngine::position`]
/// or [`LayoutEngine::positions`] and never writes back.
pub struct LayoutEngine {
	sim: ForceGraph<SimBody, ()>,
	config: LayoutConfig,
	positions: Vec<(f64, f64)>,
	is_entity: Vec<bool>,
	/// Entity time anchor (months), `None` for skills.
	anchors: Vec<Option<i32>>,
	/// (entity, strength) pairs per skill.
	owners: Vec<Vec<(usize, f64)>>,
	key_range: Option<(i32, i32)>,
	rest_radii: Vec<f64>,
	rest_final: bool,
	pub width: f64,
	pub height: f64,
	alpha: f64,
	running: bool,
	ticks: u32,
}

impl LayoutEngine {
	pub fn new(graph: &CareerGraph, width: f64, height: f64, config: LayoutConfig) -> Self {
		let n = graph.node_count();
		let anchors: Vec<Option<i32>> = (0..n)
			.map(|i| graph.entity(i).map(EntityNode::anchor))
			.collect();
		let key_range = anchors
			.iter()
			.flatten()
			.fold(None, |acc: Option<(i32, i32)>, &k| match acc {
				Some((lo, hi)) => Some((lo.min(k), hi.max(k))),
				None => Some((k, k)),
			});
		let owners: Vec<Vec<(usize, f64)>> = (0..n).map(|i| graph.entities_of(i)).collect();

		let mut engine = Self {
			sim: ForceGraph::new(config.simulation_parameters()),
			positions: vec![(0.0, 0.0); n],
			is_entity: (0..n).map(|i| graph.is_entity(i)).collect(),
			anchors,
			owners,
			key_range,
			rest_radii: Vec::new(),
			rest_final: false,
			width,
			height,
			alpha: 1.0,
			running: true,
			ticks: 0,
			config,
		};

		let mut idx_of: Vec<DefaultNodeIdx> = Vec::with_capacity(n);
		for i in 0..n {
			let (x, y) = engine.initial_position(i);
			let idx = engine.sim.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: engine.config.node_mass,
				is_anchor: engine.is_entity[i],
				user_data: SimBody { index: i },
			});
			idx_of.push(idx);
			engine.positions[i] = (x, y);
		}
		for edge in graph.edges() {
			if let (Some(&a), Some(&b)) = (idx_of.get(edge.entity), idx_of.get(edge.skill)) {
				engine.sim.add_edge(a, b, EdgeData::default());
			}
		}
		engine.rest_radii = engine.provisional_radii();
		engine
	}

	pub fn axis_x(&self) -> f64 {
		self.width * self.config.axis_fraction
	}

	pub fn is_narrow(&self) -> bool {
		self.width < self.config.narrow_width
	}

	/// Timeline Y for a month anchor; later months sit higher.
	pub fn timeline_y(&self, key: i32) -> f64 {
		let top = self.config.margin_top;
		let usable = (self.height - top - self.config.margin_bottom).max(1.0);
		match self.key_range {
			Some((lo, hi)) if hi > lo => top + (hi - key) as f64 / (hi - lo) as f64 * usable,
			_ => top + usable / 2.0,
		}
	}

	/// Years on the axis with their Y, newest first.
	pub fn year_marks(&self) -> Vec<(i32, f64)> {
		let Some((lo, hi)) = self.key_range else {
			return Vec::new();
		};
		let (first, last) = (lo.div_euclid(12), hi.div_euclid(12));
		(first..=last)
			.rev()
			.map(|year| {
				let key = (year * 12).clamp(lo, hi);
				(year, self.timeline_y(key))
			})
			.collect()
	}

	fn skill_field_center(&self) -> (f64, f64) {
		let left = self.axis_x() + self.config.min_skill_offset;
		(
			left + (self.width - left) * 0.45,
			self.config.margin_top
				+ (self.height - self.config.margin_top - self.config.margin_bottom) / 2.0,
		)
	}

	/// Where a skill is pulled: the field centre in X, its owners' weighted mean in Y.
	fn skill_target(&self, i: usize) -> (f64, f64) {
		let (cx, cy) = self.skill_field_center();
		let owners = &self.owners[i];
		let total: f64 = owners.iter().map(|&(_, s)| s).sum();
		if total <= 0.0 {
			return (cx, cy);
		}
		let y = owners
			.iter()
			.map(|&(e, s)| self.anchors[e].map_or(cy, |k| self.timeline_y(k)) * s)
			.sum::<f64>()
			/ total;
		(cx, y)
	}

	fn initial_position(&self, i: usize) -> (f64, f64) {
		if let Some(key) = self.anchors[i] {
			return (self.axis_x(), self.timeline_y(key));
		}
		let (tx, ty) = self.skill_target(i);
		let angle = i as f64 * GOLDEN_ANGLE;
		let r = 24.0 + 6.0 * i as f64;
		(tx + r * angle.cos(), ty + r * angle.sin())
	}

	/// Run ticks synchronously, before the first frame.
	pub fn warm_up(&mut self, ticks: u32, dt: f32) {
		for _ in 0..ticks {
			if !self.running {
				break;
			}
			self.tick(dt);
		}
	}

	pub fn tick(&mut self, dt: f32) {
		if !self.running {
			return;
		}
		self.sim.update(dt);
		self.apply_timeline_forces();
		self.sync_positions();

		self.ticks += 1;
		self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;
		if self.alpha < self.config.alpha_min {
			self.running = false;
			if !self.rest_final {
				self.rest_radii = self.settled_radii();
				self.rest_final = true;
			}
			debug!("layout settled after {} ticks", self.ticks);
		}
	}

	/// Extra forces on skills on top of the simulation's charge and springs.
	fn apply_timeline_forces(&mut self) {
		let alpha = self.alpha;
		let (cx, cy) = self.skill_field_center();
		let min_x = self.axis_x() + self.config.min_skill_offset;
		let max_x = (self.width - 16.0).max(min_x);
		let min_y = self.config.margin_top;
		let max_y = (self.height - self.config.margin_bottom).max(min_y);
		let targets: Vec<(f64, f64)> = (0..self.positions.len())
			.map(|i| self.skill_target(i))
			.collect();
		let entity_pins: Vec<Option<(f64, f64)>> = self
			.anchors
			.iter()
			.map(|a| a.map(|k| (self.axis_x(), self.timeline_y(k))))
			.collect();
		let cfg = &self.config;

		self.sim.visit_nodes_mut(|node| {
			let i = node.data.user_data.index;
			if let Some((px, py)) = entity_pins[i] {
				node.data.x = px as f32;
				node.data.y = py as f32;
				return;
			}
			let (mut x, mut y) = (node.data.x as f64, node.data.y as f64);
			let (tx, ty) = targets[i];
			x += (tx - x) * cfg.anchor_strength * alpha;
			y += (ty - y) * cfg.anchor_strength * alpha;
			y += (ty - y) * cfg.vertical_bias * alpha;
			x += (cx - x) * cfg.center_strength * alpha;
			y += (cy - y) * cfg.center_strength * alpha;
			node.data.x = x.clamp(min_x, max_x) as f32;
			node.data.y = y.clamp(min_y, max_y) as f32;
		});
	}

	/// Copy positions out of the simulation. Entities report their exact pin, not the `f32`
	/// the simulation stores.
	fn sync_positions(&mut self) {
		let pins: Vec<Option<(f64, f64)>> = self
			.anchors
			.iter()
			.map(|a| a.map(|k| (self.axis_x(), self.timeline_y(k))))
			.collect();
		let positions = &mut self.positions;
		self.sim.visit_nodes(|node| {
			let i = node.data.user_data.index;
			if let Some(p) = positions.get_mut(i) {
				*p = pins
					.get(i)
					.copied()
					.flatten()
					.unwrap_or((node.x() as f64, node.y() as f64));
			}
		});
	}

	/// Restart from current positions with the new viewport.
	pub fn resize(&mut self, width: f64, height: f64) {
		if width == self.width && height == self.height {
			return;
		}
		self.width = width;
		self.height = height;
		self.apply_timeline_forces();
		self.sync_positions();
		self.alpha = self.alpha.max(self.config.alpha_reheat);
		self.running = true;
		debug!("layout reheated for {width}x{height}");
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.positions.get(idx).copied()
	}

	pub fn positions(&self) -> &[(f64, f64)] {
		&self.positions
	}

	/// Default, non-highlighted radius. Fixed once the layout first settles.
	pub fn rest_radius(&self, idx: usize) -> f64 {
		self.rest_radii
			.get(idx)
			.copied()
			.unwrap_or(self.config.skill_radius_min)
	}

	pub fn rest_radii_final(&self) -> bool {
		self.rest_final
	}

	fn provisional_radii(&self) -> Vec<f64> {
		let weight = |i: usize| self.owners[i].iter().map(|&(_, s)| s).sum::<f64>();
		let max_weight = (0..self.positions.len())
			.filter(|&i| !self.is_entity[i])
			.map(weight)
			.fold(0.0, f64::max);
		let (lo, hi) = (self.config.skill_radius_min, self.config.skill_radius_max);
		(0..self.positions.len())
			.map(|i| {
				if self.is_entity[i] {
					self.config.entity_radius
				} else if max_weight > 0.0 {
					lo + (hi - lo) * (weight(i) / max_weight).sqrt()
				} else {
					lo
				}
			})
			.collect()
	}

	/// Provisional radii shrunk so no skill overlaps its nearest neighbour.
	fn settled_radii(&self) -> Vec<f64> {
		let mut radii = self.provisional_radii();
		for i in 0..radii.len() {
			if self.is_entity[i] {
				continue;
			}
			let (x, y) = self.positions[i];
			let nearest = self
				.positions
				.iter()
				.enumerate()
				.filter(|&(j, _)| j != i)
				.map(|(_, &(ox, oy))| ((ox - x).powi(2) + (oy - y).powi(2)).sqrt())
				.fold(f64::INFINITY, f64::min);
			let room = (nearest / 2.0 - 1.0).max(self.config.skill_radius_min);
			radii[i] = radii[i].min(room);
		}
		radii
	}
}
