use force_graph::SimulationParameters;

/// Tuning for one graph instance. Every field has a working default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphConfig {
	pub layout: LayoutConfig,
	pub reveal: RevealTimings,
	pub style: HighlightStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	pub node_mass: f32,
	/// Timeline axis position as a fraction of the viewport width.
	pub axis_fraction: f64,
	pub margin_top: f64,
	pub margin_bottom: f64,
	/// Pull of a skill toward the strength-weighted mean of its entities.
	pub anchor_strength: f64,
	pub center_strength: f64,
	/// Extra vertical pull toward the mean entity Y.
	pub vertical_bias: f64,
	/// Skills never settle closer than this to the right of the axis.
	pub min_skill_offset: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	/// Alpha a resize restarts from.
	pub alpha_reheat: f64,
	pub entity_radius: f64,
	pub skill_radius_min: f64,
	pub skill_radius_max: f64,
	/// Below this width skills draw their short label.
	pub narrow_width: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 120.0,
			force_spring: 0.04,
			force_max: 80.0,
			node_speed: 2500.0,
			damping_factor: 0.85,
			node_mass: 10.0,
			axis_fraction: 0.28,
			margin_top: 56.0,
			margin_bottom: 48.0,
			anchor_strength: 0.06,
			center_strength: 0.004,
			vertical_bias: 0.05,
			min_skill_offset: 70.0,
			// d3's default: decays to alpha_min in ~300 ticks
			alpha_decay: 0.0228,
			alpha_min: 0.001,
			alpha_reheat: 0.3,
			entity_radius: 11.0,
			skill_radius_min: 6.0,
			skill_radius_max: 14.0,
			narrow_width: 560.0,
		}
	}
}

impl LayoutConfig {
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Reveal sequencer timings, all in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealTimings {
	pub settle_poll: f64,
	pub settle_timeout: f64,
	pub month_tick: f64,
	/// Cap on one step's readout scroll; the per-month delay shrinks to fit.
	pub max_scroll: f64,
	pub entity_reveal: f64,
	pub skill_start: f64,
	pub skill_stagger: f64,
	pub skill_reveal: f64,
	pub pulse: f64,
	pub pulse_scale: f64,
	pub edge_start: f64,
	pub edge_stagger: f64,
	pub edge_draw: f64,
	pub step_gap: f64,
	pub reset_delay: f64,
	pub overshoot: f64,
}

impl Default for RevealTimings {
	fn default() -> Self {
		Self {
			settle_poll: 16.0,
			settle_timeout: 4000.0,
			month_tick: 35.0,
			max_scroll: 1200.0,
			entity_reveal: 500.0,
			skill_start: 250.0,
			skill_stagger: 120.0,
			skill_reveal: 550.0,
			pulse: 450.0,
			pulse_scale: 1.35,
			edge_start: 320.0,
			edge_stagger: 90.0,
			edge_draw: 600.0,
			step_gap: 400.0,
			reset_delay: 300.0,
			overshoot: 1.70158,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct HighlightStyle {
	pub rest_opacity: f64,
	pub active_opacity: f64,
	pub dim_opacity: f64,
	pub entity_stroke: f64,
	pub entity_stroke_active: f64,
	pub entity_stroke_connected: f64,
	pub entity_stroke_opacity: f64,
	pub skill_enlarge_active: f64,
	pub skill_enlarge_connected: f64,
	pub edge_ambient_base: f64,
	pub edge_ambient_scale: f64,
	pub edge_rest_width: f64,
	pub edge_active_width: f64,
	pub edge_dim_opacity: f64,
}

impl Default for HighlightStyle {
	fn default() -> Self {
		Self {
			rest_opacity: 0.9,
			active_opacity: 1.0,
			dim_opacity: 0.15,
			entity_stroke: 2.0,
			entity_stroke_active: 4.0,
			entity_stroke_connected: 3.0,
			entity_stroke_opacity: 0.85,
			skill_enlarge_active: 1.5,
			skill_enlarge_connected: 1.35,
			edge_ambient_base: 0.06,
			edge_ambient_scale: 0.24,
			edge_rest_width: 1.0,
			edge_active_width: 3.0,
			edge_dim_opacity: 0.04,
		}
	}
}
