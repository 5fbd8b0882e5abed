use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::CareerGraphState;
use super::types::{Domain, GraphNode};

const BACKGROUND: &str = "#14161f";
const AXIS: &str = "rgba(220, 225, 240, 0.35)";
const TEXT: &str = "235, 238, 245";

fn domain_color(domain: Domain) -> &'static str {
	match domain {
		Domain::Clinical => "#e15759",
		Domain::Technical => "#59a14f",
		Domain::Leadership => "#edc948",
	}
}

pub fn render(state: &CareerGraphState, ctx: &CanvasRenderingContext2d) {
	let layout = &state.layout;
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, layout.width, layout.height);
	draw_axis(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	draw_readout(state, ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_axis(state: &CareerGraphState, ctx: &CanvasRenderingContext2d) {
	let layout = &state.layout;
	let x = layout.axis_x();
	let marks = layout.year_marks();
	let (Some(&(_, top)), Some(&(_, bottom))) = (marks.first(), marks.last()) else {
		return;
	};

	ctx.set_stroke_style_str(AXIS);
	ctx.set_line_width(1.0);
	ctx.begin_path();
	ctx.move_to(x, top - 12.0);
	ctx.line_to(x, bottom + 12.0);
	ctx.stroke();

	ctx.set_font("11px sans-serif");
	ctx.set_text_align("right");
	ctx.set_fill_style_str(&format!("rgba({TEXT}, 0.55)"));
	for (year, y) in marks {
		ctx.begin_path();
		ctx.move_to(x - 5.0, y);
		ctx.line_to(x, y);
		ctx.stroke();
		let _ = ctx.fill_text(&year.to_string(), x - 9.0, y + 4.0);
	}
	ctx.set_text_align("left");

	// Guide from the axis for the entity currently in focus.
	let Some((ex, ey)) = state
		.implicated_entity()
		.filter(|&i| state.surface.is_node_visible(i))
		.and_then(|i| layout.position(i))
	else {
		return;
	};
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(3.0),
		&JsValue::from_f64(4.0),
	));
	ctx.begin_path();
	ctx.move_to(x - 24.0, ey);
	ctx.line_to(ex, ey);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_edges(state: &CareerGraphState, ctx: &CanvasRenderingContext2d) {
	for (i, edge) in state.graph.edges().iter().enumerate() {
		let Some(visual) = state.surface.edges.get(i) else {
			continue;
		};
		if !visual.visible || visual.draw <= 0.0 {
			continue;
		}
		let (Some((x1, y1)), Some((x2, y2))) = (
			state.layout.position(edge.entity),
			state.layout.position(edge.skill),
		) else {
			continue;
		};
		let len = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
		if len < 0.001 {
			continue;
		}

		let color = state
			.graph
			.entity(edge.entity)
			.map_or("#9aa4b8", |e| e.color.as_str());
		ctx.set_global_alpha(visual.opacity.clamp(0.0, 1.0));
		ctx.set_stroke_style_str(color);
		ctx.set_line_width(visual.width);

		// The path is drawn in as one dash whose gap slides off the end.
		let partial = visual.draw < 1.0;
		if partial {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(len),
				&JsValue::from_f64(len),
			));
			ctx.set_line_dash_offset(len * (1.0 - visual.draw));
		}
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
		if partial {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_line_dash_offset(0.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &CareerGraphState, ctx: &CanvasRenderingContext2d) {
	let narrow = state.layout.is_narrow();
	// Skills first so entities stay on top of the axis.
	let order = state
		.graph
		.skill_indices()
		.chain(state.graph.entity_indices());

	for idx in order {
		let (Some(visual), Some(node), Some((x, y))) = (
			state.surface.nodes.get(idx),
			state.graph.node(idx),
			state.layout.position(idx),
		) else {
			continue;
		};
		let (radius, alpha) = (visual.effective_radius(), visual.effective_opacity());
		if radius <= 0.0 || alpha <= 0.0 {
			continue;
		}

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		match node {
			GraphNode::Entity(e) => {
				ctx.set_fill_style_str(&e.color);
				ctx.fill();
				if visual.stroke_width > 0.0 {
					ctx.set_stroke_style_str(&format!(
						"rgba(255, 255, 255, {})",
						visual.stroke_opacity
					));
					ctx.set_line_width(visual.stroke_width);
					ctx.stroke();
				}
			}
			GraphNode::Skill(s) => {
				ctx.set_fill_style_str(domain_color(s.domain));
				ctx.fill();
			}
		}

		let label = state.display_label(idx, narrow);
		ctx.set_fill_style_str(&format!("rgb({TEXT})"));
		if node.is_entity() {
			ctx.set_font("bold 12px sans-serif");
			let _ = ctx.fill_text(label, x + radius + 6.0, y - radius - 2.0);
		} else {
			ctx.set_font("11px sans-serif");
			let _ = ctx.fill_text(label, x + radius + 4.0, y + 4.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_readout(state: &CareerGraphState, ctx: &CanvasRenderingContext2d) {
	let readout = &state.surface.readout;
	if !readout.visible {
		return;
	}
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(&format!("rgba({TEXT}, 0.9)"));
	ctx.set_font("600 18px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&readout.text(), state.layout.axis_x(), 30.0);
	ctx.set_text_align("left");
}
