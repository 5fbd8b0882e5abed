//! Invisible, focusable controls laid over the canvas, one per node.
//!
//! Order and labels come from node data only. Placement follows the layout's live positions,
//! recomputed every frame.

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent, MouseEvent};

use super::graph::CareerGraph;
use super::interaction::{ActivationSource, InteractionEvent};
use super::surface::VisualSurface;
use super::types::GraphNode;

/// Smallest hit target, in CSS pixels.
pub const MIN_TARGET: f64 = 24.0;

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayControl {
	pub node: usize,
	pub id: String,
	pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayRect {
	pub left: f64,
	pub top: f64,
	pub size: f64,
	/// Not yet revealed; kept out of the tab order.
	pub hidden: bool,
}

impl OverlayRect {
	pub fn style(&self) -> String {
		format!(
			"position: absolute; left: {:.1}px; top: {:.1}px; width: {:.1}px; height: {:.1}px; \
			 background: transparent; border: 0; border-radius: 50%;",
			self.left, self.top, self.size, self.size
		)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKey {
	Next,
	Previous,
	ClearPin,
	Other,
}

impl OverlayKey {
	pub fn from_key(key: &str) -> Self {
		match key {
			"ArrowDown" | "ArrowRight" => OverlayKey::Next,
			"ArrowUp" | "ArrowLeft" => OverlayKey::Previous,
			"Escape" => OverlayKey::ClearPin,
			_ => OverlayKey::Other,
		}
	}
}

/// Screen-reader label built from semantic data.
pub fn accessible_label(node: &GraphNode) -> String {
	match node {
		GraphNode::Entity(e) => format!("{}, {}, {}", e.label, e.organization, e.year_range()),
		GraphNode::Skill(s) => s.label.clone(),
	}
}

/// Entities newest first, then skills by domain and label.
pub fn tab_order(graph: &CareerGraph) -> Vec<usize> {
	let mut skills: Vec<usize> = graph.skill_indices().collect();
	skills.sort_by_cached_key(|&i| {
		let s = graph.skill(i);
		(
			s.map(|s| s.domain),
			s.map(|s| s.label.to_lowercase()),
			graph.id_of(i).map(str::to_string),
		)
	});
	let mut order = graph.entities_newest_first();
	order.extend(skills);
	order
}

pub fn controls(graph: &CareerGraph) -> Vec<OverlayControl> {
	tab_order(graph)
		.into_iter()
		.filter_map(|node| {
			let data = graph.node(node)?;
			Some(OverlayControl {
				node,
				id: data.id().to_string(),
				label: accessible_label(data),
			})
		})
		.collect()
}

/// Current placement of each control, in control order.
pub fn placements(
	controls: &[OverlayControl],
	positions: &[(f64, f64)],
	surface: &VisualSurface,
) -> Vec<OverlayRect> {
	controls
		.iter()
		.map(|c| {
			let (x, y) = positions.get(c.node).copied().unwrap_or_default();
			let (radius, visible) = surface
				.nodes
				.get(c.node)
				.map_or((0.0, false), |n| (n.radius, n.visible));
			let size = (radius * 2.0).max(MIN_TARGET);
			OverlayRect {
				left: x - size / 2.0,
				top: y - size / 2.0,
				size,
				hidden: !visible,
			}
		})
		.collect()
}

/// Next focus target from `pos`, skipping hidden controls. Wraps around.
pub fn step_focus(rects: &[OverlayRect], pos: usize, key: OverlayKey) -> Option<usize> {
	let n = rects.len();
	let forward = match key {
		OverlayKey::Next => true,
		OverlayKey::Previous => false,
		_ => return None,
	};
	(1..n)
		.map(|k| if forward { (pos + k) % n } else { (pos + n - k) % n })
		.find(|&i| !rects[i].hidden)
}

fn focus_sibling(ev: &KeyboardEvent, target: usize) {
	let Some(parent) = ev
		.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.and_then(|el| el.parent_element())
	else {
		return;
	};
	if let Some(el) = parent
		.children()
		.item(target as u32)
		.and_then(|el| el.dyn_into::<HtmlElement>().ok())
	{
		let _ = el.focus();
	}
}

/// The overlay layer. Input is queued into `inbox` and reduced by the frame loop.
#[component]
pub fn AccessibleOverlay(
	controls: RwSignal<Vec<OverlayControl>>,
	rects: RwSignal<Vec<OverlayRect>>,
	inbox: RwSignal<Vec<InteractionEvent>>,
) -> impl IntoView {
	let push = move |event: InteractionEvent| inbox.update(|q| q.push(event));

	view! {
		// Pointer input reaches the canvas underneath; the controls serve focus and keyboard.
		<div
			class="career-graph-overlay"
			role="group"
			aria-label="Career graph nodes"
			style="position: absolute; inset: 0; pointer-events: none;"
		>
			{move || {
				controls
					.get()
					.into_iter()
					.enumerate()
					.map(|(pos, control)| {
						let rect = move || rects.with(|r| r.get(pos).copied().unwrap_or_default());
						let (focus_id, blur_id, click_id) =
							(control.id.clone(), control.id.clone(), control.id.clone());
						view! {
							<button
								type="button"
								class="career-graph-overlay__control"
								aria-label=control.label
								aria-hidden=move || rect().hidden.to_string()
								tabindex=move || if rect().hidden { "-1" } else { "0" }
								style=move || rect().style()
								on:focus=move |_| push(InteractionEvent::Focus(focus_id.clone()))
								on:blur=move |_| push(InteractionEvent::Blur(blur_id.clone()))
								on:click=move |ev: MouseEvent| {
									// keyboard-synthesised clicks report no pointer presses
									let source = if ev.detail() == 0 {
										ActivationSource::Keyboard
									} else {
										ActivationSource::Pointer
									};
									push(InteractionEvent::Activate {
										id: click_id.clone(),
										source,
									});
								}
								on:keydown=move |ev: KeyboardEvent| {
									match OverlayKey::from_key(&ev.key()) {
										OverlayKey::ClearPin => push(InteractionEvent::ClearPin),
										key @ (OverlayKey::Next | OverlayKey::Previous) => {
											ev.prevent_default();
											let target = rects.with(|r| step_focus(r, pos, key));
											if let Some(target) = target {
												focus_sibling(&ev, target);
											}
										}
										OverlayKey::Other => {}
									}
								}
							/>
						}
					})
					.collect_view()
			}}
		</div>
	}
}
