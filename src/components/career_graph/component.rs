use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Window};

use super::config::GraphConfig;
use super::interaction::{ActivationSource, InteractionEvent, Outbound};
use super::overlay::{AccessibleOverlay, OverlayControl, OverlayRect};
use super::render;
use super::sequencer::SequencerPhase;
use super::state::CareerGraphState;
use super::types::GraphData;

fn prefers_reduced_motion(window: &Window) -> bool {
	window
		.match_media("(prefers-reduced-motion: reduce)")
		.ok()
		.flatten()
		.is_some_and(|query| query.matches())
}

fn container_width(canvas: &HtmlCanvasElement) -> f64 {
	canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0)
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn toggle_label(phase: SequencerPhase) -> &'static str {
	match phase {
		SequencerPhase::Idle => "Play",
		SequencerPhase::Playing | SequencerPhase::Resetting => "Pause",
		SequencerPhase::Paused | SequencerPhase::Completed => "Replay",
	}
}

/// Animated career timeline with an accessible overlay.
///
/// Input from the canvas, the overlay and `highlighted_node_id` is queued and reduced once per
/// animation frame, so the three sources never race.
#[component]
pub fn CareerGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(default = 560.0)] container_height: f64,
	/// Host-driven highlight, e.g. from a sibling list.
	#[prop(optional, into)]
	highlighted_node_id: Option<Signal<Option<String>>>,
	/// Overrides the `prefers-reduced-motion` media query.
	#[prop(optional)]
	reduced_motion: Option<bool>,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional, into)] on_entity_selected: Option<Callback<String>>,
	#[prop(optional, into)] on_skill_selected: Option<Callback<String>>,
	#[prop(optional, into)] on_hover_changed: Option<Callback<Option<String>>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<CareerGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let config = config.unwrap_or_default();

	let controls = RwSignal::new(Vec::<OverlayControl>::new());
	let rects = RwSignal::new(Vec::<OverlayRect>::new());
	let inbox = RwSignal::new(Vec::<InteractionEvent>::new());
	let phase = RwSignal::new(SequencerPhase::Idle);
	let announcement = RwSignal::new(String::new());

	// Checked by the frame loop, which tears the instance down once the owner is gone.
	let alive = Arc::new(AtomicBool::new(true));
	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	if let Some(external) = highlighted_node_id {
		Effect::new(move |_| {
			let id = external.get();
			inbox.update_untracked(|q| q.push(InteractionEvent::External(id)));
		});
	}

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let data = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("career graph: no window");
			return;
		};

		let width = container_width(&canvas);
		canvas.set_width(width as u32);
		canvas.set_height(container_height as u32);
		let reduced = reduced_motion.unwrap_or_else(|| prefers_reduced_motion(&window));

		let mut next = CareerGraphState::new(&data, width, container_height, config.clone(), reduced);
		if let Some(id) = highlighted_node_id.and_then(|s| s.get_untracked()) {
			next.dispatch(InteractionEvent::External(Some(id)));
		}
		controls.set(next.controls.clone());
		if let Some(mut previous) = state_init.borrow_mut().replace(next) {
			previous.destroy();
		}

		// New data reuses the running frame loop.
		if animate_init.borrow().is_some() {
			return;
		}
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("career graph: 2d canvas context unavailable");
			return;
		};

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let w = container_width(&canvas_resize);
			canvas_resize.set_width(w as u32);
			if let Some(s) = state_resize.borrow_mut().as_mut() {
				s.resize(w, container_height);
			}
		}));
		if let Some(cb) = resize_cb_init.borrow().as_ref() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, resize_stop, alive) = (
			state_init.clone(),
			animate_init.clone(),
			resize_cb_init.clone(),
			alive.clone(),
		);
		let window_anim = window.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if !alive.load(Ordering::Relaxed) {
				if let Some(s) = state_anim.borrow_mut().as_mut() {
					s.destroy();
				}
				if let Some(cb) = resize_stop.borrow().as_ref() {
					let _ = window_anim
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				return;
			}

			let queued = inbox
				.try_update_untracked(std::mem::take)
				.unwrap_or_default();
			let frame = state_anim.borrow_mut().as_mut().map(|s| {
				if s.sequencer.phase() == SequencerPhase::Idle {
					s.mount(now);
				}
				for event in queued {
					s.dispatch(event);
				}
				let out = s.frame(now);
				render::render(s, &ctx);
				let notes: Vec<String> = out.reveal.iter().filter_map(|e| s.announcement(e)).collect();
				(out, s.overlay_rects(), notes, s.sequencer.phase())
			});

			if let Some((out, next_rects, mut notes, current)) = frame {
				if rects.with_untracked(|r| *r != next_rects) {
					rects.set(next_rects);
				}
				if phase.get_untracked() != current {
					phase.set(current);
				}
				if let Some(note) = notes.pop() {
					announcement.set(note);
				}
				for message in out.outbound {
					debug!("career graph: {message:?}");
					match message {
						Outbound::EntitySelected(id) => {
							if let Some(cb) = on_entity_selected {
								cb.run(id);
							}
						}
						Outbound::SkillSelected(id) => {
							if let Some(cb) = on_skill_selected {
								cb.run(id);
							}
						}
						Outbound::HoverChanged(id) => {
							if let Some(cb) = on_hover_changed {
								cb.run(id);
							}
						}
					}
				}
			}

			if let Some(cb) = animate_inner.borrow().as_ref() {
				let _ = window_anim.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		let Some(hit) = state_mm
			.borrow_mut()
			.as_mut()
			.map(|s| s.pointer_moved(x, y))
		else {
			return;
		};
		let cursor = if hit { "pointer" } else { "default" };
		let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(s) = state_ml.borrow_mut().as_mut() {
			s.pointer_left();
		}
	};

	let state_click = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = canvas_point(&canvas, &ev);
		let event = state_click.borrow().as_ref().map(|s| {
			match s.node_at_position(x, y).and_then(|i| s.graph.id_of(i)) {
				Some(id) => InteractionEvent::Activate {
					id: id.to_string(),
					source: ActivationSource::Pointer,
				},
				// Background click releases a pin.
				None => InteractionEvent::ClearPin,
			}
		});
		if let Some(event) = event {
			inbox.update_untracked(|q| q.push(event));
		}
	};

	let state_toggle = state.clone();
	let on_toggle = move |ev: MouseEvent| {
		if let Some(s) = state_toggle.borrow_mut().as_mut() {
			s.toggle_play_pause(ev.time_stamp());
		}
	};

	view! {
		<div
			class="career-graph"
			style=format!("position: relative; height: {container_height}px;")
		>
			<canvas
				node_ref=canvas_ref
				class="career-graph-canvas"
				aria-hidden="true"
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				on:click=on_click
				style="display: block; width: 100%; height: 100%;"
			/>
			<AccessibleOverlay controls=controls rects=rects inbox=inbox />
			<div class="career-graph-controls" style="position: absolute; right: 12px; bottom: 12px;">
				<button type="button" class="career-graph-controls__toggle" on:click=on_toggle>
					{move || toggle_label(phase.get())}
				</button>
			</div>
			<div
				class="career-graph-live"
				role="status"
				aria-live="polite"
				style="position: absolute; width: 1px; height: 1px; overflow: hidden; clip-path: inset(50%);"
			>
				{move || announcement.get()}
			</div>
		</div>
	}
}
