use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::TreeConfig;
use super::render;
use super::source::WikiTreeClient;
use super::state::{CanvasScene, Hit, InfoCard};
use super::types::PersonId;
use super::viewer::TreeViewer;

type Viewer = TreeViewer<WikiTreeClient, CanvasScene>;

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn expand(viewer: &Rc<Viewer>, id: PersonId) {
	let viewer = viewer.clone();
	spawn_local(async move {
		if let Err(err) = viewer.load_more(id).await {
			error!("could not load more relatives of {}: {}", id, err);
		}
	});
}

fn click(viewer: &Rc<Viewer>, x: f64, y: f64) {
	match viewer.with_surface(|s| s.hit(x, y)) {
		Hit::Expand(id) => expand(viewer, id),
		Hit::Person(id, at) => {
			let card = viewer.with_graph(|g| InfoCard::for_person(g, id, at));
			viewer.with_surface_mut(|s| s.card = card);
		}
		Hit::Background => viewer.with_surface_mut(|s| s.card = None),
	}
}

/// Canvas showing the ancestors and descendants of `start_id`.
///
/// Drag to pan, scroll to zoom, click a person for details and a "+" to load more relatives.
#[component]
pub fn FamilyTreeCanvas(
	/// Person loaded as the root of both trees.
	start_id: PersonId,
	/// Geometry and service settings.
	#[prop(default = TreeConfig::default())]
	config: TreeConfig,
	/// Size the canvas to the window instead of its parent element.
	#[prop(default = false)]
	fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let viewer: Rc<Viewer> = Rc::new(TreeViewer::new(
		WikiTreeClient::new(&config.api_base_url),
		CanvasScene::new(&config),
		config.node_size(),
	));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	let viewer_load = viewer.clone();
	spawn_local(async move {
		if let Err(err) = viewer_load.load(start_id).await {
			error!("could not load person {}: {}", start_id, err);
		}
	});

	let (viewer_init, animate_init, resize_cb_init) = (viewer.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.unwrap_or((800.0, 600.0))
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		viewer_init.with_surface_mut(|s| s.resize(w, h));

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				error!("canvas has no 2d context");
				return;
			}
		};

		if fullscreen {
			let (viewer_resize, canvas_resize) = (viewer_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				viewer_resize.with_surface_mut(|s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (viewer_anim, animate_inner) = (viewer_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			viewer_anim.with_surface_mut(|s| {
				s.tick(0.016);
				render::render(s, &ctx);
			});
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let viewer_md = viewer.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			viewer_md.with_surface_mut(|s| s.start_pan(x, y));
		}
	};

	let viewer_mm = viewer.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			viewer_mm.with_surface_mut(|s| s.pan_to(x, y));
		}
	};

	let viewer_mu = viewer.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let was_click = viewer_mu.with_surface_mut(|s| s.end_pan());
		if !was_click {
			return;
		}
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			click(&viewer_mu, x, y);
		}
	};

	let viewer_ml = viewer.clone();
	let on_mouseleave = move |_: MouseEvent| {
		viewer_ml.with_surface_mut(|s| {
			s.end_pan();
		});
	};

	let viewer_wh = viewer.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = match canvas_ref.get() {
			Some(c) => c.into(),
			None => return,
		};
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		viewer_wh.with_surface_mut(|s| s.zoom(x, y, factor));
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="family-tree-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
	let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
	(w, h)
}
