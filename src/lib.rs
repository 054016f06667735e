//! Leptos client-side app wiring and routes for the family tree viewer.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};
use wasm_bindgen::JsCast;

// Modules
mod components;
mod pages;

pub use components::family_tree;

// Top-Level pages
use crate::components::family_tree::{FamilyTreeCanvas, PersonId, TreeConfig};
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Mounts a standalone viewer for `start_id` into the element matching `selector`.
///
/// Returns `false` when no such element exists.
pub fn mount_viewer(selector: &str, start_id: PersonId, config: TreeConfig) -> bool {
	let Some(mount) = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.query_selector(selector).ok().flatten())
		.and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
	else {
		log::error!("no element matches {}", selector);
		return false;
	};
	leptos::mount::mount_to(mount, move || view! { <FamilyTreeCanvas start_id=start_id config=config /> }).forget();
	true
}

/// An app router which renders the tree page and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Family Tree" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
