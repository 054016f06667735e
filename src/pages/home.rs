use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::components::family_tree::{FamilyTreeCanvas, PersonId, TreeConfig};

const DEFAULT_START_ID: PersonId = PersonId(1);

/// `?id=` picks the focal person; anything unparseable falls back to the default.
fn start_id(raw: Option<String>) -> PersonId {
	raw.and_then(|id| id.trim().parse::<i64>().ok())
		.filter(|id| *id > 0)
		.map(PersonId)
		.unwrap_or(DEFAULT_START_ID)
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let start = start_id(query.get_untracked().get("id"));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-tree">
				<FamilyTreeCanvas start_id=start config=TreeConfig::default() fullscreen=true />
				<div class="tree-overlay">
					<h1>"Family Tree"</h1>
					<p class="subtitle">"Click + to load more relatives. Click a person for details. Drag to pan, scroll to zoom."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
