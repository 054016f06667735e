use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use log::{info, warn};

use super::error::{FetchError, TreeError};
use super::graph::PersonGraph;
use super::person::PersonRecord;
use super::source::{PERSON_FIELDS, PersonSource};
use super::surface::RenderSurface;
use super::types::PersonId;
use super::viewer::Session;

/// Per-node expansion state. `Merged` and `Failed` accept a new expand action like `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpansionState {
	/// No expansion requested yet.
	#[default]
	Idle,
	/// A fetch is in flight. Further expand actions are ignored.
	Loading,
	/// The last fetch succeeded and was merged.
	Merged,
	/// The last fetch failed. Nothing was merged.
	Failed,
}

/// What an expand action ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpandOutcome {
	/// The fetch completed and its record was merged.
	Merged,
	/// A fetch for this node was already in flight; nothing was issued.
	AlreadyLoading,
}

/// Tracks in-flight expansions. At most one per node, any number across the tree.
#[derive(Clone, Debug, Default)]
pub struct ExpansionCoordinator {
	states: HashMap<PersonId, ExpansionState>,
}

impl ExpansionCoordinator {
	/// `Idle` for nodes never expanded.
	pub fn state(&self, id: PersonId) -> ExpansionState {
		self.states.get(&id).copied().unwrap_or_default()
	}

	/// Whether a fetch for `id` is in flight.
	pub fn is_loading(&self, id: PersonId) -> bool {
		self.state(id) == ExpansionState::Loading
	}

	/// Every node with a fetch in flight.
	pub fn loading(&self) -> HashSet<PersonId> {
		self.states
			.iter()
			.filter(|(_, state)| **state == ExpansionState::Loading)
			.map(|(id, _)| *id)
			.collect()
	}

	/// `Idle -> Loading`. Returns `false` without changing anything if `id` is already loading.
	pub fn begin(&mut self, id: PersonId) -> bool {
		if self.is_loading(id) {
			return false;
		}
		self.states.insert(id, ExpansionState::Loading);
		true
	}

	/// Applies a completed fetch. Only a successful fetch touches the graph.
	pub fn finish(
		&mut self,
		id: PersonId,
		graph: &mut PersonGraph,
		result: Result<PersonRecord, FetchError>,
	) -> Result<(), TreeError> {
		match result {
			Ok(record) => {
				if !graph.merge_expansion(id, &record) {
					self.states.insert(id, ExpansionState::Failed);
					return Err(TreeError::UnknownPerson(id));
				}
				self.states.insert(id, ExpansionState::Merged);
				info!(
					"expanded {}: {} children",
					id,
					graph.get(id).map_or(0, |p| p.children().len())
				);
				Ok(())
			}
			Err(err) => {
				warn!("expanding {} failed: {}", id, err);
				self.states.insert(id, ExpansionState::Failed);
				Err(err.into())
			}
		}
	}

	/// Drops a `Loading` state whose fetch was never issued.
	pub fn abandon(&mut self, id: PersonId) {
		if self.is_loading(id) {
			self.states.insert(id, ExpansionState::Idle);
		}
	}
}

/// Fetches the full record of `id`, merges it and redraws both trees.
///
/// The session is never borrowed across the fetch, so other expansions and
/// redraws can proceed while this one is suspended.
pub(crate) async fn expand<S, R>(
	session: &RefCell<Session<R>>,
	source: &S,
	id: PersonId,
) -> Result<ExpandOutcome, TreeError>
where
	S: PersonSource,
	R: RenderSurface,
{
	{
		let mut session = session.borrow_mut();
		if !session.graph.contains(id) {
			return Err(TreeError::UnknownPerson(id));
		}
		if !session.expansion.begin(id) {
			info!("{} is already loading", id);
			return Ok(ExpandOutcome::AlreadyLoading);
		}
		if let Err(err) = session.redraw() {
			session.expansion.abandon(id);
			return Err(err);
		}
	}

	info!("expanding {}", id);
	let result = source.fetch_person(id, PERSON_FIELDS).await;

	let mut session = session.borrow_mut();
	let session = &mut *session;
	let merged = session.expansion.finish(id, &mut session.graph, result);
	session.redraw()?;
	merged.map(|()| ExpandOutcome::Merged)
}
