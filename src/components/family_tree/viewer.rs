use std::cell::RefCell;

use log::{info, warn};

use super::error::TreeError;
use super::expansion::{self, ExpandOutcome, ExpansionCoordinator, ExpansionState};
use super::graph::PersonGraph;
use super::layout::{Direction, NodeSize};
use super::reconcile::TreeView;
use super::source::{PERSON_FIELDS, PersonSource};
use super::surface::RenderSurface;
use super::types::PersonId;

/// Everything the viewer mutates. Borrowed only between suspension points.
pub(crate) struct Session<R> {
	pub(crate) graph: PersonGraph,
	pub(crate) root: Option<PersonId>,
	pub(crate) trees: [TreeView; 2],
	pub(crate) expansion: ExpansionCoordinator,
	pub(crate) surface: R,
	pub(crate) size: NodeSize,
}

impl<R: RenderSurface> Session<R> {
	/// Lays out and reconciles both directions from the root.
	pub(crate) fn redraw(&mut self) -> Result<(), TreeError> {
		let loading = self.expansion.loading();
		for tree in &mut self.trees {
			tree.draw(&self.graph, self.root, self.size, &loading, &mut self.surface)?;
		}
		Ok(())
	}
}

/// Ancestor and descendant trees of one focal person, sharing one person graph.
pub struct TreeViewer<S, R> {
	source: S,
	session: RefCell<Session<R>>,
}

impl<S: PersonSource, R: RenderSurface> TreeViewer<S, R> {
	/// Empty viewer. Nothing is drawn until `load` succeeds.
	pub fn new(source: S, surface: R, size: NodeSize) -> Self {
		Self {
			source,
			session: RefCell::new(Session {
				graph: PersonGraph::new(),
				root: None,
				trees: [TreeView::ancestors(), TreeView::descendants()],
				expansion: ExpansionCoordinator::default(),
				surface,
				size,
			}),
		}
	}

	/// Fetches `id` and makes it the root of both trees. On failure nothing changes.
	pub async fn load(&self, id: PersonId) -> Result<(), TreeError> {
		info!("loading {}", id);
		let record = self
			.source
			.fetch_person(id, PERSON_FIELDS)
			.await
			.inspect_err(|err| warn!("loading {} failed: {}", id, err))?;

		let mut session = self.session.borrow_mut();
		let root = session.graph.insert_root(&record);
		session.root = Some(root);
		session.redraw()
	}

	/// Expands the branch of `id` by one generation.
	pub async fn load_more(&self, id: PersonId) -> Result<ExpandOutcome, TreeError> {
		expansion::expand(&self.session, &self.source, id).await
	}

	/// Lays out and reconciles both trees again.
	pub fn redraw(&self) -> Result<(), TreeError> {
		self.session.borrow_mut().redraw()
	}

	/// Focal person, once loaded.
	pub fn root(&self) -> Option<PersonId> {
		self.session.borrow().root
	}

	/// Expansion state of `id`.
	pub fn expansion_state(&self, id: PersonId) -> ExpansionState {
		self.session.borrow().expansion.state(id)
	}

	/// Persons currently drawn in the tree of `direction`.
	pub fn rendered_nodes(&self, direction: Direction) -> Vec<PersonId> {
		let session = self.session.borrow();
		session
			.trees
			.iter()
			.find(|t| t.direction() == direction)
			.map(|t| t.rendered_nodes().to_vec())
			.unwrap_or_default()
	}

	/// Runs `f` against the person graph.
	pub fn with_graph<T>(&self, f: impl FnOnce(&PersonGraph) -> T) -> T {
		f(&self.session.borrow().graph)
	}

	/// Runs `f` against the rendering surface.
	pub fn with_surface<T>(&self, f: impl FnOnce(&R) -> T) -> T {
		f(&self.session.borrow().surface)
	}

	/// Runs `f` against the rendering surface, mutably. Must not be called from inside a surface callback.
	pub fn with_surface_mut<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
		f(&mut self.session.borrow_mut().surface)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::collections::{HashMap, VecDeque};
	use std::future::Future;
	use std::task::{Context, Poll};

	use futures::channel::oneshot;
	use futures::executor::block_on;
	use futures::task::noop_waker_ref;

	use super::*;
	use crate::components::family_tree::error::FetchError;
	use crate::components::family_tree::graph::tests::{rec, with_parents};
	use crate::components::family_tree::person::{ParentLink, PersonRecord};
	use crate::components::family_tree::surface::recording::{RecordingSurface, SurfaceEvent};

	type Reply = Result<PersonRecord, FetchError>;

	/// Answers from canned replies, or parks the request until `respond` is called.
	#[derive(Default)]
	struct FakeSource {
		canned: RefCell<HashMap<PersonId, VecDeque<Reply>>>,
		pending: RefCell<Vec<(PersonId, oneshot::Sender<Reply>)>>,
		calls: Cell<usize>,
	}

	impl FakeSource {
		fn with(self, id: i64, reply: Reply) -> Self {
			self.canned.borrow_mut().entry(PersonId(id)).or_default().push_back(reply);
			self
		}

		fn respond(&self, id: i64, reply: Reply) {
			let mut pending = self.pending.borrow_mut();
			let at = pending.iter().position(|(p, _)| *p == PersonId(id)).unwrap();
			let (_, tx) = pending.remove(at);
			let _ = tx.send(reply);
		}
	}

	impl PersonSource for FakeSource {
		fn fetch_person(&self, id: PersonId, _fields: &[&str]) -> impl Future<Output = Reply> {
			self.calls.set(self.calls.get() + 1);
			let (tx, rx) = oneshot::channel();
			match self.canned.borrow_mut().get_mut(&id).and_then(VecDeque::pop_front) {
				Some(reply) => {
					let _ = tx.send(reply);
				}
				None => self.pending.borrow_mut().push((id, tx)),
			}
			async move {
				rx.await
					.unwrap_or_else(|_| Err(FetchError::Request("dropped".into())))
			}
		}
	}

	const SIZE: NodeSize = NodeSize {
		sibling: 100.0,
		depth: 300.0,
	};

	fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
		let mut cx = Context::from_waker(noop_waker_ref());
		std::pin::Pin::new(fut).poll(&mut cx)
	}

	fn viewer(source: FakeSource) -> TreeViewer<FakeSource, RecordingSurface> {
		TreeViewer::new(source, RecordingSurface::default(), SIZE)
	}

	/// Root 7 with one child 2 whose father id points back at 7, not yet attached.
	fn family_root() -> PersonRecord {
		let mut root = rec(7);
		root.children = vec![with_parents(rec(2), Some(7), None)];
		root
	}

	#[test]
	fn root_with_resolved_parents_feeds_both_trees() {
		let mut root = with_parents(rec(1), Some(5), Some(6));
		root.parents = vec![rec(5), rec(6)];
		let v = viewer(FakeSource::default().with(1, Ok(root)));

		block_on(v.load(PersonId(1))).unwrap();
		assert_eq!(v.root(), Some(PersonId(1)));
		assert_eq!(
			v.rendered_nodes(Direction::Ancestors),
			vec![PersonId(1), PersonId(5), PersonId(6)]
		);
		assert_eq!(v.rendered_nodes(Direction::Descendants), vec![PersonId(1)]);
		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(!events.contains(&SurfaceEvent::DrawAffordance(Direction::Ancestors, PersonId(1))));
	}

	#[test]
	fn failed_initial_load_leaves_viewer_empty_and_retryable() {
		let source = FakeSource::default()
			.with(1, Err(FetchError::Http(500)))
			.with(1, Ok(rec(1)));
		let v = viewer(source);

		assert!(matches!(block_on(v.load(PersonId(1))), Err(TreeError::Fetch(_))));
		assert_eq!(v.root(), None);
		assert!(v.with_surface(|s| s.events.is_empty()));

		block_on(v.load(PersonId(1))).unwrap();
		assert_eq!(v.root(), Some(PersonId(1)));
	}

	#[test]
	fn expansion_merges_children_in_order() {
		let mut fetched = with_parents(rec(2), Some(7), None);
		fetched.parents = vec![rec(7)];
		fetched.children = vec![rec(10), rec(11)];
		let source = FakeSource::default().with(7, Ok(family_root())).with(2, Ok(fetched));
		let v = viewer(source);
		block_on(v.load(PersonId(7))).unwrap();
		v.with_surface_mut(RecordingSurface::take);

		assert_eq!(block_on(v.load_more(PersonId(2))).unwrap(), ExpandOutcome::Merged);
		assert_eq!(v.expansion_state(PersonId(2)), ExpansionState::Merged);
		assert_eq!(
			v.rendered_nodes(Direction::Descendants),
			vec![PersonId(7), PersonId(2), PersonId(10), PersonId(11)]
		);
		v.with_graph(|g| {
			let x = g.get(PersonId(2)).unwrap();
			assert_eq!(x.father(), ParentLink::Resolved(PersonId(7)));
			assert_eq!(x.children().len(), 2);
		});

		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(events.contains(&SurfaceEvent::DrawBusy(Direction::Descendants, PersonId(2))));
		assert!(events.contains(&SurfaceEvent::RemoveBusy(Direction::Descendants, PersonId(2))));
		assert!(events.contains(&SurfaceEvent::Links {
			direction: Direction::Descendants,
			enter: vec![PersonId(10), PersonId(11)],
			update: vec![PersonId(2)],
			exit: vec![],
		}));
	}

	#[test]
	fn second_expand_while_loading_issues_no_fetch() {
		let v = viewer(FakeSource::default().with(7, Ok(family_root())));
		block_on(v.load(PersonId(7))).unwrap();
		assert_eq!(v.source.calls.get(), 1);

		let mut first = Box::pin(v.load_more(PersonId(2)));
		assert!(poll_once(&mut first).is_pending());
		assert_eq!(v.expansion_state(PersonId(2)), ExpansionState::Loading);
		assert_eq!(v.source.calls.get(), 2);

		v.with_surface_mut(RecordingSurface::take);
		assert_eq!(
			block_on(v.load_more(PersonId(2))).unwrap(),
			ExpandOutcome::AlreadyLoading
		);
		assert_eq!(v.source.calls.get(), 2);
		assert!(v.with_surface(|s| s.events.is_empty()));

		v.source.respond(2, Ok(with_parents(rec(2), Some(7), None)));
		assert!(matches!(poll_once(&mut first), Poll::Ready(Ok(ExpandOutcome::Merged))));
		assert_eq!(v.expansion_state(PersonId(2)), ExpansionState::Merged);
	}

	#[test]
	fn independent_nodes_load_concurrently() {
		let mut root = rec(7);
		root.children = vec![
			with_parents(rec(2), Some(7), None),
			with_parents(rec(3), Some(7), None),
		];
		let v = viewer(FakeSource::default().with(7, Ok(root)));
		block_on(v.load(PersonId(7))).unwrap();

		let mut a = Box::pin(v.load_more(PersonId(2)));
		let mut b = Box::pin(v.load_more(PersonId(3)));
		assert!(poll_once(&mut a).is_pending());
		assert!(poll_once(&mut b).is_pending());

		let mut three = rec(3);
		three.children = vec![rec(30)];
		v.source.respond(3, Ok(three));
		assert!(poll_once(&mut b).is_ready());
		assert!(v.with_graph(|g| g.contains(PersonId(30))));
		assert_eq!(v.expansion_state(PersonId(2)), ExpansionState::Loading);

		v.source.respond(2, Err(FetchError::Http(502)));
		assert!(matches!(poll_once(&mut a), Poll::Ready(Err(TreeError::Fetch(_)))));
	}

	#[test]
	fn failed_expansion_restores_affordance_without_mutation() {
		let v = viewer(
			FakeSource::default()
				.with(7, Ok(family_root()))
				.with(2, Err(FetchError::Request("offline".into()))),
		);
		block_on(v.load(PersonId(7))).unwrap();
		let before = v.with_graph(|g| g.get(PersonId(2)).cloned());
		v.with_surface_mut(RecordingSurface::take);

		let err = block_on(v.load_more(PersonId(2))).unwrap_err();
		assert!(matches!(err, TreeError::Fetch(FetchError::Request(_))));
		assert_eq!(v.expansion_state(PersonId(2)), ExpansionState::Failed);
		assert_eq!(v.with_graph(|g| g.get(PersonId(2)).cloned()), before);

		let events = v.with_surface_mut(RecordingSurface::take);
		let last_affordance = events
			.iter()
			.rev()
			.find(|e| matches!(e, SurfaceEvent::DrawAffordance(_, id) | SurfaceEvent::RemoveAffordance(_, id) if *id == PersonId(2)));
		assert_eq!(
			last_affordance,
			Some(&SurfaceEvent::DrawAffordance(Direction::Descendants, PersonId(2)))
		);
		assert!(events.contains(&SurfaceEvent::RemoveBusy(Direction::Descendants, PersonId(2))));
	}

	#[test]
	fn unresolvable_parent_stops_offering_expansion() {
		// mother 6 is named but never delivered in the parent map
		let reply = || {
			let mut r = with_parents(rec(1), Some(5), Some(6));
			r.parents = vec![rec(5)];
			r
		};
		let source = FakeSource::default()
			.with(1, Ok(with_parents(rec(1), Some(5), Some(6))))
			.with(1, Ok(reply()));
		let v = viewer(source);
		block_on(v.load(PersonId(1))).unwrap();
		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(events.contains(&SurfaceEvent::DrawAffordance(Direction::Ancestors, PersonId(1))));

		assert_eq!(block_on(v.load_more(PersonId(1))).unwrap(), ExpandOutcome::Merged);
		v.with_graph(|g| {
			let p = g.get(PersonId(1)).unwrap();
			assert_eq!(p.father(), ParentLink::Resolved(PersonId(5)));
			assert!(p.mother().is_unresolved());
		});
		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(events.contains(&SurfaceEvent::RemoveAffordance(Direction::Ancestors, PersonId(1))));
		assert!(!events.iter().any(|e| matches!(e, SurfaceEvent::DrawAffordance(_, id) if *id == PersonId(1))));

		v.redraw().unwrap();
		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(!events.iter().any(|e| matches!(e, SurfaceEvent::DrawAffordance(_, id) if *id == PersonId(1))));
	}

	#[test]
	fn private_parent_is_not_offered_for_expansion() {
		let mut root = with_parents(rec(1), Some(5), Some(-1));
		root.parents = vec![rec(5)];
		let v = viewer(FakeSource::default().with(1, Ok(root)));
		block_on(v.load(PersonId(1))).unwrap();

		let events = v.with_surface_mut(RecordingSurface::take);
		assert!(!events.iter().any(|e| matches!(e, SurfaceEvent::DrawAffordance(_, id) if *id == PersonId(1))));
		assert_eq!(
			v.rendered_nodes(Direction::Ancestors),
			vec![PersonId(1), PersonId(5)]
		);
	}

	#[test]
	fn expanding_unknown_person_is_an_error() {
		let v = viewer(FakeSource::default());
		assert!(matches!(
			block_on(v.load_more(PersonId(99))),
			Err(TreeError::UnknownPerson(_))
		));
		assert_eq!(v.source.calls.get(), 0);
	}
}
