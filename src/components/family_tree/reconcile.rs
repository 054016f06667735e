use std::collections::HashSet;
use std::hash::Hash;

use log::debug;

use super::error::TreeError;
use super::graph::PersonGraph;
use super::layout::{Direction, LayoutNode, NodeSize, layout_direction};
use super::person::Person;
use super::surface::RenderSurface;
use super::types::PersonId;

/// Result of matching a new element list against what is currently rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyedDiff<K, T> {
	/// Keys not rendered before.
	pub enter: Vec<T>,
	/// Keys already rendered. Their artifacts are kept and refreshed.
	pub update: Vec<T>,
	/// Rendered keys that are gone.
	pub exit: Vec<K>,
}

impl<K, T> KeyedDiff<K, T> {
	/// Nothing was created or destroyed.
	pub fn is_stable(&self) -> bool {
		self.enter.is_empty() && self.exit.is_empty()
	}
}

/// Keys of the currently rendered elements, in render order.
#[derive(Clone, Debug)]
pub struct KeyedSet<K> {
	keys: Vec<K>,
}

impl<K> Default for KeyedSet<K> {
	fn default() -> Self {
		Self { keys: Vec::new() }
	}
}

impl<K: Copy + Eq + Hash> KeyedSet<K> {
	/// Rendered keys in render order.
	pub fn keys(&self) -> &[K] {
		&self.keys
	}

	/// Whether `key` is rendered.
	pub fn contains(&self, key: K) -> bool {
		self.keys.contains(&key)
	}

	/// Number of rendered keys.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Whether nothing is rendered.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Classifies `next` against the rendered keys and remembers `next` as rendered.
	///
	/// Duplicate keys in `next` coalesce into the first occurrence.
	pub fn reconcile<T, F>(&mut self, next: Vec<T>, key: F) -> KeyedDiff<K, T>
	where
		F: Fn(&T) -> K,
	{
		let previous: HashSet<K> = self.keys.iter().copied().collect();
		let mut seen = HashSet::with_capacity(next.len());
		let mut keys = Vec::with_capacity(next.len());
		let mut enter = Vec::new();
		let mut update = Vec::new();

		for item in next {
			let k = key(&item);
			if !seen.insert(k) {
				continue;
			}
			keys.push(k);
			if previous.contains(&k) {
				update.push(item);
			} else {
				enter.push(item);
			}
		}

		let exit = self.keys.iter().copied().filter(|k| !seen.contains(k)).collect();
		self.keys = keys;
		KeyedDiff { enter, update, exit }
	}
}

/// A loaded leaf whose record says more ancestors exist than are attached.
///
/// A person whose expansion was already merged stays a leaf: the parents it
/// could not resolve are missing from the service's answer.
pub fn is_expandable(person: &Person) -> bool {
	!person.is_expanded()
		&& person.children().is_empty()
		&& (person.father().is_unresolved() || person.mother().is_unresolved())
}

/// One direction of the viewer: layout plus keyed reconciliation against what it drew last.
#[derive(Clone, Debug)]
pub struct TreeView {
	direction: Direction,
	nodes: KeyedSet<PersonId>,
	links: KeyedSet<PersonId>,
	affordances: KeyedSet<PersonId>,
	busy: KeyedSet<PersonId>,
}

impl TreeView {
	/// Nothing rendered yet.
	pub fn new(direction: Direction) -> Self {
		Self {
			direction,
			nodes: KeyedSet::default(),
			links: KeyedSet::default(),
			affordances: KeyedSet::default(),
			busy: KeyedSet::default(),
		}
	}

	/// Tree of the root's parents.
	pub fn ancestors() -> Self {
		Self::new(Direction::Ancestors)
	}

	/// Tree of the root's children.
	pub fn descendants() -> Self {
		Self::new(Direction::Descendants)
	}

	/// Direction this tree walks.
	pub fn direction(&self) -> Direction {
		self.direction
	}

	/// Persons drawn by the last redraw, in layout order.
	pub fn rendered_nodes(&self) -> &[PersonId] {
		self.nodes.keys()
	}

	/// Re-derives the layout from `root` and pushes the differences to `surface`.
	///
	/// Nodes currently `loading` get a busy indicator instead of an expand affordance.
	pub fn draw<R: RenderSurface>(
		&mut self,
		graph: &PersonGraph,
		root: Option<PersonId>,
		size: NodeSize,
		loading: &HashSet<PersonId>,
		surface: &mut R,
	) -> Result<(), TreeError> {
		let tree = layout_direction(graph, root, self.direction, size)?;

		let expandable: Vec<LayoutNode> = tree
			.nodes
			.iter()
			.filter(|n| !loading.contains(&n.person))
			.filter(|n| graph.get(n.person).is_some_and(is_expandable))
			.cloned()
			.collect();
		let busy: Vec<LayoutNode> = tree
			.nodes
			.iter()
			.filter(|n| loading.contains(&n.person))
			.cloned()
			.collect();

		let links = self.links.reconcile(tree.links, |l| l.key());
		surface.render_links(self.direction, &links);

		let nodes = self.nodes.reconcile(tree.nodes, |n| n.person);
		surface.render_nodes(self.direction, &nodes, graph);

		let affordances = self.affordances.reconcile(expandable, |n| n.person);
		for node in affordances.enter.iter().chain(&affordances.update) {
			surface.draw_expand_affordance(self.direction, node);
		}
		for &id in &affordances.exit {
			surface.remove_expand_affordance(self.direction, id);
		}

		let busy = self.busy.reconcile(busy, |n| n.person);
		for node in busy.enter.iter().chain(&busy.update) {
			surface.draw_busy_indicator(self.direction, node);
		}
		for &id in &busy.exit {
			surface.remove_busy_indicator(self.direction, id);
		}

		debug!(
			"{} tree: {} entered, {} updated, {} exited",
			self.direction.class(),
			nodes.enter.len(),
			nodes.update.len(),
			nodes.exit.len()
		);
		Ok(())
	}
}
