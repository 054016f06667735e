//! Tidy tree layout for one direction of the family tree.
//!
//! Positions follow the linear-time Reingold-Tilford variant by Buchheim,
//! Jünger and Leipert with fixed node size and a uniform separation of one
//! node between any two neighbours, siblings and cousins alike.

use std::collections::HashSet;

use log::warn;

use super::error::TreeError;
use super::graph::PersonGraph;
use super::person::Person;
use super::types::{PersonId, Point};

/// Separation between neighbours, in node units.
const SEPARATION: f64 = 1.0;

/// Which relatives a tree walks from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
	/// Parents, drawn to the right of the root.
	Ancestors,
	/// Children, drawn to the left of the root.
	Descendants,
}

impl Direction {
	/// Sign of the depth axis on screen. Ancestors grow to the right.
	pub fn sign(self) -> f64 {
		match self {
			Direction::Ancestors => 1.0,
			Direction::Descendants => -1.0,
		}
	}

	/// Short name used in logs.
	pub fn class(self) -> &'static str {
		match self {
			Direction::Ancestors => "ancestor",
			Direction::Descendants => "descendant",
		}
	}

	/// Ancestors: resolved father then mother. Descendants: children in insertion order.
	pub fn children_of<'g>(self, graph: &'g PersonGraph, person: &Person) -> Vec<&'g Person> {
		match self {
			Direction::Ancestors => [person.father(), person.mother()]
				.into_iter()
				.filter_map(|link| link.resolved())
				.filter_map(|id| graph.get(id))
				.collect(),
			Direction::Descendants => person.children().iter().filter_map(|id| graph.get(id)).collect(),
		}
	}
}

/// Fixed footprint of a node: along the sibling axis and along the depth axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSize {
	/// Spacing between neighbours.
	pub sibling: f64,
	/// Spacing between generations.
	pub depth: f64,
}

/// A person placed by the layout. Recomputed on every redraw.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	/// Person drawn at this node.
	pub person: PersonId,
	/// Node this one hangs from, `None` for the root.
	pub parent: Option<PersonId>,
	/// Generations away from the root.
	pub depth: usize,
	/// Sibling-axis coordinate.
	pub x: f64,
	/// Depth-axis coordinate, always non-negative.
	pub y: f64,
}

impl LayoutNode {
	/// Canvas position, with the depth axis horizontal and flipped by `sign`.
	pub fn position(&self, sign: f64) -> Point {
		Point::new(sign * self.y, self.x)
	}
}

/// Edge from a node to one of its tree children.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLink {
	/// Node nearer the root.
	pub source: LayoutNode,
	/// Node further from the root.
	pub target: LayoutNode,
}

impl LayoutLink {
	/// A person has at most one inbound edge per direction.
	pub fn key(&self) -> PersonId {
		self.target.person
	}
}

/// Nodes in pre-order, links in the same order as their targets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
	/// Every reachable node.
	pub nodes: Vec<LayoutNode>,
	/// One link per non-root node.
	pub links: Vec<LayoutLink>,
}

/// Lays out the tree of `direction` rooted at `root`.
pub fn layout_direction(
	graph: &PersonGraph,
	root: Option<PersonId>,
	direction: Direction,
	size: NodeSize,
) -> Result<TreeLayout, TreeError> {
	let root = root.and_then(|id| graph.get(id));
	layout(root, size, |person| direction.children_of(graph, person))
}

/// Pure layout of the tree reachable from `root` through `children_of`.
pub fn layout<'g, F>(root: Option<&'g Person>, size: NodeSize, children_of: F) -> Result<TreeLayout, TreeError>
where
	F: Fn(&'g Person) -> Vec<&'g Person>,
{
	let root = root.ok_or(TreeError::MissingRoot)?;
	let mut tidy = Tidy::default();
	tidy.slots.push(Slot::new(None, 0, 0, 0));
	tidy.slots[0].children.push(ROOT);
	tidy.slots.push(Slot::new(Some(root), 0, 0, 0));
	let mut path = vec![root.id()];
	tidy.grow(ROOT, &children_of, &mut path);

	tidy.first_walk(ROOT);
	tidy.slots[0].modifier = -tidy.slots[ROOT].prelim;
	tidy.second_walk(ROOT);

	let nodes: Vec<LayoutNode> = tidy.slots[ROOT..]
		.iter()
		.map(|slot| LayoutNode {
			person: slot.person.map(Person::id).unwrap_or(PersonId(0)),
			parent: (slot.parent >= ROOT)
				.then(|| tidy.slots[slot.parent].person.map(Person::id))
				.flatten(),
			depth: slot.depth,
			x: slot.x * size.sibling,
			y: slot.depth as f64 * size.depth,
		})
		.collect();

	let links = tidy.slots[ROOT..]
		.iter()
		.enumerate()
		.filter(|(_, slot)| slot.parent >= ROOT)
		.map(|(i, slot)| LayoutLink {
			source: nodes[slot.parent - ROOT].clone(),
			target: nodes[i].clone(),
		})
		.collect();

	Ok(TreeLayout { nodes, links })
}

/// Slot 0 is a virtual parent of the root.
const ROOT: usize = 1;

struct Slot<'g> {
	person: Option<&'g Person>,
	parent: usize,
	children: Vec<usize>,
	depth: usize,
	/// Position among siblings.
	index: usize,
	ancestor: usize,
	/// Default ancestor used while apportioning this slot's children.
	anchor: Option<usize>,
	thread: Option<usize>,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
	x: f64,
}

impl<'g> Slot<'g> {
	fn new(person: Option<&'g Person>, depth: usize, index: usize, parent: usize) -> Self {
		Self {
			person,
			parent,
			children: Vec::new(),
			depth,
			index,
			ancestor: 0,
			anchor: None,
			thread: None,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
			x: 0.0,
		}
	}
}

#[derive(Default)]
struct Tidy<'g> {
	slots: Vec<Slot<'g>>,
}

impl<'g> Tidy<'g> {
	/// Depth-first expansion, so slots end up in pre-order.
	fn grow<F>(&mut self, v: usize, children_of: &F, path: &mut Vec<PersonId>)
	where
		F: Fn(&'g Person) -> Vec<&'g Person>,
	{
		self.slots[v].ancestor = v;
		let Some(person) = self.slots[v].person else {
			return;
		};
		let depth = self.slots[v].depth + 1;
		let mut seen = HashSet::new();
		for child in children_of(person) {
			if path.contains(&child.id()) {
				warn!("{} is its own ancestor through {}; not following", child.id(), person.id());
				continue;
			}
			if !seen.insert(child.id()) {
				continue;
			}
			let idx = self.slots.len();
			let index = self.slots[v].children.len();
			self.slots.push(Slot::new(Some(child), depth, index, v));
			self.slots[v].children.push(idx);
			path.push(child.id());
			self.grow(idx, children_of, path);
			path.pop();
		}
	}

	fn next_left(&self, v: usize) -> Option<usize> {
		self.slots[v].children.first().copied().or(self.slots[v].thread)
	}

	fn next_right(&self, v: usize) -> Option<usize> {
		self.slots[v].children.last().copied().or(self.slots[v].thread)
	}

	fn first_walk(&mut self, v: usize) {
		let children = self.slots[v].children.clone();
		for &child in &children {
			self.first_walk(child);
		}

		let parent = self.slots[v].parent;
		let index = self.slots[v].index;
		let left_sibling = (index > 0).then(|| self.slots[parent].children[index - 1]);

		if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
			self.execute_shifts(v);
			let midpoint = (self.slots[first].prelim + self.slots[last].prelim) / 2.0;
			match left_sibling {
				Some(w) => {
					self.slots[v].prelim = self.slots[w].prelim + SEPARATION;
					self.slots[v].modifier = self.slots[v].prelim - midpoint;
				}
				None => self.slots[v].prelim = midpoint,
			}
		} else if let Some(w) = left_sibling {
			self.slots[v].prelim = self.slots[w].prelim + SEPARATION;
		}

		let default_ancestor = self.slots[parent]
			.anchor
			.unwrap_or(self.slots[parent].children[0]);
		let anchor = self.apportion(v, left_sibling, default_ancestor);
		self.slots[parent].anchor = Some(anchor);
	}

	fn second_walk(&mut self, v: usize) {
		let parent_modifier = self.slots[self.slots[v].parent].modifier;
		self.slots[v].x = self.slots[v].prelim + parent_modifier;
		self.slots[v].modifier += parent_modifier;
		let children = self.slots[v].children.clone();
		for child in children {
			self.second_walk(child);
		}
	}

	/// Pushes the subtree of `v` clear of everything left of it, threading contours as it goes.
	fn apportion(&mut self, v: usize, left_sibling: Option<usize>, mut ancestor: usize) -> usize {
		let Some(w) = left_sibling else {
			return ancestor;
		};
		let mut vop = v;
		let mut vom = self.slots[self.slots[v].parent].children[0];
		let mut sip = self.slots[v].modifier;
		let mut sop = self.slots[v].modifier;
		let mut sim = self.slots[w].modifier;
		let mut som = self.slots[vom].modifier;

		let mut inner_left = self.next_right(w);
		let mut inner_right = self.next_left(v);
		while let (Some(vim), Some(vip)) = (inner_left, inner_right) {
			if let Some(next) = self.next_left(vom) {
				vom = next;
			}
			if let Some(next) = self.next_right(vop) {
				vop = next;
			}
			self.slots[vop].ancestor = v;
			let shift = self.slots[vim].prelim + sim - self.slots[vip].prelim - sip + SEPARATION;
			if shift > 0.0 {
				let from = self.next_ancestor(vim, v, ancestor);
				self.move_subtree(from, v, shift);
				sip += shift;
				sop += shift;
			}
			sim += self.slots[vim].modifier;
			sip += self.slots[vip].modifier;
			som += self.slots[vom].modifier;
			sop += self.slots[vop].modifier;
			inner_left = self.next_right(vim);
			inner_right = self.next_left(vip);
		}

		if let Some(vim) = inner_left {
			if self.next_right(vop).is_none() {
				self.slots[vop].thread = Some(vim);
				self.slots[vop].modifier += sim - sop;
			}
		}
		if let Some(vip) = inner_right {
			if self.next_left(vom).is_none() {
				self.slots[vom].thread = Some(vip);
				self.slots[vom].modifier += sip - som;
				ancestor = v;
			}
		}
		ancestor
	}

	fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
		let candidate = self.slots[vim].ancestor;
		if self.slots[candidate].parent == self.slots[v].parent {
			candidate
		} else {
			ancestor
		}
	}

	fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
		let subtrees = (self.slots[wp].index - self.slots[wm].index) as f64;
		let change = shift / subtrees;
		self.slots[wp].change -= change;
		self.slots[wp].shift += shift;
		self.slots[wm].change += change;
		self.slots[wp].prelim += shift;
		self.slots[wp].modifier += shift;
	}

	fn execute_shifts(&mut self, v: usize) {
		let mut shift = 0.0;
		let mut change = 0.0;
		let children = self.slots[v].children.clone();
		for &w in children.iter().rev() {
			self.slots[w].prelim += shift;
			self.slots[w].modifier += shift;
			change += self.slots[w].change;
			shift += self.slots[w].shift + change;
		}
	}
}

/// Orthogonal connector between two laid out nodes, in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElbowPath {
	/// Point on the edge of the source box.
	pub start: Point,
	/// Canvas x of the vertical segment.
	pub mid: f64,
	/// Point on the edge of the target box.
	pub end: Point,
}

impl ElbowPath {
	/// Corners of the path, start to end.
	pub fn points(&self) -> [Point; 4] {
		[
			self.start,
			Point::new(self.mid, self.start.y),
			Point::new(self.mid, self.end.y),
			self.end,
		]
	}

	/// The path as SVG `d` data.
	pub fn svg(&self) -> String {
		format!(
			"M{},{}H{}V{}H{}",
			self.start.x, self.start.y, self.mid, self.end.y, self.end.x
		)
	}
}

/// Leaves the right edge of the source box and enters the left edge of the target box.
pub fn elbow(source: Point, target: Point, sign: f64, box_width: f64) -> ElbowPath {
	// `source` and `target` are (sibling, depth) pairs as produced by the layout
	let start_x = sign * (source.y + box_width / 2.0);
	let end_x = sign * (target.y - box_width / 2.0);
	ElbowPath {
		start: Point::new(start_x, source.x),
		mid: start_x + (end_x - start_x) / 2.0,
		end: Point::new(end_x, target.x),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::family_tree::graph::tests::{rec, with_parents};
	use crate::components::family_tree::person::PersonRecord;

	const SIZE: NodeSize = NodeSize {
		sibling: 100.0,
		depth: 300.0,
	};

	fn ids(layout: &TreeLayout) -> Vec<i64> {
		layout.nodes.iter().map(|n| n.person.0).collect()
	}

	fn node(layout: &TreeLayout, id: i64) -> &LayoutNode {
		layout.nodes.iter().find(|n| n.person.0 == id).unwrap()
	}

	fn family(children: Vec<PersonRecord>) -> PersonGraph {
		let mut root = with_parents(rec(1), Some(5), Some(6));
		root.parents = vec![rec(5), rec(6)];
		root.children = children;
		let mut graph = PersonGraph::new();
		graph.insert_root(&root);
		graph
	}

	#[test]
	fn missing_root_is_an_error() {
		let graph = PersonGraph::new();
		let err = layout_direction(&graph, None, Direction::Ancestors, SIZE).unwrap_err();
		assert!(matches!(err, TreeError::MissingRoot));
		let err = layout_direction(&graph, Some(PersonId(3)), Direction::Ancestors, SIZE).unwrap_err();
		assert!(matches!(err, TreeError::MissingRoot));
	}

	#[test]
	fn ancestors_put_father_before_mother() {
		let graph = family(vec![]);
		let tree = layout_direction(&graph, Some(PersonId(1)), Direction::Ancestors, SIZE).unwrap();
		assert_eq!(ids(&tree), vec![1, 5, 6]);
		assert_eq!(node(&tree, 1).x, 0.0);
		assert_eq!(node(&tree, 5).x, -50.0);
		assert_eq!(node(&tree, 6).x, 50.0);
		assert_eq!(node(&tree, 6).y, 300.0);
		assert_eq!(node(&tree, 6).parent, Some(PersonId(1)));
		let targets: Vec<_> = tree.links.iter().map(|l| l.key().0).collect();
		assert_eq!(targets, vec![5, 6]);
		assert!(tree.links.iter().all(|l| l.source.person == PersonId(1)));
	}

	#[test]
	fn descendants_of_childless_root_is_root_alone() {
		let graph = family(vec![]);
		let tree = layout_direction(&graph, Some(PersonId(1)), Direction::Descendants, SIZE).unwrap();
		assert_eq!(ids(&tree), vec![1]);
		assert!(tree.links.is_empty());
	}

	#[test]
	fn descendants_follow_insertion_order() {
		let graph = family(vec![rec(11), rec(10), rec(12)]);
		let tree = layout_direction(&graph, Some(PersonId(1)), Direction::Descendants, SIZE).unwrap();
		assert_eq!(ids(&tree), vec![1, 11, 10, 12]);
		assert!(node(&tree, 11).x < node(&tree, 10).x);
		assert!(node(&tree, 10).x < node(&tree, 12).x);
	}

	#[test]
	fn layout_is_deterministic() {
		let graph = family(vec![rec(10), rec(11)]);
		let a = layout_direction(&graph, Some(PersonId(1)), Direction::Descendants, SIZE).unwrap();
		let b = layout_direction(&graph, Some(PersonId(1)), Direction::Descendants, SIZE).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn deep_uneven_subtrees_do_not_overlap() {
		// 1 -> (2 -> (4, 5, 6), 3 -> (7 -> (8, 9)))
		let mut graph = PersonGraph::new();
		let mut root = rec(1);
		root.children = vec![rec(2), rec(3)];
		graph.insert_root(&root);
		let mut two = rec(2);
		two.children = vec![rec(4), rec(5), rec(6)];
		graph.merge_expansion(PersonId(2), &two);
		let mut three = rec(3);
		three.children = vec![rec(7)];
		graph.merge_expansion(PersonId(3), &three);
		let mut seven = rec(7);
		seven.children = vec![rec(8), rec(9)];
		graph.merge_expansion(PersonId(7), &seven);

		let tree = layout_direction(&graph, Some(PersonId(1)), Direction::Descendants, SIZE).unwrap();
		assert_eq!(tree.nodes.len(), 9);
		for depth in 0..4 {
			let mut xs: Vec<f64> = tree.nodes.iter().filter(|n| n.depth == depth).map(|n| n.x).collect();
			xs.sort_by(f64::total_cmp);
			for pair in xs.windows(2) {
				assert!(pair[1] - pair[0] >= SIZE.sibling - 1e-9, "depth {} overlaps: {:?}", depth, xs);
			}
		}
		// parents are centred over their children
		let centre = (node(&tree, 4).x + node(&tree, 6).x) / 2.0;
		assert!((node(&tree, 2).x - centre).abs() < 1e-9);
		assert_eq!(node(&tree, 1).x, 0.0);
	}

	#[test]
	fn self_ancestry_is_not_followed() {
		let mut graph = PersonGraph::new();
		let mut root = with_parents(rec(1), Some(2), None);
		root.parents = vec![rec(2)];
		graph.insert_root(&root);
		let mut two = with_parents(rec(2), Some(1), None);
		two.parents = vec![rec(1)];
		graph.merge_expansion(PersonId(2), &two);

		let tree = layout_direction(&graph, Some(PersonId(1)), Direction::Ancestors, SIZE).unwrap();
		assert_eq!(ids(&tree), vec![1, 2]);
	}

	#[test]
	fn elbow_path_matches_box_edges() {
		let path = elbow(Point::new(0.0, 0.0), Point::new(-50.0, 300.0), 1.0, 200.0);
		assert_eq!(path.svg(), "M100,0H150V-50H200");
		let flipped = elbow(Point::new(0.0, 0.0), Point::new(50.0, 300.0), -1.0, 200.0);
		assert_eq!(flipped.svg(), "M-100,0H-150V50H-200");
		assert_eq!(flipped.points()[2], Point::new(-150.0, 50.0));
	}
}
