use std::collections::BTreeMap;

use super::config::TreeConfig;
use super::graph::PersonGraph;
use super::layout::{Direction, ElbowPath, LayoutNode, elbow};
use super::surface::{LinkDiff, NodeDiff, RenderSurface};
use super::types::{PersonId, Point};

pub(crate) const AFFORDANCE_OFFSET: f64 = 20.0;
pub(crate) const AFFORDANCE_RADIUS: f64 = 10.0;
pub(crate) const BUSY_OFFSET: f64 = 12.0;
pub(crate) const BUSY_RADIUS: f64 = 8.0;

type SceneKey = (Direction, PersonId);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SceneNode {
	pub(crate) person: PersonId,
	/// Centre of the person box.
	pub(crate) position: Point,
	pub(crate) name: String,
	pub(crate) lifespan: String,
	pub(crate) stroke: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InfoCard {
	pub(crate) person: PersonId,
	pub(crate) anchor: Point,
	pub(crate) name: String,
	pub(crate) lines: Vec<String>,
	pub(crate) stroke: &'static str,
}

impl InfoCard {
	pub(crate) fn for_person(graph: &PersonGraph, id: PersonId, anchor: Point) -> Option<Self> {
		let person = graph.get(id)?;
		let mut lines: Vec<String> = [person.birth_description(), person.death_description()]
			.into_iter()
			.flatten()
			.collect();
		if let Some(name) = person.profile().name.as_deref() {
			lines.push(format!("Profile: {}", name));
		}
		lines.push(format!("Privacy: {}", person.profile().privacy.label()));
		Some(Self {
			person: id,
			anchor,
			name: person.display_name(),
			lines,
			stroke: person.gender().stroke_color(),
		})
	}
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ViewTransform {
	pub(crate) x: f64,
	pub(crate) y: f64,
	pub(crate) k: f64,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PanState {
	pub(crate) active: bool,
	/// Set once the pointer travelled far enough that the press is not a click.
	pub(crate) moved: bool,
	pub(crate) start_x: f64,
	pub(crate) start_y: f64,
	pub(crate) transform_start_x: f64,
	pub(crate) transform_start_y: f64,
}

/// What a click on the canvas landed on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Hit {
	Expand(PersonId),
	Person(PersonId, Point),
	Background,
}

/// Retained scene of both trees, keyed the same way the engine keys them.
///
/// Painted every animation frame by the canvas component.
pub struct CanvasScene {
	pub(crate) nodes: BTreeMap<SceneKey, SceneNode>,
	pub(crate) links: BTreeMap<SceneKey, ElbowPath>,
	pub(crate) affordances: BTreeMap<SceneKey, Point>,
	pub(crate) busy: BTreeMap<SceneKey, Point>,
	pub(crate) card: Option<InfoCard>,
	pub(crate) transform: ViewTransform,
	pub(crate) pan: PanState,
	pub(crate) width: f64,
	pub(crate) height: f64,
	pub(crate) box_width: f64,
	pub(crate) box_height: f64,
	pub(crate) min_scale: f64,
	pub(crate) max_scale: f64,
	pub(crate) spin_time: f64,
}

impl CanvasScene {
	/// Empty scene translated by the configured origin offset at scale 1.
	pub fn new(config: &TreeConfig) -> Self {
		Self {
			nodes: BTreeMap::new(),
			links: BTreeMap::new(),
			affordances: BTreeMap::new(),
			busy: BTreeMap::new(),
			card: None,
			transform: ViewTransform {
				x: config.origin_offset.0,
				y: config.origin_offset.1,
				k: 1.0,
			},
			pan: PanState::default(),
			width: 0.0,
			height: 0.0,
			box_width: config.box_width,
			box_height: config.box_height,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
			spin_time: 0.0,
		}
	}

	pub(crate) fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Expand buttons sit outside the boxes, so they win over a person hit.
	pub(crate) fn hit(&self, sx: f64, sy: f64) -> Hit {
		let p = self.screen_to_graph(sx, sy);
		for (&(_, id), centre) in &self.affordances {
			let (dx, dy) = (centre.x - p.x, centre.y - p.y);
			if (dx * dx + dy * dy).sqrt() <= AFFORDANCE_RADIUS {
				return Hit::Expand(id);
			}
		}
		let (hw, hh) = (self.box_width / 2.0, self.box_height / 2.0);
		for node in self.nodes.values() {
			if (p.x - node.position.x).abs() <= hw && (p.y - node.position.y).abs() <= hh {
				return Hit::Person(node.person, p);
			}
		}
		Hit::Background
	}

	/// Zooms around the pointer, clamped to the configured scale extent.
	pub(crate) fn zoom(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(self.min_scale, self.max_scale);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub(crate) fn start_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub(crate) fn pan_to(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
		if dx.abs() + dy.abs() > 3.0 {
			self.pan.moved = true;
		}
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
	}

	/// Ends a pan. Returns `true` when the press never moved, i.e. it was a click.
	pub(crate) fn end_pan(&mut self) -> bool {
		let was_click = self.pan.active && !self.pan.moved;
		self.pan.active = false;
		self.pan.moved = false;
		was_click
	}

	pub(crate) fn tick(&mut self, dt: f64) {
		self.spin_time += dt;
	}

	pub(crate) fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn box_edge(&self, direction: Direction, node: &LayoutNode, offset: f64) -> Point {
		Point::new(
			direction.sign() * (node.y + self.box_width / 2.0 + offset),
			node.x,
		)
	}
}

impl RenderSurface for CanvasScene {
	fn render_nodes(&mut self, direction: Direction, diff: &NodeDiff, graph: &PersonGraph) {
		for id in &diff.exit {
			self.nodes.remove(&(direction, *id));
		}
		for node in diff.enter.iter().chain(&diff.update) {
			let Some(person) = graph.get(node.person) else {
				continue;
			};
			self.nodes.insert(
				(direction, node.person),
				SceneNode {
					person: node.person,
					position: node.position(direction.sign()),
					name: person.display_name(),
					lifespan: person.lifespan(),
					stroke: person.gender().stroke_color(),
				},
			);
		}
	}

	fn render_links(&mut self, direction: Direction, diff: &LinkDiff) {
		for id in &diff.exit {
			self.links.remove(&(direction, *id));
		}
		for link in diff.enter.iter().chain(&diff.update) {
			let path = elbow(
				Point::new(link.source.x, link.source.y),
				Point::new(link.target.x, link.target.y),
				direction.sign(),
				self.box_width,
			);
			self.links.insert((direction, link.key()), path);
		}
	}

	fn draw_expand_affordance(&mut self, direction: Direction, node: &LayoutNode) {
		let at = self.box_edge(direction, node, AFFORDANCE_OFFSET);
		self.affordances.insert((direction, node.person), at);
	}

	fn remove_expand_affordance(&mut self, direction: Direction, person: PersonId) {
		self.affordances.remove(&(direction, person));
	}

	fn draw_busy_indicator(&mut self, direction: Direction, node: &LayoutNode) {
		let at = self.box_edge(direction, node, BUSY_OFFSET);
		self.busy.insert((direction, node.person), at);
	}

	fn remove_busy_indicator(&mut self, direction: Direction, person: PersonId) {
		self.busy.remove(&(direction, person));
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::family_tree::graph::tests::{rec, with_parents};
	use crate::components::family_tree::reconcile::TreeView;

	fn scene_for(graph: &PersonGraph, root: i64) -> CanvasScene {
		let config = TreeConfig::default();
		let mut scene = CanvasScene::new(&config);
		for mut tree in [TreeView::ancestors(), TreeView::descendants()] {
			tree.draw(graph, Some(PersonId(root)), config.node_size(), &HashSet::new(), &mut scene)
				.unwrap();
		}
		scene
	}

	#[test]
	fn scene_places_trees_on_opposite_sides() {
		let mut graph = PersonGraph::new();
		let mut root = with_parents(rec(1), Some(5), None);
		root.parents = vec![with_parents(rec(5), Some(50), None)];
		root.children = vec![rec(2)];
		graph.insert_root(&root);
		let scene = scene_for(&graph, 1);

		let father = &scene.nodes[&(Direction::Ancestors, PersonId(5))];
		let child = &scene.nodes[&(Direction::Descendants, PersonId(2))];
		assert_eq!(father.position, Point::new(300.0, 0.0));
		assert_eq!(child.position, Point::new(-300.0, 0.0));
		assert_eq!(father.name, "Person 5");
		assert_eq!(
			scene.affordances[&(Direction::Ancestors, PersonId(5))],
			Point::new(420.0, 0.0)
		);
		assert_eq!(
			scene.links[&(Direction::Descendants, PersonId(2))].svg(),
			"M-100,0H-150V0H-200"
		);
	}

	#[test]
	fn clicks_hit_affordance_then_box_then_background() {
		let mut graph = PersonGraph::new();
		graph.insert_root(&with_parents(rec(1), Some(5), None));
		let scene = scene_for(&graph, 1);
		let (ox, oy) = TreeConfig::default().origin_offset;

		assert_eq!(scene.hit(ox + 120.0, oy), Hit::Expand(PersonId(1)));
		assert!(matches!(scene.hit(ox + 10.0, oy + 5.0), Hit::Person(PersonId(1), _)));
		assert_eq!(scene.hit(ox + 10.0, oy + 200.0), Hit::Background);
	}

	#[test]
	fn zoom_is_clamped_to_scale_extent() {
		let mut scene = CanvasScene::new(&TreeConfig::default());
		scene.zoom(0.0, 0.0, 1.5);
		assert_eq!(scene.transform.k, 1.0);
		for _ in 0..100 {
			scene.zoom(0.0, 0.0, 0.5);
		}
		assert_eq!(scene.transform.k, 0.1);
	}

	#[test]
	fn short_press_is_a_click_long_drag_is_not() {
		let mut scene = CanvasScene::new(&TreeConfig::default());
		scene.start_pan(10.0, 10.0);
		scene.pan_to(11.0, 10.0);
		assert!(scene.end_pan());

		scene.start_pan(10.0, 10.0);
		scene.pan_to(60.0, 40.0);
		assert!(!scene.end_pan());
		assert_eq!(scene.transform.x, 550.0);
	}

	#[test]
	fn info_card_lists_vitals() {
		let mut graph = PersonGraph::new();
		let mut r = rec(1);
		r.birth_date = Some("1850-03-00".into());
		r.name = Some("Doe-1".into());
		graph.insert_root(&r);
		let card = InfoCard::for_person(&graph, PersonId(1), Point::default()).unwrap();
		assert_eq!(card.lines[0], "Born March 1850.");
		assert_eq!(card.lines[1], "Profile: Doe-1");
	}
}
