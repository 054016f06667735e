use super::graph::PersonGraph;
use super::layout::{Direction, LayoutLink, LayoutNode};
use super::reconcile::KeyedDiff;
use super::types::PersonId;

/// Node classification of one redraw, keyed by person id.
pub type NodeDiff = KeyedDiff<PersonId, LayoutNode>;
/// Link classification of one redraw, keyed by target person id.
pub type LinkDiff = KeyedDiff<PersonId, LayoutLink>;

/// Whatever draws the trees. The engine only classifies, the surface owns the artifacts.
///
/// Entering elements are created, updated elements keep their identity and
/// take the new position, exiting keys are destroyed. Every call names the
/// direction, since both trees share one surface and may hold the same key.
pub trait RenderSurface {
	/// Applies the node classification. `graph` supplies the persons behind the keys.
	fn render_nodes(&mut self, direction: Direction, diff: &NodeDiff, graph: &PersonGraph);

	/// Applies the link classification.
	fn render_links(&mut self, direction: Direction, diff: &LinkDiff);

	/// Called for new and repositioned expandable leaves.
	fn draw_expand_affordance(&mut self, direction: Direction, node: &LayoutNode);

	/// Drops the affordance of a node that is no longer expandable or no longer shown.
	fn remove_expand_affordance(&mut self, direction: Direction, person: PersonId);

	/// Shown in place of the affordance while the node is loading.
	fn draw_busy_indicator(&mut self, direction: Direction, node: &LayoutNode);

	/// Drops the busy indicator once the node's fetch completed.
	fn remove_busy_indicator(&mut self, direction: Direction, person: PersonId);
}
