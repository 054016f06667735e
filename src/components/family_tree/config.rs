use super::layout::NodeSize;

/// Geometry and service settings for one viewer.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
	/// Endpoint of the WikiTree API.
	pub api_base_url: String,
	/// Person box extent along the depth axis.
	pub box_width: f64,
	/// Person box extent along the sibling axis.
	pub box_height: f64,
	/// Initial pan so the root does not sit in the corner.
	pub origin_offset: (f64, f64),
	/// Smallest zoom factor.
	pub min_scale: f64,
	/// Largest zoom factor.
	pub max_scale: f64,
}

impl Default for TreeConfig {
	fn default() -> Self {
		Self {
			api_base_url: "https://api.wikitree.com/api.php".to_string(),
			box_width: 200.0,
			box_height: 50.0,
			origin_offset: (500.0, 300.0),
			min_scale: 0.1,
			max_scale: 1.0,
		}
	}
}

impl TreeConfig {
	/// Boxes get half their width again along the depth axis and twice their height between siblings.
	pub fn node_size(&self) -> NodeSize {
		NodeSize {
			sibling: self.box_height * 2.0,
			depth: self.box_width * 1.5,
		}
	}
}
