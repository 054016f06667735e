//! Interactive ancestor/descendant tree of one focal person.
//!
//! The person graph is the single source of truth. Each redraw lays out both
//! directions from the root and reconciles the result against what the
//! canvas scene currently shows, keyed by person id.

mod component;
mod config;
mod error;
mod expansion;
mod graph;
mod layout;
mod person;
mod reconcile;
mod render;
mod source;
mod state;
mod surface;
mod types;
mod viewer;

pub use component::FamilyTreeCanvas;
pub use config::TreeConfig;
pub use error::{FetchError, TreeError};
pub use expansion::{ExpandOutcome, ExpansionCoordinator, ExpansionState};
pub use graph::PersonGraph;
pub use layout::{Direction, ElbowPath, LayoutLink, LayoutNode, NodeSize, TreeLayout, elbow, layout, layout_direction};
pub use person::{Children, ParentLink, Person, PersonRecord, Profile};
pub use reconcile::{KeyedDiff, KeyedSet, TreeView, is_expandable};
pub use source::{PERSON_FIELDS, PersonSource, WikiTreeClient, parse_get_person};
pub use state::CanvasScene;
pub use surface::{LinkDiff, NodeDiff, RenderSurface};
pub use types::{Gender, PartialDate, PersonId, Point, Privacy, human_date};
pub use viewer::TreeViewer;
