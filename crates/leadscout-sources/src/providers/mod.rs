//! Source provider implementations.

pub mod common;
pub mod osm;
pub mod places;

pub use osm::{BoundingBox, OsmProvider};
pub use places::PlacesProvider;
