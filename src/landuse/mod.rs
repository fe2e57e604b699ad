mod allocate;
mod layer;
mod partition;
mod tags;

pub use allocate::{allocate, allocate_with, COVERAGE_EPSILON};
pub use layer::{Layer, PolygonFeature};
pub use partition::{LandUse, LandUsePartition};
pub use tags::{extract_layers, TagMapping, TagTable, TaggedFeature, DEFAULT_NAMESPACES};
