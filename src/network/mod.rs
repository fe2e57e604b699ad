mod collapse;
mod diagnosis;
mod export;
mod filter;
mod graph;
mod isolated;
mod reproject;
mod roads;

pub use diagnosis::GraphInfo;
pub use export::{ExportOptions, FeatureTable};
pub use filter::BoundaryOptions;
pub use graph::{Edge, GraphKind, Network, Node, NodeId};
pub use isolated::IsolatedOptions;
pub use reproject::ReprojectOptions;
pub use roads::{RoadHierarchy, DELETED, LINK_CLASSES};
