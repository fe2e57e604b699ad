#![doc = "osmprep public API"]
mod common;
mod geom;
mod landuse;
mod network;

#[doc(inline)]
pub use common::{Attrs, Skip, Value};

#[doc(inline)]
pub use geom::{repair, utm_proj4, GeometryEngine, PlanarEngine, PointIndex, Proj4Projection, Projection};

#[doc(inline)]
pub use landuse::{
    allocate, allocate_with, extract_layers, LandUse, LandUsePartition, Layer, PolygonFeature,
    TagMapping, TagTable, TaggedFeature, COVERAGE_EPSILON, DEFAULT_NAMESPACES,
};

#[doc(inline)]
pub use network::{
    BoundaryOptions, Edge, ExportOptions, FeatureTable, GraphInfo, GraphKind, IsolatedOptions, Network, Node,
    NodeId, ReprojectOptions, RoadHierarchy, DELETED, LINK_CLASSES,
};
