mod engine;
mod index;
mod proj;
mod repair;

pub use engine::{GeometryEngine, PlanarEngine};
pub use index::PointIndex;
pub use proj::{utm_proj4, Proj4Projection, Projection};
pub use repair::repair;
