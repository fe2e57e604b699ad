use std::collections::BTreeMap;

use geo::{unary_union, Area, BooleanOps, Geometry, MultiPolygon, Polygon};

use crate::geom::repair;

/// The planar geometry capabilities the land-use allocator relies on.
///
/// Every operation is total: degenerate input produces an empty MultiPolygon
/// rather than an error.
pub trait GeometryEngine {
    /// Repair any geometry into a valid (Multi)Polygon.
    fn repair(&self, geometry: &Geometry<f64>) -> MultiPolygon<f64>;

    /// Union of all `parts`.
    fn union(&self, parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64>;

    /// The part of `a` also covered by `b`.
    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;

    /// The part of `a` not covered by `b`.
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;

    /// Planar area in squared units of the input frame.
    fn area(&self, geometry: &MultiPolygon<f64>) -> f64;

    /// Merge all geometries sharing a key into one (possibly multi-part) geometry.
    fn dissolve<K: Ord>(&self, rows: impl IntoIterator<Item = (K, MultiPolygon<f64>)>) -> BTreeMap<K, MultiPolygon<f64>>
    where Self: Sized {
        let mut groups = BTreeMap::<K, Vec<MultiPolygon<f64>>>::new();
        for (key, geometry) in rows {
            groups.entry(key).or_default().push(geometry);
        }

        groups.into_iter()
            .map(|(key, parts)| { let merged = self.union(&parts); (key, merged) })
            .collect()
    }

    /// Split a multi-part geometry into its simple parts.
    fn explode(&self, geometry: MultiPolygon<f64>) -> Vec<Polygon<f64>> { geometry.0 }
}

/// `GeometryEngine` backed by the `geo` boolean operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanarEngine;

impl GeometryEngine for PlanarEngine {
    #[inline]
    fn repair(&self, geometry: &Geometry<f64>) -> MultiPolygon<f64> { repair(geometry) }

    fn union(&self, parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
        match parts {
            [] => MultiPolygon::new(vec![]),
            [single] => single.clone(),
            _ => unary_union(parts.iter().flat_map(|part| part.0.iter())),
        }
    }

    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if a.0.is_empty() || b.0.is_empty() { return MultiPolygon::new(vec![]) }
        a.intersection(b)
    }

    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if a.0.is_empty() { return MultiPolygon::new(vec![]) }
        if b.0.is_empty() { return a.clone() }
        a.difference(b)
    }

    #[inline]
    fn area(&self, geometry: &MultiPolygon<f64>) -> f64 { geometry.unsigned_area() }
}
