use geo::{unary_union, Geometry, MultiPolygon, Validation};

/// Repair a geometry into a valid (Multi)Polygon.
///
/// Valid polygonal input is returned unchanged; invalid input is re-noded through
/// a unary union. Collections keep only their polygonal members, merged into one
/// MultiPolygon. Anything without a polygonal part repairs to an empty MultiPolygon,
/// which callers are expected to filter out.
pub fn repair(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(polygon) => repair_multi(MultiPolygon::new(vec![polygon.clone()])),
        Geometry::MultiPolygon(multi) => repair_multi(multi.clone()),
        Geometry::Rect(rect) => repair_multi(MultiPolygon::new(vec![rect.to_polygon()])),
        Geometry::Triangle(triangle) => repair_multi(MultiPolygon::new(vec![triangle.to_polygon()])),
        Geometry::GeometryCollection(collection) => {
            let mut parts = collection.iter()
                .map(repair)
                .filter(|part| !part.0.is_empty())
                .collect::<Vec<_>>();

            match parts.len() {
                0 => MultiPolygon::new(vec![]),
                1 => parts.swap_remove(0),
                _ => unary_union(parts.iter().flat_map(|part| part.0.iter())),
            }
        }
        _ => MultiPolygon::new(vec![]),
    }
}

/// Repair a MultiPolygon, returning it untouched when already valid.
pub(crate) fn repair_multi(multi: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if multi.is_valid() { return multi }
    unary_union(multi.0.iter())
}
