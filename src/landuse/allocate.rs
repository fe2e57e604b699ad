use geo::{Geometry, MultiPolygon};

use crate::common::{Skip, Tally};
use crate::geom::{GeometryEngine, PlanarEngine};
use crate::landuse::{Layer, LandUse, LandUsePartition};

/// Remaining boundary area below which the sweep treats the boundary as fully covered.
pub const COVERAGE_EPSILON: f64 = 1e-8;

/// Restrict a feature geometry to a repaired (Multi)Polygon with positive area.
fn polygonal<E: GeometryEngine>(engine: &E, geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    if !matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)) { return None }
    let repaired = engine.repair(geometry);
    (engine.area(&repaired) > 0.0).then_some(repaired)
}

/// Consolidate prioritised land-use layers into one non-overlapping partition,
/// using the planar `geo` engine. See [`allocate_with`].
pub fn allocate(layers: &[Layer], boundary: Option<&MultiPolygon<f64>>) -> LandUsePartition {
    allocate_with(&PlanarEngine, layers, boundary)
}

/// Consolidate prioritised land-use layers into one non-overlapping partition.
///
/// Layers are swept in order. Each layer dissolves its features by category,
/// clips them against the region no earlier layer has claimed, and removes what
/// it claimed from that region. Inside one layer, categories claim in sorted
/// order, so overlapping features of different categories do not overlap in
/// the output. The sweep stops early once the unclaimed area
/// drops below [`COVERAGE_EPSILON`]. Categories are finally merged across layers
/// and split into single-part polygons.
///
/// `boundary` defaults to the union of every candidate feature geometry.
pub fn allocate_with<E: GeometryEngine>(
    engine: &E,
    layers: &[Layer],
    boundary: Option<&MultiPolygon<f64>>,
) -> LandUsePartition {
    let mut tally = Tally::new("landuse::allocate");

    // 1) Candidate features: positive-area polygons only.
    let mut candidates = Vec::with_capacity(layers.len());
    for layer in layers {
        let mut rows = Vec::with_capacity(layer.features.len());
        for feature in &layer.features {
            match polygonal(engine, &feature.geometry) {
                Some(geometry) => rows.push((feature.category.as_deref(), geometry)),
                None => tally.add(Skip::InvalidGeometry),
            }
        }
        candidates.push(rows);
    }

    if candidates.iter().all(Vec::is_empty) {
        tally.add(Skip::EmptyInput);
        tally.report();
        log::info!("[landuse::allocate] no polygonal features in {} layer(s)", layers.len());
        return LandUsePartition::default();
    }

    // 2) Region still open for assignment.
    let mut remaining = match boundary {
        Some(boundary) => engine.repair(&Geometry::MultiPolygon(boundary.clone())),
        None => {
            let all = candidates.iter()
                .flat_map(|rows| rows.iter().map(|(_, geometry)| geometry.clone()))
                .collect::<Vec<_>>();
            engine.repair(&Geometry::MultiPolygon(engine.union(&all)))
        }
    };

    // 3) Priority sweep.
    let mut assigned = Vec::<(String, MultiPolygon<f64>)>::new();
    for (priority, (layer, rows)) in layers.iter().zip(&candidates).enumerate() {
        let uncategorised = rows.iter().filter(|(category, _)| category.is_none()).count();
        tally.add_n(Skip::MissingAttribute, uncategorised);

        let dissolved = engine.dissolve(rows.iter()
            .filter_map(|(category, geometry)| category.map(|category| (category, geometry.clone()))));

        // Categories within a layer claim in sorted order and never share ground.
        let mut claimed = Vec::new();
        let mut parts = 0;
        for (category, merged) in dissolved {
            let mut claims = Vec::new();
            for part in engine.explode(merged) {
                let clipped = engine.intersection(&MultiPolygon::new(vec![part]), &remaining);
                let clipped = engine.repair(&Geometry::MultiPolygon(clipped));
                if engine.area(&clipped) > 0.0 { claims.push(clipped) }
            }
            if claims.is_empty() { continue }

            parts += claims.len();
            let claim = engine.repair(&Geometry::MultiPolygon(engine.union(&claims)));
            remaining = engine.repair(&Geometry::MultiPolygon(engine.difference(&remaining, &claim)));
            claimed.push((category.to_string(), claim));
        }

        log::debug!("[landuse::allocate] layer '{}' claimed {parts} part(s) in {} categories", layer.column, claimed.len());

        assigned.extend(claimed);

        if engine.area(&remaining) < COVERAGE_EPSILON {
            let skipped = layers.len() - priority - 1;
            if skipped > 0 {
                log::info!("[landuse::allocate] boundary covered after '{}', skipping {skipped} layer(s)", layer.column);
            }
            break;
        }
    }

    // 4) Merge each category across layers, then split into simple parts.
    let mut parcels = Vec::new();
    for (landuse, merged) in engine.dissolve(assigned) {
        for part in engine.explode(merged) {
            let repaired = engine.repair(&Geometry::Polygon(part));
            for polygon in engine.explode(repaired) {
                // 5) Keep positive-area parts only.
                if engine.area(&MultiPolygon::new(vec![polygon.clone()])) > 0.0 {
                    parcels.push(LandUse { landuse: landuse.clone(), geometry: polygon });
                } else {
                    tally.add(Skip::InvalidGeometry);
                }
            }
        }
    }

    tally.report();
    log::info!("[landuse::allocate] {} land-use polygon(s) from {} layer(s)", parcels.len(), layers.len());

    LandUsePartition::new(parcels)
}
