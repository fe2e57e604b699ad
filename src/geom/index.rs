use geo::Coord;
use rstar::{primitives::GeomWithData, RTree};

/// A point in the R-tree, tagged with the position of its owner.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// An R-tree over planar points for nearest-neighbor lookups.
#[derive(Debug, Clone)]
pub struct PointIndex {
    rtree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Build the index from `(tag, coordinate)` pairs.
    pub fn new(points: impl IntoIterator<Item = (usize, Coord<f64>)>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                points.into_iter()
                    .map(|(tag, coord)| IndexedPoint::new([coord.x, coord.y], tag))
                    .collect()
            ),
        }
    }

    #[inline] pub fn len(&self) -> usize { self.rtree.size() }

    #[inline] pub fn is_empty(&self) -> bool { self.rtree.size() == 0 }

    /// Nearest indexed point to `query` as `(tag, distance)`, or `None` if the
    /// nearest one is farther than `max_distance`. Equidistant candidates
    /// resolve to the smallest tag.
    pub fn nearest_within(&self, query: Coord<f64>, max_distance: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for (point, distance_2) in self.rtree.nearest_neighbor_iter_with_distance_2(&[query.x, query.y]) {
            let distance = distance_2.sqrt();
            match best {
                None if distance > max_distance => return None,
                None => best = Some((point.data, distance)),
                Some((_, nearest)) if distance > nearest => break,
                Some((tag, nearest)) => if point.data < tag { best = Some((point.data, nearest)) },
            }
        }

        best
    }

    /// Nearest indexed point to `query`, regardless of distance.
    #[inline]
    pub fn nearest(&self, query: Coord<f64>) -> Option<(usize, f64)> {
        self.nearest_within(query, f64::INFINITY)
    }
}
