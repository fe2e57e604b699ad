use std::collections::BTreeSet;

use anyhow::{Context, Result};
use geo::{Area, MultiPolygon, Polygon};
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};
use wkt::ToWkt;

/// One single-part polygon of the consolidated land-use partition.
#[derive(Debug, Clone, PartialEq)]
pub struct LandUse {
    pub landuse: String,
    pub geometry: Polygon<f64>,
}

/// Non-overlapping land-use polygons produced by the priority sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandUsePartition {
    parcels: Vec<LandUse>,
}

impl LandUsePartition {
    pub(crate) fn new(parcels: Vec<LandUse>) -> Self { Self { parcels } }

    #[inline] pub fn len(&self) -> usize { self.parcels.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.parcels.is_empty() }

    #[inline] pub fn parcels(&self) -> &[LandUse] { &self.parcels }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &LandUse> + '_ { self.parcels.iter() }

    /// Distinct land-use categories present in the partition.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.parcels.iter().map(|parcel| parcel.landuse.as_str()).collect()
    }

    /// All parts assigned to `landuse`, as one MultiPolygon.
    pub fn geometry_of(&self, landuse: &str) -> MultiPolygon<f64> {
        MultiPolygon::new(self.parcels.iter()
            .filter(|parcel| parcel.landuse == landuse)
            .map(|parcel| parcel.geometry.clone())
            .collect())
    }

    /// Total area assigned to `landuse`.
    pub fn area_of(&self, landuse: &str) -> f64 {
        self.parcels.iter()
            .filter(|parcel| parcel.landuse == landuse)
            .map(|parcel| parcel.geometry.unsigned_area())
            .sum()
    }

    pub fn total_area(&self) -> f64 {
        self.parcels.iter().map(|parcel| parcel.geometry.unsigned_area()).sum()
    }

    /// Tabular form `{landuse, area, geometry}` with geometry as WKT text.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let landuse = self.parcels.iter().map(|parcel| parcel.landuse.clone()).collect::<Vec<_>>();
        let area = self.parcels.iter().map(|parcel| parcel.geometry.unsigned_area()).collect::<Vec<_>>();
        let geometry = self.parcels.iter().map(|parcel| parcel.geometry.wkt_string()).collect::<Vec<_>>();

        DataFrame::new(vec![
            Series::new("landuse".into(), landuse).into(),
            Series::new("area".into(), area).into(),
            Series::new("geometry".into(), geometry).into(),
        ]).context("[landuse::partition] Failed to build land-use frame")
    }
}

impl<'a> IntoIterator for &'a LandUsePartition {
    type Item = &'a LandUse;
    type IntoIter = std::slice::Iter<'a, LandUse>;

    fn into_iter(self) -> Self::IntoIter { self.parcels.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, Rect};

    fn parcel(landuse: &str, x0: f64, x1: f64) -> LandUse {
        LandUse {
            landuse: landuse.to_string(),
            geometry: Rect::new(coord! { x: x0, y: 0.0 }, coord! { x: x1, y: 1.0 }).to_polygon(),
        }
    }

    #[test]
    fn per_category_queries() {
        let partition = LandUsePartition::new(vec![
            parcel("park", 0.0, 1.0),
            parcel("water", 1.0, 3.0),
            parcel("park", 5.0, 6.0),
        ]);

        assert_eq!(partition.len(), 3);
        assert_eq!(partition.categories().into_iter().collect::<Vec<_>>(), vec!["park", "water"]);
        assert!((partition.area_of("park") - 2.0).abs() < 1e-12);
        assert!((partition.area_of("water") - 2.0).abs() < 1e-12);
        assert_eq!(partition.area_of("forest"), 0.0);
        assert_eq!(partition.geometry_of("park").0.len(), 2);
        assert!((partition.total_area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn frame_has_one_row_per_parcel() {
        let partition = LandUsePartition::new(vec![parcel("park", 0.0, 1.0), parcel("water", 1.0, 3.0)]);
        let frame = partition.to_frame().unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.get_column_names().iter().map(|name| name.as_str()).collect::<Vec<_>>(),
            vec!["landuse", "area", "geometry"]);
    }

    #[test]
    fn empty_partition_frame() {
        let frame = LandUsePartition::default().to_frame().unwrap();
        assert_eq!(frame.height(), 0);
    }
}
