use std::collections::BTreeSet;

use geo::Geometry;

/// A categorised polygon from one tagged source layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub category: Option<String>,
    pub geometry: Geometry<f64>,
}

impl PolygonFeature {
    pub fn new(category: Option<&str>, geometry: impl Into<Geometry<f64>>) -> Self {
        Self { category: category.map(str::to_string), geometry: geometry.into() }
    }
}

/// A named, ordered sequence of features sharing one category column.
///
/// Layers are consumed as an ordered list: an earlier layer has a higher
/// priority when claiming contested ground.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub column: String,
    pub features: Vec<PolygonFeature>,
}

impl Layer {
    pub fn new(column: impl Into<String>) -> Self {
        Self { column: column.into(), features: Vec::new() }
    }

    /// Builder-style append of one feature.
    pub fn with_feature(mut self, category: Option<&str>, geometry: impl Into<Geometry<f64>>) -> Self {
        self.features.push(PolygonFeature::new(category, geometry));
        self
    }

    #[inline] pub fn push(&mut self, feature: PolygonFeature) { self.features.push(feature) }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Distinct non-null categories, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.features.iter()
            .filter_map(|feature| feature.category.as_deref())
            .collect()
    }
}
