use ahash::AHashMap;
use anyhow::{Context, Result};
use geo::Geometry;
use polars::frame::DataFrame;

use crate::landuse::{Layer, PolygonFeature};

/// Tag namespaces considered for land use, in priority order.
pub const DEFAULT_NAMESPACES: [&str; 4] = ["landuse", "amenity", "leisure", "natural"];

/// Lookup tables from raw tag values to categories, one table per tag namespace.
pub trait TagMapping {
    fn mapping(&self, namespace: &str) -> Option<&AHashMap<String, String>>;

    /// Category for `value` in `namespace`, if the value is mapped.
    fn category(&self, namespace: &str, value: &str) -> Option<&str> {
        self.mapping(namespace)?.get(value).map(String::as_str)
    }
}

/// In-memory `TagMapping`.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tables: AHashMap<String, AHashMap<String, String>>,
}

impl TagTable {
    pub fn new() -> Self { Self::default() }

    /// Add `(value, category)` pairs to the table for `namespace`.
    pub fn insert<K, V>(&mut self, namespace: &str, pairs: impl IntoIterator<Item = (K, V)>)
    where K: Into<String>, V: Into<String> {
        self.tables.entry(namespace.to_string()).or_default()
            .extend(pairs.into_iter().map(|(value, category)| (value.into(), category.into())));
    }

    /// Load the table for `namespace` from two string columns of a DataFrame.
    /// Rows with a null on either side are skipped.
    pub fn insert_frame(&mut self, namespace: &str, df: &DataFrame, value_col: &str, category_col: &str) -> Result<()> {
        let values = df.column(value_col)
            .with_context(|| format!("[landuse::tags] Missing column '{value_col}' for '{namespace}'"))?
            .str()
            .with_context(|| format!("[landuse::tags] Column '{value_col}' is not a string column"))?;
        let categories = df.column(category_col)
            .with_context(|| format!("[landuse::tags] Missing column '{category_col}' for '{namespace}'"))?
            .str()
            .with_context(|| format!("[landuse::tags] Column '{category_col}' is not a string column"))?;

        let pairs = values.into_iter().zip(categories.into_iter())
            .filter_map(|(value, category)| Some((value?, category?)))
            .collect::<Vec<_>>();

        log::debug!("[landuse::tags] loaded {} mapping(s) for '{namespace}'", pairs.len());
        self.insert(namespace, pairs);
        Ok(())
    }

    /// Names of the namespaces with a table.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.keys().map(String::as_str)
    }
}

impl TagMapping for TagTable {
    #[inline]
    fn mapping(&self, namespace: &str) -> Option<&AHashMap<String, String>> {
        self.tables.get(namespace)
    }
}

/// A raw map feature: its tags and geometry.
#[derive(Debug, Clone)]
pub struct TaggedFeature {
    pub tags: AHashMap<String, String>,
    pub geometry: Geometry<f64>,
}

impl TaggedFeature {
    pub fn new<K, V>(tags: impl IntoIterator<Item = (K, V)>, geometry: impl Into<Geometry<f64>>) -> Self
    where K: Into<String>, V: Into<String> {
        Self {
            tags: tags.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
            geometry: geometry.into(),
        }
    }
}

/// Map raw tags to categories and split features into one layer per namespace.
///
/// Layers come out in `namespaces` order, which is their priority order. A
/// feature none of whose namespaces maps to a category is dropped entirely;
/// otherwise it appears in every layer, with a null category where unmapped.
pub fn extract_layers(features: &[TaggedFeature], namespaces: &[&str], mapping: &impl TagMapping) -> Vec<Layer> {
    for namespace in namespaces {
        if mapping.mapping(namespace).is_none() {
            log::warn!("[landuse::tags] no mapping table for '{namespace}', its categories will be null");
        }
    }

    let mut layers = namespaces.iter().map(|namespace| Layer::new(*namespace)).collect::<Vec<_>>();
    let mut dropped = 0;

    for feature in features {
        let categories = namespaces.iter()
            .map(|namespace| feature.tags.get(*namespace)
                .and_then(|value| mapping.category(namespace, value)))
            .collect::<Vec<_>>();

        if categories.iter().all(Option::is_none) { dropped += 1; continue }

        for (layer, category) in layers.iter_mut().zip(categories) {
            layer.push(PolygonFeature::new(category, feature.geometry.clone()));
        }
    }

    log::info!("[landuse::tags] kept {} feature(s), dropped {dropped} without a mapped category",
        features.len() - dropped);

    layers
}
