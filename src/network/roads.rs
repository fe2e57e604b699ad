use ahash::AHashMap;

use crate::common::Value;
use crate::landuse::TagMapping;
use crate::network::Network;

/// Ramp and slip-road classes removed when links are dropped.
pub const LINK_CLASSES: [&str; 5] = ["motorway_link", "trunk_link", "primary_link", "secondary_link", "tertiary_link"];

/// Hierarchy label marking road classes to remove.
pub const DELETED: &str = "Deleted";

/// Lookup from OSM `highway` values to road hierarchy labels.
#[derive(Debug, Clone, Default)]
pub struct RoadHierarchy {
    labels: AHashMap<String, String>,
}

impl RoadHierarchy {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where K: Into<String>, V: Into<String> {
        Self { labels: pairs.into_iter().map(|(value, label)| (value.into(), label.into())).collect() }
    }

    /// Hierarchy taken from the `highway` table of a tag mapping.
    pub fn from_mapping(mapping: &impl TagMapping) -> Self {
        match mapping.mapping("highway") {
            Some(table) => Self { labels: table.clone() },
            None => {
                log::warn!("[network::roads] no 'highway' table in mapping, every road stays unlabelled");
                Self::default()
            }
        }
    }

    #[inline]
    pub fn label(&self, highway: &str) -> Option<&str> {
        self.labels.get(highway).map(String::as_str)
    }
}

impl Network {
    /// Label each edge with the hierarchy of its `highway` value.
    ///
    /// The label goes to the `hierarchy` attribute. Edges labelled [`DELETED`]
    /// are removed, as are [`LINK_CLASSES`] when `drop_links` is set. Edges
    /// with an unmapped or missing `highway` are kept without a label.
    pub fn classify_roads(&self, hierarchy: &RoadHierarchy, drop_links: bool) -> Network {
        let mut network = self.clone();

        let links = if drop_links {
            network.retain_edges(|edge| edge.get("highway")
                .and_then(Value::as_str)
                .is_none_or(|class| !LINK_CLASSES.contains(&class)))
        } else {
            0
        };

        let mut labelled = 0;
        for edge in network.edges_mut() {
            let label = edge.get("highway").and_then(Value::as_str).and_then(|class| hierarchy.label(class));
            if let Some(label) = label.map(str::to_string) {
                edge.attrs.insert("hierarchy".to_string(), Value::from(label));
                labelled += 1;
            }
        }

        let deleted = network.retain_edges(|edge| edge.get("hierarchy").and_then(Value::as_str) != Some(DELETED));

        log::info!("[network::roads] {labelled} edge(s) labelled, {links} link(s) and {deleted} deleted class edge(s) removed");

        network
    }
}
