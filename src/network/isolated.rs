use ahash::AHashSet;
use geo::LineString;

use crate::common::{Attrs, Skip, Tally, Value};
use crate::geom::PointIndex;
use crate::network::{Network, NodeId};

/// Threshold and attribute names for [`Network::resolve_isolated_with`].
#[derive(Debug, Clone)]
pub struct IsolatedOptions {
    /// Maximum reconnection distance, inclusive. `None` drops every isolated node.
    pub threshold: Option<f64>,
    pub x_key: String,
    pub y_key: String,
    pub geometry_key: String,
    pub length_key: String,
}

impl Default for IsolatedOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            x_key: "proj_x".to_string(),
            y_key: "proj_y".to_string(),
            geometry_key: "geometry".to_string(),
            length_key: "length_m".to_string(),
        }
    }
}

impl Network {
    /// [`Network::resolve_isolated_with`] with default attribute names.
    pub fn resolve_isolated(&self, threshold: Option<f64>) -> Network {
        self.resolve_isolated_with(&IsolatedOptions { threshold, ..Default::default() })
    }

    /// Reconnect or drop degree-zero nodes.
    ///
    /// Each isolated node is joined by a straight edge to its nearest
    /// non-isolated node if that node lies within the threshold; nodes still
    /// isolated afterwards are removed. Nodes without projected coordinates
    /// never take part in matching. Equidistant candidates resolve to the
    /// smallest `NodeId`.
    pub fn resolve_isolated_with(&self, options: &IsolatedOptions) -> Network {
        let isolates = self.isolates();
        if isolates.is_empty() {
            log::debug!("[network::isolated] no isolated nodes");
            return self.clone();
        }

        let mut network = self.clone();
        let Some(threshold) = options.threshold else {
            let removed = network.remove_nodes(isolates);
            log::info!("[network::isolated] removed {removed} isolated node(s)");
            return network;
        };

        let mut tally = Tally::new("network::isolated");
        let mut connected = 0;

        if threshold.is_nan() {
            log::warn!("[network::isolated] threshold is NaN, no node will be reconnected");
        } else {
            let isolated = isolates.iter().copied().collect::<AHashSet<NodeId>>();

            let mut targets = self.nodes().iter()
                .filter(|node| !isolated.contains(&node.id))
                .filter_map(|node| Some((node.id, node.coord(&options.x_key, &options.y_key)?)))
                .collect::<Vec<_>>();
            targets.sort_by_key(|&(id, _)| id);

            let index = PointIndex::new(targets.iter().enumerate().map(|(tag, &(_, coord))| (tag, coord)));

            for &id in &isolates {
                let Some(coord) = self.node(id).and_then(|node| node.coord(&options.x_key, &options.y_key)) else {
                    tally.add(Skip::MissingAttribute);
                    continue;
                };
                let Some((tag, distance)) = index.nearest_within(coord, threshold) else { continue };

                let (target, target_coord) = targets[tag];
                let attrs = Attrs::from([
                    (options.geometry_key.clone(), Value::from(LineString::new(vec![coord, target_coord]))),
                    (options.length_key.clone(), Value::Float(distance)),
                ]);
                network.add_edge(id, target, attrs);
                connected += 1;
            }
        }

        let dropped = network.remove_nodes(network.isolates());

        tally.report();
        log::info!("[network::isolated] {} isolated node(s): {connected} reconnected within {threshold}, {dropped} removed ({} without coordinates)",
            isolates.len(), tally.get(Skip::MissingAttribute));

        network
    }
}
