use geo::{Contains, MultiPolygon, Point};

use crate::common::{Skip, Tally, Value};
use crate::geom::Projection;
use crate::network::Network;

/// Source coordinate attribute names for [`Network::remove_nodes_outside_boundary`].
#[derive(Debug, Clone)]
pub struct BoundaryOptions {
    pub x_key: String,
    pub y_key: String,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self { x_key: "x".to_string(), y_key: "y".to_string() }
    }
}

impl Network {
    /// Copy without the named node and edge attributes.
    pub fn remove_attrs(&self, node_attrs: &[&str], edge_attrs: &[&str]) -> Network {
        let mut network = self.clone();
        for node in network.nodes_mut() {
            node_attrs.iter().for_each(|key| { node.attrs.remove(*key); });
        }
        for edge in network.edges_mut() {
            edge_attrs.iter().for_each(|key| { edge.attrs.remove(*key); });
        }
        network
    }

    /// Copy without the edges whose `key` attribute equals one of `values`.
    /// With `remove_isolated`, nodes left without edges are removed as well.
    pub fn remove_edges_by_value(&self, key: &str, values: &[Value], remove_isolated: bool) -> Network {
        let mut network = self.clone();
        let removed = network.retain_edges(|edge| edge.get(key).is_none_or(|value| !values.contains(value)));

        let isolated = if remove_isolated { network.remove_nodes(network.isolates()) } else { 0 };

        log::info!("[network::filter] removed {removed} edge(s) by '{key}' and {isolated} isolated node(s)");
        network
    }

    /// Keep only the nodes whose projected source coordinates fall inside `boundary`.
    ///
    /// Nodes without coordinates, or whose projection fails, are removed too,
    /// along with the incident edges of every removed node. The returned
    /// network carries `target_frame` as its `crs`.
    pub fn remove_nodes_outside_boundary(
        &self,
        projection: &impl Projection,
        target_frame: &str,
        boundary: &MultiPolygon<f64>,
        options: &BoundaryOptions,
    ) -> Network {
        let mut tally = Tally::new("network::filter");

        let outside = self.nodes().iter()
            .filter(|node| {
                let projected = node.coord(&options.x_key, &options.y_key)
                    .and_then(|coord| projection.project(coord).ok());
                match projected {
                    Some(coord) => !boundary.contains(&Point::from(coord)),
                    None => { tally.add(Skip::MissingAttribute); true }
                }
            })
            .map(|node| node.id)
            .collect::<Vec<_>>();

        let mut network = self.clone();
        let removed = network.remove_nodes(outside);
        network.set_crs(Some(target_frame.to_string()));

        tally.report();
        log::info!("[network::filter] removed {removed} node(s) outside the boundary, {} remain", network.node_count());

        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, Rect};

    use crate::common::Attrs;
    use crate::network::{GraphKind, NodeId};

    fn sample() -> Network {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        for (id, x) in [(1, 0.5), (2, 1.5), (3, 5.0)] {
            network.add_node(NodeId(id), Attrs::from([
                ("x".to_string(), Value::Float(x)),
                ("y".to_string(), Value::Float(0.5)),
                ("street_count".to_string(), Value::Int(2)),
            ]));
        }
        network.add_node(NodeId(4), Attrs::new());
        network.add_edge(NodeId(1), NodeId(2), Attrs::from([("highway".to_string(), Value::from("primary")), ("osmid".to_string(), Value::Int(7))]));
        network.add_edge(NodeId(2), NodeId(3), Attrs::from([("highway".to_string(), Value::from("footway"))]));
        network.add_edge(NodeId(3), NodeId(4), Attrs::from([("highway".to_string(), Value::from("cycleway"))]));
        network
    }

    #[test]
    fn attributes_are_pruned_on_a_copy() {
        let network = sample();
        let pruned = network.remove_attrs(&["street_count"], &["osmid", "absent"]);
        assert!(pruned.nodes().iter().all(|node| node.get("street_count").is_none()));
        assert!(pruned.edges()[0].get("osmid").is_none());
        assert!(pruned.edges()[0].get("highway").is_some());
        assert!(network.edges()[0].get("osmid").is_some());
    }

    #[test]
    fn edges_removed_by_value() {
        let values = [Value::from("footway"), Value::from("cycleway")];

        let kept = sample().remove_edges_by_value("highway", &values, false);
        assert_eq!(kept.edge_count(), 1);
        assert_eq!(kept.node_count(), 4);

        let pruned = sample().remove_edges_by_value("highway", &values, true);
        assert_eq!(pruned.node_count(), 2);
        assert!(pruned.node(NodeId(3)).is_none());
    }

    #[test]
    fn nodes_outside_boundary_are_removed() {
        let boundary = MultiPolygon::new(vec![Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 20.0, y: 10.0 }).to_polygon()]);
        let scale = |x: f64, y: f64| (x * 10.0, y * 10.0);

        let clipped = sample().remove_nodes_outside_boundary(&scale, "local", &boundary, &BoundaryOptions::default());
        assert_eq!(clipped.crs(), Some("local"));
        assert_eq!(clipped.nodes().iter().map(|node| node.id).collect::<Vec<_>>(), vec![NodeId(1), NodeId(2)]);
        assert_eq!(clipped.edge_count(), 1);
    }
}
