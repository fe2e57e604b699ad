use std::collections::{btree_map::Entry, BTreeMap};

use crate::common::{Skip, Tally};
use crate::network::{GraphKind, Network, NodeId};

/// The edge currently kept for a node pair: `(weight, key, position)`.
type Candidate = (f64, u32, usize);

impl Network {
    /// Collapse into a simple undirected graph.
    ///
    /// Every unordered node pair joined by at least one non-loop edge keeps the
    /// edge with the smallest `weight_key` and all of its attributes. Missing or
    /// non-numeric weights count as `+inf`. Equal weights go to the smaller edge
    /// key, then to the edge inserted first. Self-loops are dropped; nodes are
    /// copied unchanged.
    pub fn collapse(&self, weight_key: &str) -> Network {
        let mut tally = Tally::new("network::collapse");
        let mut loops = 0;

        let mut best = BTreeMap::<(NodeId, NodeId), Candidate>::new();
        for (position, edge) in self.edges().iter().enumerate() {
            if edge.is_self_loop() { loops += 1; continue }

            let weight = match edge.get(weight_key) {
                None => { tally.add(Skip::MissingAttribute); f64::INFINITY }
                Some(value) => value.as_f64().unwrap_or_else(|| {
                    tally.add(Skip::NonNumericWeight);
                    f64::INFINITY
                }),
            };

            match best.entry(edge.pair()) {
                Entry::Vacant(entry) => { entry.insert((weight, edge.key, position)); }
                Entry::Occupied(mut entry) => {
                    let (kept, key, _) = *entry.get();
                    if weight < kept || (weight == kept && edge.key < key) {
                        entry.insert((weight, edge.key, position));
                    }
                }
            }
        }

        let mut collapsed = Network::new(GraphKind::Graph).with_crs(self.crs().map(str::to_string));
        for node in self.nodes() {
            collapsed.add_node(node.id, node.attrs.clone());
        }

        let mut winners = best.into_values().map(|(_, _, position)| position).collect::<Vec<_>>();
        winners.sort_unstable();
        for position in winners {
            let edge = &self.edges()[position];
            collapsed.add_edge(edge.u, edge.v, edge.attrs.clone());
        }

        tally.report();
        log::info!("[network::collapse] {} edge(s) -> {} on '{weight_key}', {loops} self-loop(s) dropped",
            self.edge_count(), collapsed.edge_count());

        collapsed
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{Attrs, Value};
    use crate::network::{GraphKind, Network, NodeId};

    fn weighted(pairs: &[(&str, Value)]) -> Attrs {
        pairs.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
    }

    #[test]
    fn keeps_lightest_parallel_edge_with_its_attributes() {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        network.add_edge(NodeId(1), NodeId(2), weighted(&[("length", Value::Float(5.0)), ("name", Value::from("long"))]));
        network.add_edge(NodeId(2), NodeId(1), weighted(&[("length", Value::Int(3)), ("name", Value::from("short"))]));
        network.add_edge(NodeId(1), NodeId(2), weighted(&[("length", Value::from("n/a"))]));

        let collapsed = network.collapse("length");
        assert_eq!(collapsed.kind(), GraphKind::Graph);
        assert_eq!(collapsed.edge_count(), 1);

        let edge = &collapsed.edges()[0];
        assert_eq!(edge.weight("length"), Some(3.0));
        assert_eq!(edge.get("name"), Some(&Value::from("short")));
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn missing_weight_is_kept_when_it_is_the_only_candidate() {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        network.add_edge(NodeId(1), NodeId(2), weighted(&[("highway", Value::from("service"))]));
        network.add_edge(NodeId(2), NodeId(3), weighted(&[("length", Value::from("bogus"))]));
        network.add_edge(NodeId(2), NodeId(3), weighted(&[("length", Value::Float(f64::NAN))]));

        let collapsed = network.collapse("length");
        assert_eq!(collapsed.edge_count(), 2);
        assert_eq!(collapsed.edges()[0].get("highway"), Some(&Value::from("service")));
        assert_eq!(collapsed.edges()[1].get("length"), Some(&Value::from("bogus")));
    }

    #[test]
    fn self_loops_are_dropped_and_nodes_kept() {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        network.add_node(NodeId(9), Attrs::new());
        network.add_edge(NodeId(1), NodeId(1), weighted(&[("length", Value::Float(0.5))]));
        network.add_edge(NodeId(1), NodeId(2), weighted(&[("length", Value::Float(7.0))]));

        let collapsed = network.collapse("length");
        assert_eq!(collapsed.node_count(), 3);
        assert_eq!(collapsed.self_loop_count(), 0);
        assert_eq!(collapsed.edge_count(), 1);
        assert_eq!(collapsed.isolates(), vec![NodeId(9)]);
    }

    #[test]
    fn equal_weights_resolve_to_smallest_key() {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        network.add_edge_with_key(NodeId(1), NodeId(2), 4, weighted(&[("length", Value::Float(2.0)), ("tag", Value::from("k4"))]));
        network.add_edge_with_key(NodeId(2), NodeId(1), 1, weighted(&[("length", Value::Float(2.0)), ("tag", Value::from("k1"))]));
        network.add_edge_with_key(NodeId(1), NodeId(2), 0, weighted(&[("length", Value::Float(2.5)), ("tag", Value::from("k0"))]));

        let collapsed = network.collapse("length");
        assert_eq!(collapsed.edges()[0].get("tag"), Some(&Value::from("k1")));
    }
}
