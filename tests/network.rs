use std::collections::BTreeSet;

use geo::{coord, Rect};
use osmprep::{
    Attrs, ExportOptions, GraphKind, IsolatedOptions, Network, NodeId, ReprojectOptions, RoadHierarchy, Value,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn attrs(pairs: &[(&str, Value)]) -> Attrs {
    pairs.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

fn point(x: f64, y: f64) -> Attrs {
    attrs(&[("x", Value::Float(x)), ("y", Value::Float(y))])
}

fn projected(x: f64, y: f64) -> Attrs {
    attrs(&[("proj_x", Value::Float(x)), ("proj_y", Value::Float(y))])
}

#[test]
fn collapse_keeps_minimum_weight_edge() {
    let mut network = Network::new(GraphKind::MultiDiGraph);
    let (a, b) = (NodeId(1), NodeId(2));
    network.add_edge(a, b, attrs(&[("length", Value::Float(5.0)), ("name", Value::from("detour"))]));
    network.add_edge(a, b, attrs(&[("length", Value::Float(3.0)), ("name", Value::from("direct"))]));

    let collapsed = network.collapse("length");
    assert_eq!(collapsed.edge_count(), 1);
    let edge = collapsed.edges_between(b, a).next().unwrap();
    assert_eq!(edge.weight("length"), Some(3.0));
    assert_eq!(edge.get("name"), Some(&Value::from("direct")));
}

#[test]
fn collapse_minimality_on_random_multigraphs() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        let mut network = Network::new(GraphKind::MultiDiGraph);
        for _ in 0..40 {
            let u = NodeId(rng.random_range(0..8));
            let v = NodeId(rng.random_range(0..8));
            let weight = match rng.random_range(0..5) {
                0 => Value::from("unknown"),
                _ => Value::Float(rng.random_range(1..100) as f64),
            };
            network.add_edge(u, v, attrs(&[("length", weight)]));
        }

        let collapsed = network.collapse("length");
        assert_eq!(collapsed.self_loop_count(), 0);

        let pairs = collapsed.edges().iter().map(|edge| edge.pair()).collect::<BTreeSet<_>>();
        assert_eq!(pairs.len(), collapsed.edge_count());

        for edge in collapsed.edges() {
            let (u, v) = edge.pair();
            let expected = network.edges().iter()
                .filter(|candidate| !candidate.is_self_loop() && candidate.pair() == (u, v))
                .map(|candidate| candidate.weight("length").unwrap_or(f64::INFINITY))
                .fold(f64::INFINITY, f64::min);
            assert_eq!(edge.weight("length").unwrap_or(f64::INFINITY), expected);
        }
    }
}

/// A-B-D connected; C isolated two units away from D.
fn with_isolated_node() -> Network {
    let mut network = Network::new(GraphKind::Graph);
    network.add_node(NodeId(1), projected(0.0, 0.0));
    network.add_node(NodeId(2), projected(5.0, 0.0));
    network.add_node(NodeId(4), projected(10.0, 0.0));
    network.add_node(NodeId(3), projected(10.0, 2.0));
    network.add_edge(NodeId(1), NodeId(2), Attrs::new());
    network.add_edge(NodeId(2), NodeId(4), Attrs::new());
    network
}

#[test]
fn isolated_node_reconnects_within_threshold() {
    let network = with_isolated_node();

    let connected = network.resolve_isolated(Some(5.0));
    let edge = connected.edges_between(NodeId(3), NodeId(4)).next().unwrap();
    assert!((edge.weight("length_m").unwrap() - 2.0).abs() < 1e-12);
    assert_eq!(connected.node_count(), 4);

    let dropped = network.resolve_isolated(Some(1.0));
    assert!(dropped.node(NodeId(3)).is_none());
    assert_eq!(dropped.edge_count(), 2);

    assert_eq!(network.node_count(), 4);
    assert_eq!(network.isolates(), vec![NodeId(3)]);
}

#[test]
fn reconnection_is_monotonic_in_threshold() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut network = Network::new(GraphKind::Graph);
    for id in 0..30 {
        let (x, y) = (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0));
        network.add_node(NodeId(id), projected(x, y));
        if id < 15 && id % 2 == 1 {
            network.add_edge(NodeId(id - 1), NodeId(id), Attrs::new());
        }
    }

    let reconnected = |threshold: f64| -> BTreeSet<NodeId> {
        let resolved = network.resolve_isolated(Some(threshold));
        network.isolates().into_iter().filter(|id| resolved.node(*id).is_some()).collect()
    };

    let thresholds = [0.0, 5.0, 10.0, 20.0, 40.0, 200.0];
    for pair in thresholds.windows(2) {
        let (smaller, larger) = (reconnected(pair[0]), reconnected(pair[1]));
        assert!(smaller.is_subset(&larger), "{} -> {}", pair[0], pair[1]);
    }
    assert_eq!(reconnected(200.0).len(), network.isolates().len());
}

#[test]
fn custom_keys_for_isolated_resolution() {
    let mut network = Network::new(GraphKind::Graph);
    network.add_node(NodeId(1), point(0.0, 0.0));
    network.add_node(NodeId(2), point(3.0, 4.0));
    network.add_node(NodeId(3), point(0.0, 1.0));
    network.add_edge(NodeId(1), NodeId(2), Attrs::new());

    let options = IsolatedOptions {
        threshold: Some(1.0),
        x_key: "x".to_string(),
        y_key: "y".to_string(),
        length_key: "length".to_string(),
        ..Default::default()
    };
    let resolved = network.resolve_isolated_with(&options);
    assert_eq!(resolved.edges_between(NodeId(1), NodeId(3)).next().unwrap().weight("length"), Some(1.0));
}

#[test]
fn preprocessing_pipeline() {
    let mut network = Network::new(GraphKind::MultiDiGraph).with_crs(Some("EPSG:4326".to_string()));
    network.add_node(NodeId(1), point(0.0, 0.0));
    network.add_node(NodeId(2), point(1.0, 0.0));
    network.add_node(NodeId(3), point(1.0, 1.0));
    network.add_node(NodeId(4), point(1.0, 1.2));
    network.add_node(NodeId(5), point(50.0, 50.0));
    network.add_node(NodeId(6), attrs(&[("x", Value::Float(0.5))]));
    network.add_edge(NodeId(1), NodeId(2), attrs(&[("highway", Value::from("primary"))]));
    network.add_edge(NodeId(2), NodeId(1), attrs(&[("highway", Value::from("primary"))]));
    network.add_edge(NodeId(2), NodeId(3), attrs(&[("highway", Value::from("primary_link"))]));
    network.add_edge(NodeId(3), NodeId(6), attrs(&[("highway", Value::from("service"))]));

    let to_metres = |x: f64, y: f64| (x * 1000.0, y * 1000.0);
    let options = ReprojectOptions { add_missing_geometry: true, ..Default::default() };
    let projected = network.reproject(&to_metres, "local-metres", &options);
    assert_eq!(projected.node_count(), 5);
    assert_eq!(projected.edge_count(), 3);
    assert!(projected.edges().iter().all(|edge| edge.line("geometry").is_some()));

    let hierarchy = RoadHierarchy::new([("primary", "Arterial"), ("primary_link", "Arterial")]);
    let classified = projected.classify_roads(&hierarchy, false);
    let simple = classified.collapse("length_m");
    assert_eq!(simple.edge_count(), 2);

    let resolved = simple.resolve_isolated(Some(500.0));
    assert_eq!(resolved.node_count(), 4);
    assert!(resolved.isolates().is_empty());
    assert_eq!(resolved.crs(), Some("local-metres"));

    let info = resolved.info();
    assert_eq!(info.components, 1);
    assert!(!info.directed);

    let (nodes, edges) = resolved.to_tables("local-metres", &ExportOptions::default()).unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(edges.len(), 3);
    assert!(edges.geometry.iter().all(Option::is_some));
    assert!(edges.to_csv_string().unwrap().contains("LINESTRING"));

    let text = resolved.geometry_to_text();
    assert!(text.edges().iter().all(|edge| edge.get("geometry").is_some_and(|value| !value.is_geometry())));
}

#[test]
fn boundary_clipping_drops_outside_nodes() {
    let mut network = Network::new(GraphKind::MultiDiGraph);
    network.add_node(NodeId(1), point(0.1, 0.1));
    network.add_node(NodeId(2), point(0.9, 0.9));
    network.add_node(NodeId(3), point(2.0, 2.0));
    network.add_edge(NodeId(1), NodeId(2), Attrs::new());
    network.add_edge(NodeId(2), NodeId(3), Attrs::new());

    let boundary = geo::MultiPolygon::new(vec![Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }).to_polygon()]);
    let identity = |x: f64, y: f64| (x, y);
    let clipped = network.remove_nodes_outside_boundary(&identity, "local", &boundary, &Default::default());

    assert_eq!(clipped.node_count(), 2);
    assert_eq!(clipped.edge_count(), 1);
}

#[test]
fn empty_network_passes_through_every_stage() {
    let network = Network::new(GraphKind::MultiDiGraph).with_crs(Some("EPSG:4326".to_string()));

    let identity = |x: f64, y: f64| (x, y);
    let projected = network.reproject(&identity, "local", &ReprojectOptions::default());
    assert!(projected.is_empty());
    assert_eq!(projected.crs(), Some("local"));

    let simple = projected.collapse("length_m");
    assert_eq!(simple.kind(), GraphKind::Graph);
    assert_eq!(simple.edge_count(), 0);

    let resolved = simple.resolve_isolated(Some(100.0));
    assert!(resolved.is_empty());
    assert_eq!(resolved.info().components, 0);

    let (nodes, edges) = resolved.to_tables("local", &ExportOptions::default()).unwrap();
    assert!(nodes.is_empty());
    assert!(edges.is_empty());
    assert_eq!(nodes.to_csv_string().unwrap().lines().skip(1).count(), 0);
    assert_eq!(edges.to_csv_string().unwrap().lines().skip(1).count(), 0);
    assert_eq!(resolved.to_node_link_json().unwrap()["nodes"].as_array().map(Vec::len), Some(0));
}
