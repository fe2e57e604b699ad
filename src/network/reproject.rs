use ahash::AHashMap;
use geo::{Coord, Euclidean, Geometry, Length, LineString, MapCoords};

use crate::common::{Skip, Tally, Value};
use crate::geom::Projection;
use crate::network::{Network, NodeId};

/// Attribute names and switches for [`Network::reproject`].
#[derive(Debug, Clone)]
pub struct ReprojectOptions {
    pub x_key: String,
    pub y_key: String,
    pub proj_x_key: String,
    pub proj_y_key: String,
    pub geometry_key: String,
    pub length_key: String,
    /// Delete nodes whose source coordinates are missing or cannot be projected.
    pub remove_invalid_nodes: bool,
    /// Give edges without a line geometry a straight segment between their projected endpoints.
    pub add_missing_geometry: bool,
}

impl Default for ReprojectOptions {
    fn default() -> Self {
        Self {
            x_key: "x".to_string(),
            y_key: "y".to_string(),
            proj_x_key: "proj_x".to_string(),
            proj_y_key: "proj_y".to_string(),
            geometry_key: "geometry".to_string(),
            length_key: "length_m".to_string(),
            remove_invalid_nodes: true,
            add_missing_geometry: false,
        }
    }
}

/// Planar length of a LineString or MultiLineString.
pub(crate) fn line_length(geometry: &Geometry<f64>) -> Option<f64> {
    match geometry {
        Geometry::LineString(line) => Some(Euclidean.length(line)),
        Geometry::MultiLineString(lines) => Some(Euclidean.length(lines)),
        _ => None,
    }
}

impl Network {
    /// Project node coordinates and edge geometries into `target_frame`.
    ///
    /// Each node's `(x, y)` is projected into `(proj_x, proj_y)`. Edge line
    /// geometries are projected vertex by vertex and their length recomputed.
    /// The returned network carries `target_frame` as its `crs`.
    pub fn reproject(&self, projection: &impl Projection, target_frame: &str, options: &ReprojectOptions) -> Network {
        let mut tally = Tally::new("network::reproject");
        let mut network = self.clone();

        // 1) Nodes.
        let mut invalid = Vec::new();
        for node in network.nodes_mut() {
            let projected = node.coord(&options.x_key, &options.y_key)
                .and_then(|coord| match projection.project(coord) {
                    Ok(projected) => Some(projected),
                    Err(err) => { log::debug!("[network::reproject] {}: {err:#}", node.id); None }
                })
                .filter(|projected| projected.x.is_finite() && projected.y.is_finite());

            match projected {
                Some(projected) => {
                    node.attrs.insert(options.proj_x_key.clone(), Value::Float(projected.x));
                    node.attrs.insert(options.proj_y_key.clone(), Value::Float(projected.y));
                }
                None => {
                    node.attrs.remove(&options.proj_x_key);
                    node.attrs.remove(&options.proj_y_key);
                    invalid.push(node.id);
                }
            }
        }
        tally.add_n(Skip::MissingAttribute, invalid.len());

        if options.remove_invalid_nodes && !invalid.is_empty() {
            let edges = network.edge_count();
            let removed = network.remove_nodes(invalid);
            log::info!("[network::reproject] removed {removed} node(s) without valid coordinates and {} incident edge(s)",
                edges - network.edge_count());
        }

        // 2) Edges.
        let projected = network.nodes().iter()
            .filter_map(|node| Some((node.id, node.coord(&options.proj_x_key, &options.proj_y_key)?)))
            .collect::<AHashMap<NodeId, Coord<f64>>>();

        let (mut rebuilt, mut synthesized) = (0, 0);
        for edge in network.edges_mut() {
            match edge.line(&options.geometry_key).cloned() {
                Some(line) => match line.try_map_coords(|coord| projection.project(coord)) {
                    Ok(line) => {
                        if let Some(length) = line_length(&line) {
                            edge.attrs.insert(options.length_key.clone(), Value::Float(length));
                        }
                        edge.attrs.insert(options.geometry_key.clone(), Value::Geometry(line));
                        rebuilt += 1;
                    }
                    Err(err) => {
                        log::debug!("[network::reproject] edge {} -> {}: {err:#}", edge.u, edge.v);
                        edge.attrs.remove(&options.geometry_key);
                        edge.attrs.remove(&options.length_key);
                        tally.add(Skip::InvalidGeometry);
                    }
                },
                None if options.add_missing_geometry && !edge.attrs.contains_key(&options.geometry_key) => {
                    match (projected.get(&edge.u), projected.get(&edge.v)) {
                        (Some(&a), Some(&b)) => {
                            let line = Geometry::LineString(LineString::new(vec![a, b]));
                            let length = line_length(&line).unwrap_or_default();
                            edge.attrs.insert(options.length_key.clone(), Value::Float(length));
                            edge.attrs.insert(options.geometry_key.clone(), Value::Geometry(line));
                            synthesized += 1;
                        }
                        _ => tally.add(Skip::MissingAttribute),
                    }
                }
                None => {}
            }
        }

        network.set_crs(Some(target_frame.to_string()));

        tally.report();
        log::info!("[network::reproject] {} node(s), {rebuilt} edge geometries projected, {synthesized} synthesized, crs={target_frame}",
            network.node_count());

        network
    }
}
