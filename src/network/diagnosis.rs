use std::{collections::VecDeque, fmt};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};
use serde::Serialize;

use crate::network::{Network, NodeId};

/// Structural summary of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphInfo {
    pub directed: bool,
    pub nodes: usize,
    pub edges: usize,
    pub isolated: usize,
    pub self_loops: usize,
    pub components: usize,
    pub giant_nodes: usize,
    pub giant_edges: usize,
}

impl fmt::Display for GraphInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "directed: {}", self.directed)?;
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "edges: {}", self.edges)?;
        writeln!(f, "isolated nodes: {}", self.isolated)?;
        writeln!(f, "self-loops: {}", self.self_loops)?;
        writeln!(f, "weakly connected components: {}", self.components)?;
        write!(f, "giant component: {} nodes, {} edges", self.giant_nodes, self.giant_edges)
    }
}

impl Network {
    /// Components of the network with edge direction ignored, in order of
    /// their first node. Node ids within a component are in visit order.
    pub fn weakly_connected_components(&self) -> Vec<Vec<NodeId>> {
        let adjacency = self.adjacency();
        let mut visited = vec![false; self.node_count()];
        let mut components = Vec::new();

        for start in 0..self.node_count() {
            if visited[start] { continue }
            visited[start] = true;

            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(u) = queue.pop_front() {
                component.push(self.nodes()[u].id);
                for &v in &adjacency[u] {
                    if !visited[v] { visited[v] = true; queue.push_back(v) }
                }
            }
            components.push(component);
        }

        components
    }

    /// The largest weakly connected component as a new network. The first of
    /// several equally large components wins.
    pub fn giant_component(&self) -> Network {
        let components = self.weakly_connected_components();
        let Some(giant) = components.iter()
            .enumerate()
            .max_by_key(|&(i, component)| (component.len(), std::cmp::Reverse(i)))
            .map(|(i, _)| i) else { return self.clone() };

        let mut network = self.clone();
        let others = components.into_iter()
            .enumerate()
            .filter(|&(i, _)| i != giant)
            .flat_map(|(_, component)| component);
        network.remove_nodes(others);
        network
    }

    pub fn info(&self) -> GraphInfo {
        let giant = self.giant_component();
        GraphInfo {
            directed: self.is_directed(),
            nodes: self.node_count(),
            edges: self.edge_count(),
            isolated: self.isolates().len(),
            self_loops: self.self_loop_count(),
            components: self.weakly_connected_components().len(),
            giant_nodes: giant.node_count(),
            giant_edges: giant.edge_count(),
        }
    }

    /// Per-edge `{distance, duration, speed}` for edges carrying both numeric
    /// attributes. Speed is null where the duration is not positive.
    pub fn travel_statistics(&self, distance_key: &str, duration_key: &str) -> Result<DataFrame> {
        let (distance, duration): (Vec<f64>, Vec<f64>) = self.edges().iter()
            .filter_map(|edge| Some((edge.weight(distance_key)?, edge.weight(duration_key)?)))
            .unzip();

        let speed = distance.iter().zip(&duration)
            .map(|(&distance, &duration)| (duration > 0.0).then(|| distance / duration))
            .collect::<Vec<_>>();

        log::debug!("[network::diagnosis] travel statistics over {} of {} edge(s)", distance.len(), self.edge_count());

        DataFrame::new(vec![
            Series::new("distance".into(), distance).into(),
            Series::new("duration".into(), duration).into(),
            Series::new("speed".into(), speed).into(),
        ]).context("[network::diagnosis] Failed to build travel statistics frame")
    }
}
