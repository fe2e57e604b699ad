use std::fmt;

use ahash::{AHashMap, AHashSet};
use geo::{Coord, Geometry};

use crate::common::{Attrs, Value};

/// Stable identity of a network node (e.g. an OSM node id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The shape of a `Network`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphKind {
    /// Directed; parallel edges between the same ordered pair are told apart by key.
    MultiDiGraph,
    /// Undirected; at most one edge per unordered pair.
    Graph,
}

impl GraphKind {
    #[inline] pub fn is_directed(self) -> bool { matches!(self, GraphKind::MultiDiGraph) }

    #[inline] pub fn is_multigraph(self) -> bool { matches!(self, GraphKind::MultiDiGraph) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub attrs: Attrs,
}

impl Node {
    #[inline] pub fn get(&self, key: &str) -> Option<&Value> { self.attrs.get(key) }

    /// Finite numeric coordinate read from the `x_key`/`y_key` attributes.
    pub fn coord(&self, x_key: &str, y_key: &str) -> Option<Coord<f64>> {
        let x = self.attrs.get(x_key)?.as_f64()?;
        let y = self.attrs.get(y_key)?.as_f64()?;
        (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub u: NodeId,
    pub v: NodeId,
    /// Disambiguates parallel edges between the same `(u, v)`.
    pub key: u32,
    pub attrs: Attrs,
}

impl Edge {
    #[inline] pub fn get(&self, key: &str) -> Option<&Value> { self.attrs.get(key) }

    #[inline] pub fn is_self_loop(&self) -> bool { self.u == self.v }

    /// Endpoints as an unordered pair `(min, max)`.
    #[inline]
    pub fn pair(&self) -> (NodeId, NodeId) {
        if self.u <= self.v { (self.u, self.v) } else { (self.v, self.u) }
    }

    /// Numeric weight under `key`, if present and numeric.
    #[inline]
    pub fn weight(&self, key: &str) -> Option<f64> {
        self.attrs.get(key).and_then(Value::as_f64)
    }

    /// The line geometry stored under `key`, if it is a LineString or MultiLineString.
    pub fn line(&self, key: &str) -> Option<&Geometry<f64>> {
        self.attrs.get(key)
            .and_then(Value::as_geometry)
            .filter(|geometry| matches!(geometry, Geometry::LineString(_) | Geometry::MultiLineString(_)))
    }
}

/// A road network: nodes and edges with open attribute maps.
///
/// Nodes and edges keep insertion order. Transformations borrow a network and
/// return a new one; the input is never modified.
#[derive(Debug, Clone)]
pub struct Network {
    kind: GraphKind,
    crs: Option<String>,
    nodes: Vec<Node>,
    index: AHashMap<NodeId, usize>,
    edges: Vec<Edge>,
    pairs: AHashMap<(NodeId, NodeId), Vec<usize>>,
}

impl Network {
    /// Construct an empty network of the given kind.
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            crs: None,
            nodes: Vec::new(),
            index: AHashMap::new(),
            edges: Vec::new(),
            pairs: AHashMap::new(),
        }
    }

    /// Builder-style frame metadata.
    pub fn with_crs(mut self, crs: Option<String>) -> Self { self.crs = crs; self }

    /// Get the kind of graph.
    #[inline] pub fn kind(&self) -> GraphKind { self.kind }

    /// Check if edge direction is significant.
    #[inline] pub fn is_directed(&self) -> bool { self.kind.is_directed() }

    /// Get the coordinate reference system, if known.
    #[inline] pub fn crs(&self) -> Option<&str> { self.crs.as_deref() }

    /// Set the coordinate reference system.
    #[inline] pub fn set_crs(&mut self, crs: Option<String>) { self.crs = crs }

    /// Get the number of nodes.
    #[inline] pub fn node_count(&self) -> usize { self.nodes.len() }

    /// Get the number of edges.
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Check if the network has no nodes.
    #[inline] pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Get all nodes in insertion order.
    #[inline] pub fn nodes(&self) -> &[Node] { &self.nodes }

    /// Get all edges in insertion order.
    #[inline] pub fn edges(&self) -> &[Edge] { &self.edges }

    #[inline] pub(crate) fn nodes_mut(&mut self) -> &mut [Node] { &mut self.nodes }

    #[inline] pub(crate) fn edges_mut(&mut self) -> &mut [Edge] { &mut self.edges }

    /// Check if a node with the given id exists.
    #[inline] pub fn contains_node(&self, id: NodeId) -> bool { self.index.contains_key(&id) }

    /// Position of `id` in `nodes()`.
    #[inline]
    pub(crate) fn position(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Get a node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.position(id).map(|i| &self.nodes[i])
    }

    /// Key under which parallel edges between `u` and `v` are grouped.
    #[inline]
    fn pair_key(&self, u: NodeId, v: NodeId) -> (NodeId, NodeId) {
        if self.kind.is_directed() || u <= v { (u, v) } else { (v, u) }
    }

    /// Edges connecting `u` to `v` (either direction unless the network is directed).
    pub fn edges_between(&self, u: NodeId, v: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.pairs.get(&self.pair_key(u, v))
            .into_iter()
            .flatten()
            .map(move |&slot| &self.edges[slot])
    }

    /// Add a node, or merge `attrs` into the existing node with the same id.
    pub fn add_node(&mut self, id: NodeId, attrs: Attrs) {
        match self.position(id) {
            Some(i) => self.nodes[i].attrs.extend(attrs),
            None => {
                self.index.insert(id, self.nodes.len());
                self.nodes.push(Node { id, attrs });
            }
        }
    }

    fn ensure_node(&mut self, id: NodeId) {
        if !self.contains_node(id) { self.add_node(id, Attrs::new()) }
    }

    fn push_edge(&mut self, u: NodeId, v: NodeId, key: u32, attrs: Attrs) -> u32 {
        let slot = self.edges.len();
        let pair = self.pair_key(u, v);
        self.edges.push(Edge { u, v, key, attrs });
        self.pairs.entry(pair).or_default().push(slot);
        key
    }

    /// Add an edge and return its key. Missing endpoints are created.
    ///
    /// In a `MultiDiGraph` the edge gets the lowest key unused between `u` and `v`;
    /// in a `Graph` an existing edge between the pair has `attrs` merged into it.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, attrs: Attrs) -> u32 {
        self.ensure_node(u);
        self.ensure_node(v);

        let used = self.edges_between(u, v).map(|edge| edge.key).collect::<AHashSet<_>>();
        match self.kind {
            GraphKind::Graph => match self.pairs.get(&self.pair_key(u, v)).and_then(|slots| slots.first()) {
                Some(&slot) => {
                    let edge = &mut self.edges[slot];
                    edge.attrs.extend(attrs);
                    edge.key
                }
                None => self.push_edge(u, v, 0, attrs),
            },
            GraphKind::MultiDiGraph => {
                let mut key = 0;
                while used.contains(&key) { key += 1 }
                self.push_edge(u, v, key, attrs)
            }
        }
    }

    /// Add an edge under an explicit key, merging `attrs` into an existing `(u, v, key)` edge.
    /// Keys are ignored in a `Graph`.
    pub fn add_edge_with_key(&mut self, u: NodeId, v: NodeId, key: u32, attrs: Attrs) -> u32 {
        if self.kind == GraphKind::Graph { return self.add_edge(u, v, attrs) }

        self.ensure_node(u);
        self.ensure_node(v);

        let existing = self.pairs.get(&self.pair_key(u, v))
            .and_then(|slots| slots.iter().copied().find(|&slot| self.edges[slot].key == key));
        match existing {
            Some(slot) => { self.edges[slot].attrs.extend(attrs); key }
            None => self.push_edge(u, v, key, attrs),
        }
    }

    /// Number of edge endpoints at each node; a self-loop counts twice.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for edge in &self.edges {
            for id in [edge.u, edge.v] {
                if let Some(i) = self.position(id) { degrees[i] += 1 }
            }
        }
        degrees
    }

    /// Get the degree of a single node.
    #[inline]
    pub fn degree(&self, id: NodeId) -> Option<usize> {
        self.position(id).map(|i| self.degrees()[i])
    }

    /// Nodes without any incident edge, in node order.
    pub fn isolates(&self) -> Vec<NodeId> {
        self.nodes.iter().zip(self.degrees())
            .filter(|&(_, degree)| degree == 0)
            .map(|(node, _)| node.id)
            .collect()
    }

    /// Get the number of edges joining a node to itself.
    #[inline]
    pub fn self_loop_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.is_self_loop()).count()
    }

    /// Undirected neighbor lists by node position (parallel edges repeat neighbors).
    pub(crate) fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            if let (Some(u), Some(v)) = (self.position(edge.u), self.position(edge.v)) {
                adjacency[u].push(v);
                if u != v { adjacency[v].push(u) }
            }
        }
        adjacency
    }

    /// Remove nodes and their incident edges. Returns the number of nodes removed.
    pub fn remove_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) -> usize {
        let doomed = ids.into_iter()
            .filter(|id| self.contains_node(*id))
            .collect::<AHashSet<_>>();
        if doomed.is_empty() { return 0 }

        self.nodes.retain(|node| !doomed.contains(&node.id));
        self.edges.retain(|edge| !doomed.contains(&edge.u) && !doomed.contains(&edge.v));
        self.reindex();

        doomed.len()
    }

    /// Keep only the edges for which `keep` returns true. Returns the number removed.
    pub fn retain_edges(&mut self, keep: impl FnMut(&Edge) -> bool) -> usize {
        let before = self.edges.len();
        self.edges.retain(keep);
        let removed = before - self.edges.len();
        if removed > 0 { self.reindex() }
        removed
    }

    /// Rebuild the id and pair indices after a bulk removal.
    fn reindex(&mut self) {
        self.index = self.nodes.iter().enumerate()
            .map(|(i, node)| (node.id, i))
            .collect();

        let mut pairs = AHashMap::<(NodeId, NodeId), Vec<usize>>::new();
        for (slot, edge) in self.edges.iter().enumerate() {
            pairs.entry(self.pair_key(edge.u, edge.v)).or_default().push(slot);
        }
        self.pairs = pairs;
    }
}
