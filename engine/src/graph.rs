//! # Graph model
//!
//! The connectivity graph is immutable-after-load: node and edge attributes are fixed at
//! construction time, and the only mutation allowed afterwards is the "chaos" removal of a
//! single edge between optimizer calls (see [`Graph::remove_edge`]). A neighbor cache is built
//! once at load time so every optimizer can walk adjacency without touching `petgraph` directly.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::error::Error;

/// A node identifier, as used throughout the public API (source, destination, path entries).
pub type NodeId = u32;

/// Per-node attributes. `processing_delay` is added for every internal hop of a path (the two
/// endpoints are excluded); `node_reliability` is multiplied in likewise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeData {
    /// Processing delay at this node, in milliseconds. Valid range: `[0.5, 2.0]`.
    pub processing_delay: f64,
    /// Reliability of this node. Valid range: `[0.95, 0.999]`.
    pub node_reliability: f64,
}

/// Per-edge attributes. Edges are undirected: `(u, v)` and `(v, u)` refer to the same edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    /// Link capacity, in Mbps. Valid range: `[100, 1000]`.
    pub bandwidth: f64,
    /// Link propagation delay, in milliseconds. Valid range: `[3, 15]`.
    pub link_delay: f64,
    /// Reliability of this link. Valid range: `[0.95, 0.999]`.
    pub link_reliability: f64,
}

impl NodeData {
    fn validate(&self) -> Result<(), Error> {
        if !(0.5..=2.0).contains(&self.processing_delay) {
            return Err(Error::OutOfRange(format!(
                "processing_delay {} out of [0.5, 2.0]",
                self.processing_delay
            )));
        }
        if !(0.95..=0.999).contains(&self.node_reliability) {
            return Err(Error::OutOfRange(format!(
                "node_reliability {} out of [0.95, 0.999]",
                self.node_reliability
            )));
        }
        Ok(())
    }
}

impl EdgeData {
    fn validate(&self) -> Result<(), Error> {
        if !(100.0..=1000.0).contains(&self.bandwidth) {
            return Err(Error::OutOfRange(format!(
                "bandwidth {} out of [100, 1000]",
                self.bandwidth
            )));
        }
        if !(3.0..=15.0).contains(&self.link_delay) {
            return Err(Error::OutOfRange(format!(
                "link_delay {} out of [3, 15]",
                self.link_delay
            )));
        }
        if !(0.95..=0.999).contains(&self.link_reliability) {
            return Err(Error::OutOfRange(format!(
                "link_reliability {} out of [0.95, 0.999]",
                self.link_reliability
            )));
        }
        Ok(())
    }
}

/// The connectivity graph `G = (V, E)`.
///
/// Construct with [`Graph::builder`] or [`Graph::from_csv`]. Node ids need not be contiguous;
/// an internal id table maps the caller-facing [`NodeId`] to the `petgraph` index.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: UnGraph<NodeData, EdgeData>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    index_to_id: HashMap<NodeIndex, NodeId>,
    neighbor_cache: HashMap<NodeId, Vec<NodeId>>,
}

/// Incrementally constructs a [`Graph`], validating every attribute against its documented
/// range before the graph is frozen.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<(NodeId, NodeData)>,
    edges: Vec<(NodeId, NodeId, EdgeData)>,
}

impl GraphBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and its attributes.
    pub fn add_node(mut self, id: NodeId, data: NodeData) -> Self {
        self.nodes.push((id, data));
        self
    }

    /// Register an undirected edge and its attributes.
    pub fn add_edge(mut self, u: NodeId, v: NodeId, data: EdgeData) -> Self {
        self.edges.push((u, v, data));
        self
    }

    /// Validate all attributes and freeze the graph.
    pub fn build(self) -> Result<Graph, Error> {
        let mut inner = UnGraph::new_undirected();
        let mut id_to_index = HashMap::with_capacity(self.nodes.len());
        let mut index_to_id = HashMap::with_capacity(self.nodes.len());

        for (id, data) in &self.nodes {
            data.validate()?;
            let idx = inner.add_node(*data);
            id_to_index.insert(*id, idx);
            index_to_id.insert(idx, *id);
        }

        for (u, v, data) in &self.edges {
            data.validate()?;
            let ui = *id_to_index
                .get(u)
                .ok_or(Error::UnknownNode(*u))?;
            let vi = *id_to_index
                .get(v)
                .ok_or(Error::UnknownNode(*v))?;
            inner.update_edge(ui, vi, *data);
        }

        let mut neighbor_cache = HashMap::with_capacity(id_to_index.len());
        for (&id, &idx) in &id_to_index {
            let mut nbrs: Vec<NodeId> = inner
                .neighbors(idx)
                .map(|n| index_to_id[&n])
                .collect();
            nbrs.sort_unstable();
            nbrs.dedup();
            neighbor_cache.insert(id, nbrs);
        }

        Ok(Graph {
            inner,
            id_to_index,
            index_to_id,
            neighbor_cache,
        })
    }
}

impl Graph {
    /// Start a [`GraphBuilder`].
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Number of nodes `|V|`.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges `|E|`.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether `id` is a node of this graph.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// All node ids, in unspecified order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.id_to_index.keys().copied()
    }

    /// Attributes of node `id`, if it exists.
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        let idx = *self.id_to_index.get(&id)?;
        self.inner.node_weight(idx)
    }

    /// Attributes of the edge `(u, v)` (order-independent), if it exists.
    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<&EdgeData> {
        let ui = *self.id_to_index.get(&u)?;
        let vi = *self.id_to_index.get(&v)?;
        let e = self.inner.find_edge(ui, vi)?;
        self.inner.edge_weight(e)
    }

    /// Cached adjacency list of `id`. Empty if `id` is isolated or unknown.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.neighbor_cache
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over all edges as `(u, v, data)`, each undirected edge once.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &EdgeData)> + '_ {
        self.inner.edge_references().map(move |e| {
            let u = self.index_to_id[&e.source()];
            let v = self.index_to_id[&e.target()];
            (u, v, e.weight())
        })
    }

    /// Whether the graph is connected (every node reachable from every other). Checked once at
    /// load time by callers that require it; not re-checked automatically after chaos removal.
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.inner.node_indices().next() else {
            return true;
        };
        let mut seen = vec![false; self.inner.node_bound()];
        let mut stack = vec![start];
        seen[start.index()] = true;
        let mut count = 1;
        while let Some(n) = stack.pop() {
            for nb in self.inner.neighbors(n) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    count += 1;
                    stack.push(nb);
                }
            }
        }
        count == self.inner.node_count()
    }

    /// Whether `u` and `v` are connected to each other (ignoring every other node's bandwidth).
    pub fn reachable(&self, u: NodeId, v: NodeId) -> bool {
        let (Some(&ui), Some(&vi)) = (self.id_to_index.get(&u), self.id_to_index.get(&v)) else {
            return false;
        };
        let mut seen = vec![false; self.inner.node_bound()];
        let mut stack = vec![ui];
        seen[ui.index()] = true;
        while let Some(n) = stack.pop() {
            if n == vi {
                return true;
            }
            for nb in self.inner.neighbors(n) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    stack.push(nb);
                }
            }
        }
        false
    }

    /// "Chaos" mutation: remove a single edge. Must only be called between optimizer calls
    /// (§5 shared-resource policy); the graph is otherwise treated as read-only for the
    /// duration of any [`crate::optimizers::Optimizer::optimize`] invocation. Returns `true`
    /// if the edge existed and was removed.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        let (Some(&ui), Some(&vi)) = (self.id_to_index.get(&u), self.id_to_index.get(&v)) else {
            return false;
        };
        let Some(e) = self.inner.find_edge(ui, vi) else {
            return false;
        };
        self.inner.remove_edge(e);
        if let Some(nbrs) = self.neighbor_cache.get_mut(&u) {
            nbrs.retain(|&n| n != v);
        }
        if let Some(nbrs) = self.neighbor_cache.get_mut(&v) {
            nbrs.retain(|&n| n != u);
        }
        true
    }
}

/// A single `NodeData` CSV record, mirroring the legacy header `node_id, processing_delay,
/// reliability`.
#[derive(Debug, serde::Deserialize)]
struct NodeRecord {
    node_id: u32,
    processing_delay: String,
    reliability: String,
}

/// A single `EdgeData` CSV record, mirroring the legacy header `u, v, bandwidth, delay,
/// reliability`.
#[derive(Debug, serde::Deserialize)]
struct EdgeRecord {
    u: u32,
    v: u32,
    bandwidth: String,
    delay: String,
    reliability: String,
}

/// Parses a decimal field that may use either `.` or `,` as the separator (the legacy deck
/// accepts both on parse but always emits `.`).
fn parse_decimal(field: &str) -> Result<f64, Error> {
    field
        .replace(',', ".")
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::OutOfRange(format!("not a decimal: {field:?}")))
}

impl Graph {
    /// Load a graph from the legacy `NodeData`/`EdgeData` CSV deck (§6 persisted formats).
    pub fn from_csv(
        node_csv: impl std::io::Read,
        edge_csv: impl std::io::Read,
    ) -> Result<Self, Error> {
        let mut builder = Graph::builder();

        let mut node_rdr = csv::Reader::from_reader(node_csv);
        for rec in node_rdr.deserialize::<NodeRecord>() {
            let rec = rec?;
            builder = builder.add_node(
                rec.node_id,
                NodeData {
                    processing_delay: parse_decimal(&rec.processing_delay)?,
                    node_reliability: parse_decimal(&rec.reliability)?,
                },
            );
        }

        let mut edge_rdr = csv::Reader::from_reader(edge_csv);
        for rec in edge_rdr.deserialize::<EdgeRecord>() {
            let rec = rec?;
            builder = builder.add_edge(
                rec.u,
                rec.v,
                EdgeData {
                    bandwidth: parse_decimal(&rec.bandwidth)?,
                    link_delay: parse_decimal(&rec.delay)?,
                    link_reliability: parse_decimal(&rec.reliability)?,
                },
            );
        }

        builder.build()
    }
}
