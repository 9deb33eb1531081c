use std::fmt::{self, Debug, Display, Formatter};

use geo::Point;
use log::debug;
use petgraph::prelude::UnGraphMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::geom::{canon, CanonKey};
use crate::network::{EdgeRecord, NodeRecord, TileId};

/// Role of a query point injected into the graph by snapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Origin,
    Destination,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Role::Origin => write!(f, "origin"),
            Role::Destination => write!(f, "destination"),
        }
    }
}

/// Vertex key: a node from the source dataset, or a query point injected by
/// snapping. Injected points live outside the `Real` namespace, so a query
/// label can never collide with a dataset node identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VertexId {
    Real(i64),
    Injected(Role),
}

impl Display for VertexId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VertexId::Real(id) => write!(f, "node {id}"),
            VertexId::Injected(role) => write!(f, "{role}"),
        }
    }
}

/// Attributes carried by every graph edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Back-reference into the route edge table, synthetic ids included.
    pub edge_id: i64,
    pub length_m: f64,
    pub aqi: f64,
    pub normalized_aqi: f64,
    /// Blend weight, recomputed before every query.
    pub weight: f64,
}

/// A graph vertex with its position and originating tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Point<f64>,
    pub tile: TileId,
}

pub type GraphStructure = UnGraphMap<VertexId, EdgeAttrs>;

/// Keeps an all-zero-pollution graph distinguishable from an all-zero-weight
/// one when routing purely on pollution.
const ZERO_BALANCE_EPSILON: f64 = 0.001;

/// The per-query routing graph: vertex and edge storage with attributes,
/// built once from the loaded records and mutated only by snapping.
pub struct RouteGraph {
    pub(crate) graph: GraphStructure,
    pub(crate) hash: FxHashMap<VertexId, Vertex>,
    pub(crate) by_position: FxHashMap<CanonKey, VertexId>,
}

impl Debug for RouteGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph with {} vertices, {} edges",
            self.hash.len(),
            self.graph.edge_count()
        )
    }
}

impl RouteGraph {
    /// Builds the graph from the loaded records. Edges whose endpoints are
    /// not both present in the node set are dropped, never added.
    pub fn new(edges: &[EdgeRecord], nodes: &[NodeRecord]) -> RouteGraph {
        let mut built = RouteGraph {
            graph: GraphStructure::new(),
            hash: FxHashMap::default(),
            by_position: FxHashMap::default(),
        };

        for node in nodes {
            built.add_vertex(VertexId::Real(node.node_id), node.geometry, node.tile);
        }

        let mut dropped = 0usize;
        for edge in edges {
            let (a, b) = (VertexId::Real(edge.from_node), VertexId::Real(edge.to_node));
            if !built.hash.contains_key(&a) || !built.hash.contains_key(&b) {
                dropped += 1;
                continue;
            }

            let attrs = EdgeAttrs {
                edge_id: edge.edge_id,
                length_m: edge.length_m,
                aqi: edge.aqi,
                normalized_aqi: edge.normalized_aqi,
                weight: 0.0,
            };
            if let Some(previous) = built.graph.add_edge(a, b, attrs) {
                debug!("Parallel edge {} replaced by {}", previous.edge_id, edge.edge_id);
            }
        }

        if dropped > 0 {
            debug!("Dropped {dropped} edges with endpoints outside the node set");
        }

        built
    }

    pub fn add_vertex(&mut self, id: VertexId, position: Point<f64>, tile: TileId) {
        self.graph.add_node(id);
        self.hash.insert(id, Vertex { id, position, tile });
        self.by_position.insert(canon(position), id);
    }

    /// The vertex already occupying a canonical position, if any.
    pub fn vertex_at(&self, key: CanonKey) -> Option<VertexId> {
        self.by_position.get(&key).copied()
    }

    pub fn contains(&self, id: &VertexId) -> bool {
        self.hash.contains_key(id)
    }

    pub fn position(&self, id: &VertexId) -> Option<Point<f64>> {
        self.hash.get(id).map(|vertex| vertex.position)
    }

    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<&EdgeAttrs> {
        self.graph.edge_weight(a, b)
    }

    pub fn add_edge(&mut self, a: VertexId, b: VertexId, attrs: EdgeAttrs) {
        self.graph.add_edge(a, b, attrs);
    }

    /// Removes the edge between two endpoints. Returns `None`, rather than
    /// failing, when no such edge exists: repeated snapping legitimately
    /// references edges a prior split already removed.
    pub fn remove_edge_between(&mut self, a: VertexId, b: VertexId) -> Option<EdgeAttrs> {
        self.graph.remove_edge(a, b)
    }

    pub fn vertex_count(&self) -> usize {
        self.hash.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn degree(&self, id: VertexId) -> usize {
        self.graph.neighbors(id).count()
    }

    /// Recomputes every edge's blend weight:
    /// `w = b·len + (1 − b)·len·(aqi_n + ε)`, with `ε` only in play for pure
    /// pollution routing. Edges in `penalized` take `penalty` verbatim.
    pub fn recompute_weights(&mut self, balance: f64, penalized: &FxHashSet<i64>, penalty: f64) {
        let epsilon = if balance == 0.0 { ZERO_BALANCE_EPSILON } else { 0.0 };

        for (_, _, attrs) in self.graph.all_edges_mut() {
            attrs.weight = if penalized.contains(&attrs.edge_id) {
                penalty
            } else {
                balance * attrs.length_m
                    + (1.0 - balance) * attrs.length_m * (attrs.normalized_aqi + epsilon)
            };
        }
    }

    /// Drops vertices that no longer touch any edge, returning how many
    /// were removed. Splitting leaves these behind over time.
    pub fn prune_isolated(&mut self) -> usize {
        let isolated: Vec<VertexId> = self
            .graph
            .nodes()
            .filter(|id| self.degree(*id) == 0)
            .collect();

        for id in &isolated {
            self.graph.remove_node(*id);
            if let Some(vertex) = self.hash.remove(id) {
                self.by_position.remove(&canon(vertex.position));
            }
        }

        isolated.len()
    }
}
