use geo::{LineString, Point};
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, warn};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::geom::{canon, polyline_length, project_onto, split_at};
use crate::network::{EdgeRecord, NodeRecord, TileId};
use crate::route::error::RouteError;
use crate::route::graph::{EdgeAttrs, Role, RouteGraph, VertexId};
use crate::route::scan::EdgeIndex;

/// Pedestrian pace backing the route duration estimate.
pub const DEFAULT_SPEED_MPS: f64 = 1.4;

/// Per-router tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouterConfig {
    /// Speed the duration estimate divides distance by, in m/s.
    pub speed_mps: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            speed_mps: DEFAULT_SPEED_MPS,
        }
    }
}

/// One row of the route-specific edge table: geometry and pollution
/// attributes addressed by edge id, covering the loaded records plus the
/// synthetic rows minted while splitting.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRow {
    pub length_m: f64,
    pub aqi: f64,
    pub normalized_aqi: f64,
    pub tile: TileId,
    pub geometry: LineString<f64>,
}

/// A traversed edge inside a [`RouteResult`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteEdge {
    pub edge_id: i64,
    pub length_m: f64,
    pub aqi: f64,
    pub normalized_aqi: f64,
    pub geometry: LineString<f64>,
}

/// Aggregate figures over a whole route.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Length-weighted mean exposure along the route.
    pub aqi_avg: f64,
}

/// Ordered edge geometries with their attributes, plus the aggregate
/// summary handed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteResult {
    pub edges: Vec<RouteEdge>,
    pub summary: RouteSummary,
}

impl RouteResult {
    pub(crate) fn from_edges(edges: Vec<RouteEdge>, speed_mps: f64) -> RouteResult {
        let distance_m: f64 = edges.iter().map(|edge| edge.length_m).sum();
        let weighted: f64 = edges.iter().map(|edge| edge.aqi * edge.length_m).sum();

        RouteResult {
            summary: RouteSummary {
                distance_m,
                duration_s: if speed_mps > 0.0 { distance_m / speed_mps } else { 0.0 },
                aqi_avg: if distance_m > 0.0 { weighted / distance_m } else { 0.0 },
            },
            edges,
        }
    }

    /// Ordered identifiers of the traversed edges.
    pub fn edge_ids(&self) -> Vec<i64> {
        self.edges.iter().map(|edge| edge.edge_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Per-query routing arena: graph, edge table and spatial index built from
/// one load of records, mutated only by snapping, and discarded with the
/// query. Nothing is shared across requests.
#[derive(Debug)]
pub struct Router {
    pub(crate) graph: RouteGraph,
    table: IndexMap<i64, EdgeRow>,
    index: EdgeIndex,
    endpoints: FxHashMap<i64, (VertexId, VertexId)>,
    bindings: FxHashMap<Role, VertexId>,
    penalized: FxHashSet<i64>,
    penalty: f64,
    next_edge_id: i64,
    config: RouterConfig,
}

impl Router {
    pub fn new(edges: Vec<EdgeRecord>, nodes: Vec<NodeRecord>) -> Result<Router, RouteError> {
        Router::with_config(edges, nodes, RouterConfig::default())
    }

    pub fn with_config(
        edges: Vec<EdgeRecord>,
        nodes: Vec<NodeRecord>,
        config: RouterConfig,
    ) -> Result<Router, RouteError> {
        if edges.is_empty() || nodes.is_empty() {
            return Err(RouteError::EmptyNetwork {
                edges: edges.len(),
                nodes: nodes.len(),
            });
        }

        let graph = RouteGraph::new(&edges, &nodes);
        let index = EdgeIndex::new(&edges);
        let endpoints = edges
            .iter()
            .map(|edge| {
                (
                    edge.edge_id,
                    (VertexId::Real(edge.from_node), VertexId::Real(edge.to_node)),
                )
            })
            .collect();
        let next_edge_id = edges.iter().map(|edge| edge.edge_id).max().unwrap_or(0) + 1;

        debug!(
            "Router over {} edges, {} nodes ({:?})",
            edges.len(),
            nodes.len(),
            graph
        );

        Ok(Router {
            graph,
            table: edges
                .into_iter()
                .map(|edge| {
                    (
                        edge.edge_id,
                        EdgeRow {
                            length_m: edge.length_m,
                            aqi: edge.aqi,
                            normalized_aqi: edge.normalized_aqi,
                            tile: edge.tile,
                            geometry: edge.geometry,
                        },
                    )
                })
                .collect(),
            index,
            endpoints,
            bindings: FxHashMap::default(),
            penalized: FxHashSet::default(),
            penalty: 0.0,
            next_edge_id,
            config,
        })
    }

    /// Binds `role` to a vertex at the network position closest to `point`,
    /// splitting the nearest edge when no vertex exists there yet.
    pub fn snap(&mut self, point: Point<f64>, role: Role) -> Result<VertexId, RouteError> {
        let edge_id = self
            .index
            .nearest(point)
            .ok_or(RouteError::SnapFailed(point))?;
        let row = self
            .table
            .get(&edge_id)
            .ok_or(RouteError::SnapFailed(point))?;
        let geometry = row.geometry.clone();
        let (aqi, normalized_aqi, tile) = (row.aqi, row.normalized_aqi, row.tile);

        let snapped = project_onto(&geometry, point);

        // A prior snap, or a dataset node, may already occupy this exact
        // location; rebinding it keeps the vertex set duplicate-free.
        if let Some(existing) = self.graph.vertex_at(canon(snapped)) {
            debug!("Snap of {role} reuses {existing} at {:?}", snapped.x_y());
            self.bindings.insert(role, existing);
            return Ok(existing);
        }

        let (head, tail) = split_at(&geometry, snapped);
        let (from, to) = *self
            .endpoints
            .get(&edge_id)
            .ok_or(RouteError::SnapFailed(point))?;

        let vertex = VertexId::Injected(role);
        self.graph.add_vertex(vertex, snapped, tile);

        // The split halves below replace the original edge; it is already
        // absent when an earlier split consumed the same underlying edge.
        if self.graph.remove_edge_between(from, to).is_none() {
            debug!("Edge {edge_id} already absent between {from} and {to}");
        }

        let head_id = self.next_edge_id;
        let tail_id = self.next_edge_id + 1;
        self.next_edge_id += 2;

        for (id, endpoint, half) in [(head_id, from, head), (tail_id, to, tail)] {
            let length_m = polyline_length(&half);
            self.graph.add_edge(
                endpoint,
                vertex,
                EdgeAttrs {
                    edge_id: id,
                    length_m,
                    aqi,
                    normalized_aqi,
                    weight: 0.0,
                },
            );
            self.table.insert(
                id,
                EdgeRow {
                    length_m,
                    aqi,
                    normalized_aqi,
                    tile,
                    geometry: half,
                },
            );
        }

        debug!("Split edge {edge_id} into {head_id}/{tail_id} for {role}");
        self.bindings.insert(role, vertex);
        Ok(vertex)
    }

    /// Marks edges to receive `penalty` as their weight on the next
    /// computation — discouraging their reuse without disconnecting them.
    pub fn penalize<I: IntoIterator<Item = i64>>(&mut self, edge_ids: I, penalty: f64) {
        self.penalized.extend(edge_ids);
        self.penalty = penalty;
    }

    /// Computes the weighted shortest path between the bound endpoints.
    pub fn shortest_path(&mut self, balance: f64) -> Result<Vec<VertexId>, RouteError> {
        if !(0.0..=1.0).contains(&balance) {
            return Err(RouteError::InvalidBalance(balance));
        }

        self.graph
            .recompute_weights(balance, &self.penalized, self.penalty);
        let pruned = self.graph.prune_isolated();
        if pruned > 0 {
            debug!("Pruned {pruned} isolated vertices");
        }

        let origin = self.bound(Role::Origin)?;
        let destination = self.bound(Role::Destination)?;

        debug!("Routing {origin} -> {destination}");
        let (_, path) = petgraph::algo::astar(
            &self.graph.graph,
            origin,
            |finish| finish == destination,
            |e| e.weight().weight,
            |_| 0.0,
        )
        .ok_or(RouteError::NoRouteFound {
            origin,
            destination,
        })?;

        Ok(path)
    }

    /// Resolves an ordered vertex path into its traversed edge rows. Pairs
    /// without a matching row are skipped with a warning rather than
    /// failing the whole route.
    pub fn extract(&self, path: &[VertexId]) -> Vec<RouteEdge> {
        path.iter()
            .tuple_windows()
            .filter_map(|(a, b)| {
                let Some(attrs) = self.graph.edge_between(*a, *b) else {
                    warn!("No edge between {a} and {b} on the computed path");
                    return None;
                };

                match self.table.get(&attrs.edge_id) {
                    Some(row) => Some(RouteEdge {
                        edge_id: attrs.edge_id,
                        length_m: row.length_m,
                        aqi: row.aqi,
                        normalized_aqi: row.normalized_aqi,
                        geometry: row.geometry.clone(),
                    }),
                    None => {
                        warn!("Edge {} has no row in the route table", attrs.edge_id);
                        None
                    }
                }
            })
            .collect()
    }

    /// Computes a point-to-point route blending distance against pollution
    /// by `balance`. Strict: any failure aborts this query.
    pub fn route(
        &mut self,
        origin: Point<f64>,
        destination: Point<f64>,
        balance: f64,
    ) -> Result<RouteResult, RouteError> {
        self.snap(origin, Role::Origin)?;
        self.snap(destination, Role::Destination)?;

        let path = self.shortest_path(balance)?;
        Ok(RouteResult::from_edges(
            self.extract(&path),
            self.config.speed_mps,
        ))
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn bound(&self, role: Role) -> Result<VertexId, RouteError> {
        let vertex = self
            .bindings
            .get(&role)
            .copied()
            .ok_or(RouteError::MissingVertex(VertexId::Injected(role)))?;

        if !self.graph.contains(&vertex) {
            return Err(RouteError::MissingVertex(vertex));
        }
        Ok(vertex)
    }
}
