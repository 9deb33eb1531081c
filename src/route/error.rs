use std::fmt::{self, Display, Formatter};

use geo::Point;

use crate::route::graph::VertexId;

/// Failures of a single point-to-point query. Strict: any of these aborts
/// the query that raised it.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteError {
    /// The store returned no usable records for the requested tiles.
    EmptyNetwork { edges: usize, nodes: usize },
    /// The query point could not be matched to any edge geometry.
    SnapFailed(Point<f64>),
    /// Balance factors blend distance against pollution and must lie in [0, 1].
    InvalidBalance(f64),
    /// An endpoint role was never bound, or its vertex has left the graph.
    MissingVertex(VertexId),
    /// The bound endpoints are not mutually reachable.
    NoRouteFound {
        origin: VertexId,
        destination: VertexId,
    },
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::EmptyNetwork { edges, nodes } => {
                write!(f, "no routable network ({edges} edges, {nodes} nodes)")
            }
            RouteError::SnapFailed(point) => {
                write!(f, "no edge to snap ({}, {}) onto", point.x(), point.y())
            }
            RouteError::InvalidBalance(balance) => {
                write!(f, "balance factor {balance} outside [0, 1]")
            }
            RouteError::MissingVertex(vertex) => {
                write!(f, "vertex {vertex} is not part of the graph")
            }
            RouteError::NoRouteFound {
                origin,
                destination,
            } => {
                write!(f, "no route between {origin} and {destination}")
            }
        }
    }
}

impl std::error::Error for RouteError {}
