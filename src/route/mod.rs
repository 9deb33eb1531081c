//! The routing engine: graph construction, snap-and-split injection of
//! query points, weighted shortest paths and edge extraction.

#[doc(hidden)]
pub mod engine;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod graph;
#[doc(hidden)]
pub mod scan;

#[doc(inline)]
pub use engine::{RouteEdge, RouteResult, RouteSummary, Router, RouterConfig, DEFAULT_SPEED_MPS};
#[doc(inline)]
pub use error::RouteError;
#[doc(inline)]
pub use graph::{EdgeAttrs, Role, RouteGraph, Vertex, VertexId};
#[doc(inline)]
pub use scan::EdgeIndex;
