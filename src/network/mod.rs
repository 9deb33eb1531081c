//! Records handed to the engine by the network store, and the narrow
//! contracts the engine expects from its collaborators.
//!
//! Producing and cleaning this data (geometry normalisation, tiling,
//! connectivity pruning, pollution enrichment) happens upstream; the engine
//! only ever consumes it.

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

#[doc(hidden)]
pub mod memory;

#[doc(inline)]
pub use memory::MemoryNetwork;

/// Identifier of one fixed-size grid cell partitioning the covered area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub row: i32,
    pub col: i32,
}

impl TileId {
    pub const fn new(row: i32, col: i32) -> Self {
        TileId { row, col }
    }
}

/// A cleaned, routable edge as supplied by the network store.
///
/// `length_m` is expected to match the true length of `geometry` within
/// floating tolerance; the engine tolerates violations but routes on the
/// declared value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub edge_id: i64,
    pub from_node: i64,
    pub to_node: i64,
    pub length_m: f64,
    /// Air-quality index along the edge.
    pub aqi: f64,
    /// Pollution index rescaled for weighting, `>= 0`.
    pub normalized_aqi: f64,
    pub tile: TileId,
    pub geometry: LineString<f64>,
}

/// A network junction as supplied by the network store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: i64,
    pub tile: TileId,
    pub geometry: Point<f64>,
}

/// Query geometry resolved to tiles by a [`TileIndex`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Region {
    /// Everything within `radius_m` of `center`.
    Circle { center: Point<f64>, radius_m: f64 },
    /// Everything within `radius_m` of the straight line `start`–`end`.
    Corridor {
        start: Point<f64>,
        end: Point<f64>,
        radius_m: f64,
    },
}

impl Region {
    pub fn around(center: Point<f64>, radius_m: f64) -> Self {
        Region::Circle { center, radius_m }
    }

    pub fn between(start: Point<f64>, end: Point<f64>, radius_m: f64) -> Self {
        Region::Corridor { start, end, radius_m }
    }
}

/// Supplier of cleaned edge and node records for a set of tiles.
///
/// Implementations return empty collections, never errors, when no data
/// matches the requested tiles.
pub trait NetworkStore {
    fn load_edges(&self, tiles: &[TileId]) -> Vec<EdgeRecord>;
    fn load_nodes(&self, tiles: &[TileId]) -> Vec<NodeRecord>;
}

/// Resolves query geometry to the tiles it intersects.
pub trait TileIndex {
    fn tiles_intersecting(&self, region: &Region) -> Vec<TileId>;

    /// The tile containing `point`, if the index covers it.
    fn tile_at(&self, point: Point<f64>) -> Option<TileId>;
}
