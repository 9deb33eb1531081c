//! Square-grid in-memory network: the reference implementation of the
//! store and index contracts, backing the test suite and available to
//! embedders that already hold their records in memory.

use geo::Point;
use rustc_hash::FxHashSet;

use crate::geom::segment_distance;
use crate::network::{EdgeRecord, NetworkStore, NodeRecord, Region, TileId, TileIndex};

/// An in-memory record set tiled on a square grid of `tile_size_m` cells.
///
/// Tile `(row, col)` covers `x ∈ [col·s, (col+1)·s)`, `y ∈ [row·s, (row+1)·s)`.
pub struct MemoryNetwork {
    tile_size_m: f64,
    edges: Vec<EdgeRecord>,
    nodes: Vec<NodeRecord>,
}

impl MemoryNetwork {
    pub fn new(tile_size_m: f64, edges: Vec<EdgeRecord>, nodes: Vec<NodeRecord>) -> Self {
        MemoryNetwork {
            tile_size_m,
            edges,
            nodes,
        }
    }

    /// The grid cell containing `point`.
    pub fn tile_of(&self, point: Point<f64>) -> TileId {
        TileId::new(
            (point.y() / self.tile_size_m).floor() as i32,
            (point.x() / self.tile_size_m).floor() as i32,
        )
    }

    pub fn all_edges(&self) -> Vec<EdgeRecord> {
        self.edges.clone()
    }

    pub fn all_nodes(&self) -> Vec<NodeRecord> {
        self.nodes.clone()
    }

    /// Euclidean distance from `point` to the closed rectangle of `tile`.
    fn tile_distance(&self, tile: TileId, point: Point<f64>) -> f64 {
        let s = self.tile_size_m;
        let nearest_x = point.x().clamp(tile.col as f64 * s, (tile.col + 1) as f64 * s);
        let nearest_y = point.y().clamp(tile.row as f64 * s, (tile.row + 1) as f64 * s);
        ((point.x() - nearest_x).powi(2) + (point.y() - nearest_y).powi(2)).sqrt()
    }

    fn cells_in_bbox(&self, min: Point<f64>, max: Point<f64>) -> impl Iterator<Item = TileId> {
        let s = self.tile_size_m;
        let (col_min, col_max) = ((min.x() / s).floor() as i32, (max.x() / s).floor() as i32);
        let (row_min, row_max) = ((min.y() / s).floor() as i32, (max.y() / s).floor() as i32);

        (row_min..=row_max)
            .flat_map(move |row| (col_min..=col_max).map(move |col| TileId::new(row, col)))
    }
}

impl NetworkStore for MemoryNetwork {
    fn load_edges(&self, tiles: &[TileId]) -> Vec<EdgeRecord> {
        let wanted: FxHashSet<TileId> = tiles.iter().copied().collect();
        self.edges
            .iter()
            .filter(|edge| wanted.contains(&edge.tile))
            .cloned()
            .collect()
    }

    fn load_nodes(&self, tiles: &[TileId]) -> Vec<NodeRecord> {
        let wanted: FxHashSet<TileId> = tiles.iter().copied().collect();
        self.nodes
            .iter()
            .filter(|node| wanted.contains(&node.tile))
            .cloned()
            .collect()
    }
}

impl TileIndex for MemoryNetwork {
    fn tiles_intersecting(&self, region: &Region) -> Vec<TileId> {
        let mut tiles: Vec<TileId> = match *region {
            Region::Circle { center, radius_m } => {
                let offset = Point::new(radius_m, radius_m);
                self.cells_in_bbox(center - offset, center + offset)
                    .filter(|tile| self.tile_distance(*tile, center) <= radius_m)
                    .collect()
            }
            Region::Corridor {
                start,
                end,
                radius_m,
            } => {
                let offset = Point::new(radius_m, radius_m);
                let min = Point::new(start.x().min(end.x()), start.y().min(end.y())) - offset;
                let max = Point::new(start.x().max(end.x()), start.y().max(end.y())) + offset;

                // Conservative: a cell passes if its centre is within the
                // corridor radius plus the cell's half-diagonal, which may
                // include a sliver of extra tiles but never misses one.
                let slack = self.tile_size_m * std::f64::consts::FRAC_1_SQRT_2;
                self.cells_in_bbox(min, max)
                    .filter(|tile| {
                        let s = self.tile_size_m;
                        let centre = Point::new(
                            (tile.col as f64 + 0.5) * s,
                            (tile.row as f64 + 0.5) * s,
                        );
                        segment_distance(start, end, centre) <= radius_m + slack
                    })
                    .collect()
            }
        };

        tiles.sort_unstable();
        tiles
    }

    fn tile_at(&self, point: Point<f64>) -> Option<TileId> {
        Some(self.tile_of(point))
    }
}
