//! Grid arithmetic for choosing rotated round-trip targets.

use rustc_hash::FxHashSet;

use crate::network::TileId;

const NEIGHBOURS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Tiles on the rim of the reachable area: at least one of the four
/// grid-adjacent neighbours is missing from `reachable`.
pub fn outer_tiles(reachable: &FxHashSet<TileId>) -> Vec<TileId> {
    let mut outer: Vec<TileId> = reachable
        .iter()
        .copied()
        .filter(|tile| {
            NEIGHBOURS
                .iter()
                .any(|(dr, dc)| !reachable.contains(&TileId::new(tile.row + dr, tile.col + dc)))
        })
        .collect();

    outer.sort_unstable();
    outer
}

/// Rotates the integer grid offset `(dr, dc)` by `degrees`, rounding to the
/// nearest cell.
pub fn rotate_offset(dr: i32, dc: i32, degrees: f64) -> (i32, i32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (r, c) = (dr as f64, dc as f64);

    (
        (r * cos - c * sin).round() as i32,
        (r * sin + c * cos).round() as i32,
    )
}

/// Snaps `cell` to the closest tile present in `outer`, searching expanding
/// Manhattan rings up to `max_radius`. The per-ring `(row, col)` minimum
/// keeps the result deterministic. `None` when nothing lies within reach —
/// the caller drops that rotation slot rather than failing.
pub fn snap_to_outer(cell: TileId, outer: &FxHashSet<TileId>, max_radius: i32) -> Option<TileId> {
    if outer.contains(&cell) {
        return Some(cell);
    }

    for radius in 1..=max_radius {
        let hit = ring(cell, radius)
            .into_iter()
            .filter(|candidate| outer.contains(candidate))
            .min();
        if hit.is_some() {
            return hit;
        }
    }

    None
}

/// Cells at exactly `radius` Manhattan distance from `center`.
fn ring(center: TileId, radius: i32) -> Vec<TileId> {
    let mut cells = Vec::with_capacity(4 * radius as usize);
    for dr in -radius..=radius {
        let rem = radius - dr.abs();
        cells.push(TileId::new(center.row + dr, center.col + rem));
        if rem != 0 {
            cells.push(TileId::new(center.row + dr, center.col - rem));
        }
    }
    cells
}
