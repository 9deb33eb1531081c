use std::cell::Cell;

use geo::{line_string, point, Point};
use rustc_hash::FxHashSet;

use crate::network::{EdgeRecord, MemoryNetwork, NodeRecord, Region, TileId, TileIndex};
use crate::trip::rotation::{outer_tiles, rotate_offset, snap_to_outer};
use crate::trip::{RoundTripPlanner, TripConfig, TripError};

/// An `n × n` lattice of junctions `spacing` metres apart, edges between
/// grid neighbours, pollution varying deterministically across the area.
fn grid(n: i32, spacing: f64, tile_size: f64) -> MemoryNetwork {
    let tile_of = |x: f64, y: f64| TileId::new((y / tile_size).floor() as i32, (x / tile_size).floor() as i32);
    let node_id = |i: i32, j: i32| (j * n + i + 1) as i64;
    let aqi_of = |i: i32, j: i32| ((i * 7 + j * 13) % 50) as f64 + 10.0;

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut next_edge = 1i64;

    for j in 0..n {
        for i in 0..n {
            let (x, y) = (i as f64 * spacing, j as f64 * spacing);
            nodes.push(NodeRecord {
                node_id: node_id(i, j),
                tile: tile_of(x, y),
                geometry: point! { x: x, y: y },
            });

            for (di, dj) in [(1, 0), (0, 1)] {
                let (ni, nj) = (i + di, j + dj);
                if ni >= n || nj >= n {
                    continue;
                }
                let (nx, ny) = (ni as f64 * spacing, nj as f64 * spacing);
                let aqi = aqi_of(i, j);

                edges.push(EdgeRecord {
                    edge_id: next_edge,
                    from_node: node_id(i, j),
                    to_node: node_id(ni, nj),
                    length_m: spacing,
                    aqi,
                    normalized_aqi: aqi / 100.0,
                    tile: tile_of(x, y),
                    geometry: line_string![(x: x, y: y), (x: nx, y: ny)],
                });
                next_edge += 1;
            }
        }
    }

    MemoryNetwork::new(tile_size, edges, nodes)
}

fn origin() -> Point<f64> {
    point! { x: 500.0, y: 500.0 }
}

#[test_log::test]
fn round_trips_yield_sequentially_labeled_loops() {
    let network = grid(21, 50.0, 100.0);
    let planner = RoundTripPlanner::new(&network, &network, TripConfig::default());

    let trips: Vec<_> = planner
        .round_trips(origin(), 1_200.0)
        .expect("Could not plan round trip")
        .collect();

    assert!(!trips.is_empty(), "Expected at least one loop");
    assert!(trips.len() <= 3);

    for (position, trip) in trips.iter().enumerate() {
        let trip = trip.as_ref().expect("Loop result");
        assert_eq!(trip.label, format!("loop{}", position + 1));
        assert!(!trip.route.edges.is_empty());
        assert!(trip.route.summary.distance_m > 0.0);
        assert!(trip.route.summary.aqi_avg > 0.0);
    }
}

#[test]
fn tiny_target_distance_is_fatal() {
    let network = grid(21, 50.0, 100.0);
    let planner = RoundTripPlanner::new(&network, &network, TripConfig::default());

    let err = planner
        .round_trips(origin(), 100.0)
        .err()
        .expect("A 100 m round trip cannot reach any tile");

    assert_eq!(err, TripError::DistanceTooSmall { target_m: 100.0 });
}

/// Blanks the tile resolution of return-leg corridors: the first one when
/// `limit` is 1, or every one when `limit` is `usize::MAX`. Forward legs
/// (corridors starting at the origin) pass through untouched.
struct FailingReturns<'a> {
    inner: &'a MemoryNetwork,
    origin: Point<f64>,
    failures_left: Cell<usize>,
}

impl TileIndex for FailingReturns<'_> {
    fn tiles_intersecting(&self, region: &Region) -> Vec<TileId> {
        if let Region::Corridor { start, .. } = region {
            if *start != self.origin && self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Vec::new();
            }
        }
        self.inner.tiles_intersecting(region)
    }

    fn tile_at(&self, point: Point<f64>) -> Option<TileId> {
        self.inner.tile_at(point)
    }
}

#[test_log::test]
fn a_failed_return_leg_never_leaves_a_label_gap() {
    let network = grid(21, 50.0, 100.0);

    let baseline: Vec<_> = RoundTripPlanner::new(&network, &network, TripConfig::default())
        .round_trips(origin(), 1_200.0)
        .expect("Could not plan baseline")
        .collect();
    let produced = baseline.len();
    assert!(produced >= 2, "Fixture must support several loops, got {produced}");

    let flaky = FailingReturns {
        inner: &network,
        origin: origin(),
        failures_left: Cell::new(1),
    };
    let trips: Vec<_> = RoundTripPlanner::new(&network, &flaky, TripConfig::default())
        .round_trips(origin(), 1_200.0)
        .expect("Could not plan with one poisoned return leg")
        .collect();

    assert_eq!(trips.len(), produced - 1, "One candidate drops, the rest survive");
    for (position, trip) in trips.iter().enumerate() {
        let trip = trip.as_ref().expect("Surviving loop");
        assert_eq!(
            trip.label,
            format!("loop{}", position + 1),
            "Labels follow completion order with no gap"
        );
    }
}

#[test]
fn exhausting_every_return_leg_is_fatal() {
    let network = grid(21, 50.0, 100.0);
    let flaky = FailingReturns {
        inner: &network,
        origin: origin(),
        failures_left: Cell::new(usize::MAX),
    };

    let trips: Vec<_> = RoundTripPlanner::new(&network, &flaky, TripConfig::default())
        .round_trips(origin(), 1_200.0)
        .expect("Forward legs still succeed")
        .collect();

    assert_eq!(trips, vec![Err(TripError::Exhausted)]);
}

#[test]
fn outer_tiles_are_the_rim() {
    let block: FxHashSet<TileId> = (0..3)
        .flat_map(|row| (0..3).map(move |col| TileId::new(row, col)))
        .collect();

    let outer = outer_tiles(&block);

    assert_eq!(outer.len(), 8, "All but the centre tile touch the outside");
    assert!(!outer.contains(&TileId::new(1, 1)));
}

#[test]
fn rotations_preserve_radius_and_spread() {
    let primary = (3i32, 0i32);
    let plus = rotate_offset(primary.0, primary.1, 120.0);
    let minus = rotate_offset(primary.0, primary.1, -120.0);

    let len = |(r, c): (i32, i32)| ((r * r + c * c) as f64).sqrt();
    let angle = |a: (i32, i32), b: (i32, i32)| {
        let dot = (a.0 * b.0 + a.1 * b.1) as f64;
        (dot / (len(a) * len(b))).acos().to_degrees()
    };

    // Cell rounding may shift each rotated target by up to one tile.
    assert!((len(plus) - len(primary)).abs() <= 1.0);
    assert!((len(minus) - len(primary)).abs() <= 1.0);
    assert!((angle(primary, plus) - 120.0).abs() < 15.0);
    assert!((angle(primary, minus) - 120.0).abs() < 15.0);
    assert!((angle(plus, minus) - 120.0).abs() < 15.0);
}

#[test]
fn rotated_cells_snap_to_the_nearest_outer_tile() {
    let outer: FxHashSet<TileId> = [TileId::new(0, 0), TileId::new(4, 4)].into_iter().collect();

    assert_eq!(
        snap_to_outer(TileId::new(0, 0), &outer, 2),
        Some(TileId::new(0, 0)),
        "Exact members snap to themselves"
    );
    assert_eq!(
        snap_to_outer(TileId::new(3, 4), &outer, 2),
        Some(TileId::new(4, 4)),
        "One ring out"
    );
    assert_eq!(snap_to_outer(TileId::new(10, 10), &outer, 2), None);
}
