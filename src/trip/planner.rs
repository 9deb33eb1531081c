use std::collections::VecDeque;

use geo::Point;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::network::{NetworkStore, Region, TileId, TileIndex};
use crate::route::{RouteResult, Router, DEFAULT_SPEED_MPS};
use crate::trip::config::TripConfig;
use crate::trip::error::TripError;
use crate::trip::rotation::{outer_tiles, rotate_offset, snap_to_outer};

/// A candidate loop destination: the start point of a low-pollution edge on
/// an outer tile.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    tile: TileId,
    edge_id: i64,
    aqi: f64,
    point: Point<f64>,
}

/// A completed outbound leg, waiting for its return leg.
#[derive(Clone, Debug)]
struct ForwardLeg {
    destination: Point<f64>,
    result: RouteResult,
    traversed: Vec<i64>,
}

/// One finished round trip, labeled by completion order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoopRoute {
    pub label: String,
    pub route: RouteResult,
}

/// Plans round trips of a target total distance from an origin point.
///
/// Each routing sub-problem builds its own [`Router`] over a corridor of
/// freshly loaded records; the planner holds no state between requests.
pub struct RoundTripPlanner<'a, S, T> {
    store: &'a S,
    tiles: &'a T,
    config: TripConfig,
}

impl<'a, S, T> RoundTripPlanner<'a, S, T>
where
    S: NetworkStore,
    T: TileIndex,
{
    pub fn new(store: &'a S, tiles: &'a T, config: TripConfig) -> Self {
        RoundTripPlanner {
            store,
            tiles,
            config,
        }
    }

    /// Plans a round trip of roughly `target_distance_m` starting and
    /// ending at `origin`.
    ///
    /// Candidate selection and every outbound leg run eagerly; the returned
    /// sequence pays for one return leg per step. Errors here are terminal:
    /// the request itself is impossible or every candidate already failed.
    pub fn round_trips(
        &self,
        origin: Point<f64>,
        target_distance_m: f64,
    ) -> Result<RoundTrips<'a, S, T>, TripError> {
        let max_leg = target_distance_m / self.config.leg_divisor - self.config.leg_margin_m;
        let reachable_ids = if max_leg > 0.0 {
            self.tiles
                .tiles_intersecting(&Region::around(origin, max_leg))
        } else {
            Vec::new()
        };
        if reachable_ids.is_empty() {
            return Err(TripError::DistanceTooSmall {
                target_m: target_distance_m,
            });
        }
        let reachable: FxHashSet<TileId> = reachable_ids.iter().copied().collect();

        let outer = outer_tiles(&reachable);
        if outer.is_empty() {
            return Err(TripError::IsolatedLocation);
        }
        let outer_set: FxHashSet<TileId> = outer.iter().copied().collect();

        let per_tile = self.candidates(&reachable_ids, &outer_set);
        let primary = per_tile
            .values()
            .flatten()
            .min_by(|a, b| a.aqi.total_cmp(&b.aqi).then(a.edge_id.cmp(&b.edge_id)))
            .ok_or(TripError::NoCandidates)?;

        let targets = self.targets(origin, primary.tile, target_distance_m, &outer_set)?;
        info!(
            "Round trip from {:?}: {} reachable tiles, {} outer, targets {:?}",
            origin.x_y(),
            reachable.len(),
            outer.len(),
            targets
        );

        // Outbound legs: per target tile, the first candidate producing a
        // non-empty route wins; exhausted tiles are dropped.
        let mut legs = Vec::new();
        for tile in targets {
            let candidates = per_tile.get(&tile).map(Vec::as_slice).unwrap_or_default();
            match self.forward_leg(origin, candidates) {
                Some(leg) => legs.push(leg),
                None => warn!("No routable candidate on tile {tile:?}, dropping target"),
            }
        }
        if legs.is_empty() {
            return Err(TripError::Exhausted);
        }

        // Cleanest first: return legs are computed in exposure order.
        legs.sort_by(|a, b| a.result.summary.aqi_avg.total_cmp(&b.result.summary.aqi_avg));

        Ok(RoundTrips {
            store: self.store,
            tiles: self.tiles,
            config: self.config,
            origin,
            legs: legs.into(),
            produced: 0,
            exhausted_reported: false,
        })
    }

    /// Up to `candidates_per_tile` lowest-pollution edges per outer tile;
    /// each contributes its geometry's start point as a destination.
    fn candidates(
        &self,
        reachable: &[TileId],
        outer: &FxHashSet<TileId>,
    ) -> FxHashMap<TileId, Vec<Candidate>> {
        let mut per_tile: FxHashMap<TileId, Vec<Candidate>> = FxHashMap::default();

        for edge in self.store.load_edges(reachable) {
            if !outer.contains(&edge.tile) {
                continue;
            }
            let Some(start) = edge.geometry.points().next() else {
                continue;
            };

            per_tile.entry(edge.tile).or_default().push(Candidate {
                tile: edge.tile,
                edge_id: edge.edge_id,
                aqi: edge.aqi,
                point: start,
            });
        }

        for list in per_tile.values_mut() {
            list.sort_by(|a, b| a.aqi.total_cmp(&b.aqi).then(a.edge_id.cmp(&b.edge_id)));
            list.truncate(self.config.candidates_per_tile);
        }

        per_tile
    }

    /// The primary target plus its two rotations, each snapped onto an
    /// outer tile. Unresolvable rotation slots are skipped, not fatal.
    fn targets(
        &self,
        origin: Point<f64>,
        primary: TileId,
        target_distance_m: f64,
        outer: &FxHashSet<TileId>,
    ) -> Result<Vec<TileId>, TripError> {
        let origin_tile = self
            .tiles
            .tile_at(origin)
            .ok_or(TripError::DistanceTooSmall {
                target_m: target_distance_m,
            })?;
        let (dr, dc) = (primary.row - origin_tile.row, primary.col - origin_tile.col);

        let mut targets = vec![primary];
        for sign in [1.0, -1.0] {
            let (rot_r, rot_c) = rotate_offset(dr, dc, sign * self.config.rotation_deg);
            let cell = TileId::new(origin_tile.row + rot_r, origin_tile.col + rot_c);
            match snap_to_outer(cell, outer, self.config.snap_radius_max) {
                Some(tile) => targets.push(tile),
                None => debug!(
                    "No outer tile within {} of rotated cell {cell:?}, skipping slot",
                    self.config.snap_radius_max
                ),
            }
        }

        Ok(targets)
    }

    fn forward_leg(&self, origin: Point<f64>, candidates: &[Candidate]) -> Option<ForwardLeg> {
        for candidate in candidates {
            match corridor_route(
                self.store,
                self.tiles,
                &self.config,
                origin,
                candidate.point,
                &[],
            ) {
                Ok(result) if !result.is_empty() => {
                    debug!(
                        "Forward leg to edge {} on {:?}: {:.0} m",
                        candidate.edge_id, candidate.tile, result.summary.distance_m
                    );
                    return Some(ForwardLeg {
                        destination: candidate.point,
                        traversed: result.edge_ids(),
                        result,
                    });
                }
                Ok(_) => debug!("Candidate edge {} produced an empty route", candidate.edge_id),
                Err(err) => debug!("Candidate edge {} failed: {err}", candidate.edge_id),
            }
        }

        None
    }
}

/// One leg routed over the corridor buffer between `from` and `to`, with
/// `avoid` edges penalized against reuse.
fn corridor_route<S, T>(
    store: &S,
    tiles: &T,
    config: &TripConfig,
    from: Point<f64>,
    to: Point<f64>,
    avoid: &[i64],
) -> Result<RouteResult, TripError>
where
    S: NetworkStore,
    T: TileIndex,
{
    let region = Region::between(from, to, config.candidate_buffer_m);
    let in_reach = tiles.tiles_intersecting(&region);

    let mut router = Router::new(store.load_edges(&in_reach), store.load_nodes(&in_reach))?;
    if !avoid.is_empty() {
        router.penalize(avoid.iter().copied(), config.overlap_penalty);
    }

    Ok(router.route(from, to, config.balance)?)
}

/// Lazy, single-pass sequence of round-trip results.
///
/// Each `next()` computes one return leg, so results become available as
/// they complete. Failed candidates are logged and skipped without
/// reserving a loop number; if the sequence ends with zero loops, a single
/// terminal [`TripError::Exhausted`] is yielded instead. Dropping the
/// iterator cancels all remaining work.
pub struct RoundTrips<'a, S, T> {
    store: &'a S,
    tiles: &'a T,
    config: TripConfig,
    origin: Point<f64>,
    legs: VecDeque<ForwardLeg>,
    produced: usize,
    exhausted_reported: bool,
}

impl<S, T> Iterator for RoundTrips<'_, S, T>
where
    S: NetworkStore,
    T: TileIndex,
{
    type Item = Result<LoopRoute, TripError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(leg) = self.legs.pop_front() {
            match corridor_route(
                self.store,
                self.tiles,
                &self.config,
                leg.destination,
                self.origin,
                &leg.traversed,
            ) {
                Ok(back) if !back.is_empty() => {
                    self.produced += 1;
                    let label = format!("loop{}", self.produced);

                    let mut edges = leg.result.edges;
                    edges.extend(back.edges);
                    let route = RouteResult::from_edges(edges, DEFAULT_SPEED_MPS);

                    debug!("{label}: {:.0} m round trip", route.summary.distance_m);
                    return Some(Ok(LoopRoute { label, route }));
                }
                Ok(_) => warn!(
                    "Return leg from {:?} was empty, skipping candidate",
                    leg.destination.x_y()
                ),
                Err(err) => warn!(
                    "Return leg from {:?} failed: {err}, skipping candidate",
                    leg.destination.x_y()
                ),
            }
        }

        if self.produced == 0 && !self.exhausted_reported {
            self.exhausted_reported = true;
            return Some(Err(TripError::Exhausted));
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.legs.len().max(1)))
    }
}
