/// Tuning parameters for round-trip planning.
///
/// These are empirical operating values, not derived constraints; override
/// them per deployment rather than editing call sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TripConfig {
    /// Divisor turning the requested total distance into one-way reach.
    pub leg_divisor: f64,
    /// Safety margin subtracted from the one-way reach, in metres.
    pub leg_margin_m: f64,
    /// Angular spread between the primary and the alternate loop targets.
    pub rotation_deg: f64,
    /// Balance factor applied to both legs: mostly pollution-weighted.
    pub balance: f64,
    /// Weight given to outbound edges while routing the return leg. Large
    /// enough to discourage reuse, finite so reuse stays possible.
    pub overlap_penalty: f64,
    /// Corridor radius loaded around each leg, in metres.
    pub candidate_buffer_m: f64,
    /// Candidate edges considered per outer tile.
    pub candidates_per_tile: usize,
    /// Manhattan search radius when snapping rotated cells to outer tiles.
    pub snap_radius_max: i32,
}

impl Default for TripConfig {
    fn default() -> Self {
        TripConfig {
            leg_divisor: 2.2,
            leg_margin_m: 100.0,
            rotation_deg: 120.0,
            balance: 0.15,
            overlap_penalty: 999_999.0,
            candidate_buffer_m: 1_000.0,
            candidates_per_tile: 5,
            snap_radius_max: 2,
        }
    }
}
