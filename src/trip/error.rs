use std::fmt::{self, Display, Formatter};

use crate::route::RouteError;

/// Terminal round-trip failures. Per-candidate problems never surface
/// here — they are logged and the planner moves on; only total exhaustion
/// or an impossible request is fatal.
#[derive(Clone, Debug, PartialEq)]
pub enum TripError {
    /// The reachability circle resolved to no tiles: the requested distance
    /// is too small, or there is no data under it.
    DistanceTooSmall { target_m: f64 },
    /// The reachable area has no rim to aim a loop at.
    IsolatedLocation,
    /// No outer tile contributed a candidate destination.
    NoCandidates,
    /// Every candidate failed; no loop could be produced.
    Exhausted,
    /// A routing failure escalated outside candidate recovery.
    Route(RouteError),
}

impl From<RouteError> for TripError {
    fn from(value: RouteError) -> Self {
        TripError::Route(value)
    }
}

impl Display for TripError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TripError::DistanceTooSmall { target_m } => {
                write!(f, "distance too small: no tiles reachable for a {target_m} m round trip")
            }
            TripError::IsolatedLocation => {
                write!(f, "isolated location: reachable area has no outer tiles")
            }
            TripError::NoCandidates => {
                write!(f, "no candidate destinations on any outer tile")
            }
            TripError::Exhausted => {
                write!(f, "all round-trip candidates failed")
            }
            TripError::Route(err) => write!(f, "routing failed: {err}"),
        }
    }
}

impl std::error::Error for TripError {}
