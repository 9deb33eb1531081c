#![doc = include_str!("../readme.md")]

pub mod geom;
pub mod network;
pub mod route;
pub mod trip;

#[doc(inline)]
pub use route::{RouteError, RouteResult, Router};
#[doc(inline)]
pub use trip::{LoopRoute, RoundTripPlanner, RoundTrips, TripConfig, TripError};
