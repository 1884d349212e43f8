//! `fc-demand`: where trips start and end.
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`sampler`] | `WeightedEdgeSampler` (inverse-CDF), `FringeRole` weights  |
//! | [`trip`]    | `Trip`, `TripGenerator`                                    |
//! | [`error`]   | `DemandError`, `DemandResult<T>`                           |
//!
//! A `TripGenerator` owns two samplers over the same shared network: one
//! biased towards good trip origins, one towards good destinations.  Each
//! draw pairs a source with a sink and keeps the pair only if the two are at
//! least the configured straight-line distance apart.

pub mod error;
pub mod sampler;
pub mod trip;


pub use error::{DemandError, DemandResult};
pub use sampler::{FringeRole, WeightedEdgeSampler};
pub use trip::{Trip, TripGenerator};
