//! `fc-network`: the road network that trips are drawn from.
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR in/out adjacency, fringe flags), builder |
//! | [`grid`]    | `GridSpec`, `build_grid`: synthetic Manhattan networks     |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`, `connect_edges`  |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                          |
//!
//! The network is immutable once built and is shared (behind an `Arc`) by
//! every sampler and by in-process simulators.

pub mod error;
pub mod grid;
pub mod network;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{NetworkError, NetworkResult};
pub use grid::{GridSpec, build_grid};
pub use network::{EdgeView, RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router, connect_edges};
