//! `fc-core`: foundational types shared by every `fc-*` crate.
//!
//! | Module     | Contents                                              |
//! |------------|-------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `NodeId`, `EdgeId`, `RouteId`              |
//! | [`geo`]    | `GeoPoint`, great-circle distance                     |
//! | [`time`]   | `Tick`, `SimClock`, second-of-day formatting          |
//! | [`rng`]    | `SimRng` (seeded, splittable)                         |
//! | [`config`] | `FleetConfig` and its validation                      |
//! | [`error`]  | `FcError`, `FcResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, `GeoPoint`, config. |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


pub use config::FleetConfig;
pub use error::{FcError, FcResult};
pub use geo::GeoPoint;
pub use ids::{AgentId, EdgeId, NodeId, RouteId};
pub use rng::SimRng;
pub use time::{SimClock, Tick, format_hm};
