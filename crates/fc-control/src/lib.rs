//! `fc-control`: the closed control loop around an external traffic
//! simulator.
//!
//! # Tick loop
//!
//! ```text
//! while elapsed < stop - start:
//!   ① Reconcile  live list vs. active/parked; count uncontrolled parkings
//!   ② Reroute    agents near their route end get a new sink
//!   ③ Top up     introduce min(target - active, max_new_per_second)
//!   ④ Park       scheduled quota minus uncontrolled parkings, drawn
//!                without replacement; top up again if below target
//!   ⑤ Step       advance the simulator, re-read its clock
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`simulator`]  | `TrafficSimulator` boundary trait                        |
//! | [`loopback`]   | `LoopbackSimulator`, an in-process simulator             |
//! | [`tracker`]    | `FleetTracker`, `ReconcileOutcome`                       |
//! | [`parking`]    | `match_uncontrolled`, `draw_distinct`                    |
//! | [`observer`]   | `TickObserver`, `TickReport`, `FleetEvent`, `RunSummary` |
//! | [`controller`] | `FleetController`                                        |
//! | [`builder`]    | `ControllerBuilder`                                      |
//! | [`error`]      | `SimulatorError`, `ControlError` and result aliases      |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                    |
//! |-----------|-----------------------------------------------------------|
//! | `fx-hash` | FxHash for the live-agent set built on every reconcile.   |

pub mod builder;
pub mod controller;
pub mod error;
pub mod loopback;
pub mod observer;
pub mod parking;
pub mod simulator;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use builder::ControllerBuilder;
pub use controller::{FleetController, near_route_end};
pub use error::{ControlError, ControlResult, SimulatorError, SimulatorResult};
pub use loopback::LoopbackSimulator;
pub use observer::{
    FleetCounts, FleetEvent, FleetEventKind, NoopObserver, RunSummary, TickObserver, TickReport,
};
pub use parking::{draw_distinct, match_uncontrolled};
pub use simulator::TrafficSimulator;
pub use tracker::{FleetTracker, ReconcileOutcome};
