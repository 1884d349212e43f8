//! `fc-schedule`: when forced parking events happen.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`density`]  | `DensityProfile`, `load_density_csv`, `load_density_reader` |
//! | [`builder`]  | `build_schedule`, `ParkingSchedule`                       |
//! | [`error`]    | `ScheduleError`, `ScheduleResult<T>`                      |
//!
//! # Apportionment (summary)
//!
//! A requested event total is spread over `[start, end)` second by second,
//! carrying the fractional part forward:
//!
//! ```text
//! raw(t)   = density(t) * total + carry
//! count(t) = floor(raw(t))
//! carry    = raw(t) - count(t)
//! ```
//!
//! For a profile whose window mass is 1 the counts add up to `total` minus
//! at most one event lost in the final carry.

pub mod builder;
pub mod density;
pub mod error;


pub use builder::{ParkingSchedule, build_schedule};
pub use density::{DensityProfile, load_density_csv, load_density_reader};
pub use error::{ScheduleError, ScheduleResult};
