//! Run configuration.
//!
//! Usually deserialised from a JSON file by the runner (feature `serde`) and
//! then passed to `fc_control::ControllerBuilder`.  Any field missing from
//! the file takes its value from [`FleetConfig::default`].

use crate::{FcError, FcResult};

/// Seconds in the reference day that density profiles cover.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Every tunable of a fleet-controller run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FleetConfig {
    /// Master RNG seed.  The same seed reproduces the same run.
    pub seed: u64,

    /// Minimum straight-line distance between a trip's source and sink, in
    /// metres.  Must not exceed the network's bounding-box diagonal.
    pub min_trip_distance_m: f64,

    /// Weight multiplier for fringe edges of the role-appropriate kind.
    /// `1.0` is neutral.
    pub fringe_factor: f64,

    /// Second of day at which the run starts.
    pub start_secs: u64,

    /// Second of day at which the run stops (exclusive).
    pub stop_secs: u64,

    /// Cap on agents introduced in a single tick.
    pub max_new_per_second: u32,

    /// Active population the controller steers towards.
    pub target_active: u32,

    /// Forced parking events to distribute over `[start_secs, stop_secs)`.
    pub parking_events: u64,

    /// Emit per-agent debug logging.
    pub debug: bool,

    /// Draws attempted before trip generation gives up.
    pub max_trip_tries: u32,

    /// An agent whose current edge is among the last `reroute_window` edges
    /// of its route is given a new destination.
    pub reroute_window: usize,

    /// Emit a trace row every N ticks.  `1` traces every tick.
    pub trace_interval_ticks: u64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            seed:                 31_338,
            min_trip_distance_m:  250.0,
            fringe_factor:        1.0,
            start_secs:           3 * 3600,
            stop_secs:            21 * 3600,
            max_new_per_second:   4,
            target_active:        55,
            parking_events:       4_000,
            debug:                false,
            max_trip_tries:       1_000,
            reroute_window:       3,
            trace_interval_ticks: 1,
        }
    }
}

impl FleetConfig {
    /// Simulated seconds the run lasts.
    #[inline]
    pub fn horizon_secs(&self) -> u64 {
        self.stop_secs.saturating_sub(self.start_secs)
    }

    /// Check every option that can be checked without the network.
    ///
    /// The distance floor is validated again against the network diagonal
    /// when the trip generator is built.
    pub fn validate(&self) -> FcResult<()> {
        if !(self.min_trip_distance_m.is_finite() && self.min_trip_distance_m > 0.0) {
            return Err(FcError::Config(format!(
                "min_trip_distance_m must be a positive number, got {}",
                self.min_trip_distance_m
            )));
        }
        if !(self.fringe_factor.is_finite() && self.fringe_factor >= 0.0) {
            return Err(FcError::Config(format!(
                "fringe_factor must be non-negative, got {}",
                self.fringe_factor
            )));
        }
        if self.stop_secs <= self.start_secs {
            return Err(FcError::Config(format!(
                "stop_secs ({}) must be greater than start_secs ({})",
                self.stop_secs, self.start_secs
            )));
        }
        if self.stop_secs > SECONDS_PER_DAY {
            return Err(FcError::Config(format!(
                "stop_secs ({}) lies beyond the end of the day",
                self.stop_secs
            )));
        }
        if self.max_new_per_second == 0 {
            return Err(FcError::Config("max_new_per_second must be at least 1".into()));
        }
        if self.target_active == 0 {
            return Err(FcError::Config("target_active must be at least 1".into()));
        }
        if self.max_trip_tries == 0 {
            return Err(FcError::Config("max_trip_tries must be at least 1".into()));
        }
        if self.reroute_window == 0 {
            return Err(FcError::Config("reroute_window must be at least 1".into()));
        }
        Ok(())
    }
}
