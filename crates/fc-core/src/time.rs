//! Simulation clock.
//!
//! The external simulator owns time and reports it in milliseconds elapsed
//! since the run began.  The controller maps that onto the real-world
//! second of day the run models:
//!
//!   second_of_day = start_secs + elapsed_ms / 1000
//!
//! Schedules are keyed by second of day, so this is the only conversion the
//! rest of the system needs.

use std::fmt;

/// Number of controller iterations performed so far.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Maps the simulator's elapsed milliseconds onto second-of-day.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Second of day that corresponds to elapsed time zero.
    pub start_secs: u64,
    /// Milliseconds elapsed, as last reported by the simulator.
    pub elapsed_ms: u64,
}

impl SimClock {
    pub fn new(start_secs: u64) -> Self {
        Self { start_secs, elapsed_ms: 0 }
    }

    /// Record the simulator's latest time reading.
    #[inline]
    pub fn set_elapsed_ms(&mut self, elapsed_ms: u64) {
        self.elapsed_ms = elapsed_ms;
    }

    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms / 1000
    }

    /// The whole second of day currently being simulated.
    #[inline]
    pub fn second_of_day(&self) -> u64 {
        self.start_secs + self.elapsed_secs()
    }

    /// `true` once `horizon_secs` of simulated time have elapsed.
    #[inline]
    pub fn reached(&self, horizon_secs: u64) -> bool {
        self.elapsed_ms >= horizon_secs * 1000
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.second_of_day();
        write!(f, "{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }
}

/// Format a second of day as `HHhMMm`, the form used in run banners.
pub fn format_hm(second_of_day: u64) -> String {
    format!("{}h{:02}m", second_of_day / 3600, (second_of_day % 3600) / 60)
}
