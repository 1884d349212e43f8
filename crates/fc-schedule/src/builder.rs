//! Cascading-remainder schedule construction.

use std::collections::BTreeMap;
use std::ops::RangeBounds;

use tracing::debug;

use crate::{DensityProfile, ScheduleError, ScheduleResult};

/// Forced parking events due per second of day.
///
/// Only seconds with a positive count are stored; every other second in or
/// out of the window reads as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParkingSchedule {
    start_secs: u64,
    end_secs:   u64,
    counts:     BTreeMap<u64, u32>,
}

impl ParkingSchedule {
    /// A schedule with no events over `[start_secs, end_secs)`.
    pub fn empty(start_secs: u64, end_secs: u64) -> Self {
        Self { start_secs, end_secs, counts: BTreeMap::new() }
    }

    pub fn start_secs(&self) -> u64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> u64 {
        self.end_secs
    }

    /// Events due at exactly `second`.
    pub fn get(&self, second: u64) -> u32 {
        self.counts.get(&second).copied().unwrap_or(0)
    }

    /// Events due over a range of seconds.
    pub fn due_in<R: RangeBounds<u64>>(&self, seconds: R) -> u64 {
        self.counts.range(seconds).map(|(_, &n)| n as u64).sum()
    }

    /// Events due over the whole schedule.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&n| n as u64).sum()
    }

    /// Number of seconds with at least one event.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.counts.iter().map(|(&s, &n)| (s, n))
    }
}

/// Spread `total_events` over `[start_secs, end_secs)` following `profile`.
///
/// The fractional part of each second's share is carried into the next
/// listed second, so no count is ever fractional or negative.  Samples
/// outside the window are ignored.
pub fn build_schedule(
    total_events: u64,
    start_secs:   u64,
    end_secs:     u64,
    profile:      &DensityProfile,
) -> ScheduleResult<ParkingSchedule> {
    if end_secs <= start_secs {
        return Err(ScheduleError::InvalidWindow { start: start_secs, end: end_secs });
    }

    let mut schedule = ParkingSchedule::empty(start_secs, end_secs);
    let total = total_events as f64;
    let mut carry = 0.0f64;

    for &(second, density) in profile.window(start_secs, end_secs) {
        let raw = density * total + carry;
        let whole = raw.floor();
        carry = raw - whole;
        if whole >= 1.0 {
            schedule.counts.insert(second, whole as u32);
        }
    }

    debug!(
        requested = total_events,
        scheduled = schedule.total(),
        seconds = schedule.len(),
        carry,
        "parking schedule built"
    );
    Ok(schedule)
}
