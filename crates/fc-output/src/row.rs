//! Plain data rows written by output backends.

use fc_control::{FleetEvent, TickReport};

/// Fleet counters at one traced tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow {
    pub tick:                 u64,
    /// Second of day.
    pub second:               u64,
    pub active:               u32,
    pub parked:               u32,
    /// Uncontrolled parkings not yet set off against the schedule.
    pub uncontrolled_pending: u32,
    pub uncontrolled_total:   u64,
    pub forced_total:         u64,
}

impl From<&TickReport<'_>> for TraceRow {
    fn from(report: &TickReport<'_>) -> Self {
        let c = &report.counts;
        Self {
            tick:                 report.tick.0,
            second:               report.second,
            active:               c.active,
            parked:               c.parked,
            uncontrolled_pending: c.uncontrolled_pending,
            uncontrolled_total:   c.uncontrolled_total,
            forced_total:         c.forced_total,
        }
    }
}

/// One agent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRow {
    pub tick:   u64,
    pub second: u64,
    pub agent:  u32,
    /// `FleetEventKind::as_str` of the event.
    pub kind:   &'static str,
}

impl EventRow {
    pub fn new(report: &TickReport<'_>, event: &FleetEvent) -> Self {
        Self {
            tick:   report.tick.0,
            second: report.second,
            agent:  event.agent.0,
            kind:   event.kind.as_str(),
        }
    }
}
