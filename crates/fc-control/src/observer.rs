//! Tick observer trait for progress reporting and trace output.

use fc_core::{AgentId, Tick};

// ── Per-tick data handed to observers ─────────────────────────────────────────

/// Something that happened to one agent during a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FleetEventKind {
    /// Introduced by the controller to top up the fleet.
    Added,
    /// Given a new destination shortly before arriving.
    Rerouted,
    /// Removed by the controller to meet the parking schedule.
    ForcedParked,
    /// Disappeared from the simulator without the controller removing it.
    Vanished,
    /// Reappeared in the simulator after being recorded as parked.
    Reactivated,
}

impl FleetEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FleetEventKind::Added        => "added",
            FleetEventKind::Rerouted     => "rerouted",
            FleetEventKind::ForcedParked => "forced_parked",
            FleetEventKind::Vanished     => "vanished",
            FleetEventKind::Reactivated  => "reactivated",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FleetEvent {
    pub agent: AgentId,
    pub kind:  FleetEventKind,
}

/// Fleet counters at the end of a tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FleetCounts {
    pub active:               u32,
    pub parked:               u32,
    pub uncontrolled_pending: u32,
    pub uncontrolled_total:   u64,
    pub forced_total:         u64,
    pub stable:               bool,
}

/// Everything observers see about one finished tick.
#[derive(Clone, Debug)]
pub struct TickReport<'a> {
    pub tick:   Tick,
    /// Second of day the tick simulated.
    pub second: u64,
    pub counts: FleetCounts,
    pub events: &'a [FleetEvent],
}

/// Totals over a whole run, returned by
/// [`FleetController::run`](crate::FleetController::run).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks:                 u64,
    pub introduced:            u64,
    pub rerouted:              u64,
    pub forced_parkings:       u64,
    /// Agents that vanished after the fleet became stable.
    pub uncontrolled_parkings: u64,
    /// Agents that vanished while the fleet was still ramping up.
    pub ramp_up_departures:    u64,
    pub reactivations:         u64,
    /// Trip draws or route registrations that produced no agent or reroute.
    pub trip_failures:         u64,
    /// Scheduled parkings that could not be forced, for lack of active agents
    /// or because the drawn agent left before its removal.
    pub parking_shortfall:     u64,
    pub stable_at:             Option<Tick>,
    pub final_active:          u32,
    pub final_parked:          u32,
}

// ── Observer trait ────────────────────────────────────────────────────────────

/// Callbacks invoked by [`FleetController::run`][crate::FleetController::run]
/// at tick boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait TickObserver {
    /// Called at the very start of each tick, before reconciliation.
    fn on_tick_start(&mut self, _tick: Tick, _second: u64) {}

    /// Called after each tick's fleet changes, before the simulator steps.
    fn on_tick_end(&mut self, _report: &TickReport<'_>) {}

    /// Called every `trace_interval_ticks` ticks, right after
    /// [`on_tick_end`](Self::on_tick_end).
    fn on_trace(&mut self, _report: &TickReport<'_>) {}

    /// Called once after the run reaches its horizon.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}
