//! The `FleetController` and its tick loop.

use tracing::{debug, info, warn};

use fc_core::{AgentId, EdgeId, FleetConfig, RouteId, SimClock, SimRng, Tick};
use fc_demand::TripGenerator;
use fc_schedule::ParkingSchedule;

use crate::{
    ControlResult, FleetCounts, FleetEvent, FleetEventKind, FleetTracker, RunSummary,
    SimulatorError, TickObserver, TickReport, TrafficSimulator, draw_distinct,
};

/// Keeps a simulated fleet at its target size and forces the scheduled
/// parking events.
///
/// Each tick:
///
/// 1. **Reconcile** the tracker with the simulator's live agent list.
/// 2. **Reroute** active agents within `reroute_window` edges of the end of
///    their route to a fresh sink, keeping the current edge as source.
/// 3. **Top up**: introduce `min(target - active, max_new_per_second)`
///    agents.  The first time the fleet is at target, latch stability.
/// 4. **Park**: take the scheduled count for every second not yet
///    enforced, set it off against pending uncontrolled parkings, remove
///    that many distinct random agents, then top up again.
/// 5. **Step** the simulator and re-read its clock.
///
/// Create via [`ControllerBuilder`][crate::ControllerBuilder].
pub struct FleetController<S: TrafficSimulator> {
    pub(crate) config:   FleetConfig,
    pub(crate) sim:      S,
    pub(crate) trips:    TripGenerator,
    pub(crate) schedule: ParkingSchedule,
    pub(crate) tracker:  FleetTracker,
    pub(crate) clock:    SimClock,
    pub(crate) tick:     Tick,

    /// Next id handed to an introduced agent.
    pub(crate) next_agent:  AgentId,
    /// First second of day whose scheduled parkings are still owed.
    pub(crate) next_second: u64,

    pub(crate) trip_rng: SimRng,
    pub(crate) park_rng: SimRng,

    pub(crate) summary: RunSummary,
    /// Events of the tick in progress.
    pub(crate) events:  Vec<FleetEvent>,
}

impl<S: TrafficSimulator> FleetController<S> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the simulator's clock reaches the configured horizon, then
    /// close the simulator.
    pub fn run<O: TickObserver>(&mut self, observer: &mut O) -> ControlResult<RunSummary> {
        let horizon = self.config.horizon_secs();
        while !self.clock.reached(horizon) {
            self.run_tick(observer)?;
        }
        self.sim.close()?;
        info!(
            ticks = self.summary.ticks,
            introduced = self.summary.introduced,
            forced = self.summary.forced_parkings,
            uncontrolled = self.summary.uncontrolled_parkings,
            "run complete"
        );

        let summary = self.summary();
        observer.on_run_end(&summary);
        Ok(summary)
    }

    /// Run exactly `n` ticks, ignoring the horizon.  The simulator is left
    /// open.
    pub fn run_ticks<O: TickObserver>(&mut self, n: u64, observer: &mut O) -> ControlResult<()> {
        for _ in 0..n {
            self.run_tick(observer)?;
        }
        Ok(())
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn tracker(&self) -> &FleetTracker {
        &self.tracker
    }

    pub fn schedule(&self) -> &ParkingSchedule {
        &self.schedule
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    /// Totals so far, with the final counts filled in.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            final_active: self.tracker.active_count() as u32,
            final_parked: self.tracker.parked_count() as u32,
            ..self.summary.clone()
        }
    }

    pub fn counts(&self) -> FleetCounts {
        FleetCounts {
            active:               self.tracker.active_count() as u32,
            parked:               self.tracker.parked_count() as u32,
            uncontrolled_pending: self.tracker.uncontrolled_pending(),
            uncontrolled_total:   self.tracker.uncontrolled_total(),
            forced_total:         self.summary.forced_parkings,
            stable:               self.tracker.is_stable(),
        }
    }

    // ── Tick sequence ─────────────────────────────────────────────────────

    fn run_tick<O: TickObserver>(&mut self, observer: &mut O) -> ControlResult<()> {
        let now = self.tick;
        let second = self.clock.second_of_day();
        self.events.clear();
        observer.on_tick_start(now, second);

        self.reconcile()?;
        self.reroute()?;
        self.top_up()?;
        self.enforce_parking(second)?;

        let report = TickReport { tick: now, second, counts: self.counts(), events: &self.events };
        observer.on_tick_end(&report);
        let interval = self.config.trace_interval_ticks.max(1);
        if now.0 % interval == 0 {
            observer.on_trace(&report);
        }
        debug!(
            "{}\t{} vehicles, {} parking events",
            self.clock,
            report.counts.active,
            report.counts.parked
        );

        self.sim.step()?;
        self.clock.set_elapsed_ms(self.sim.current_time_ms()?);
        self.tick = now.next();
        self.summary.ticks += 1;
        Ok(())
    }

    fn reconcile(&mut self) -> ControlResult<()> {
        let live = self.sim.agent_ids()?;
        let outcome = self.tracker.reconcile(&live);

        for &agent in &outcome.reactivated {
            info!(%agent, "assumed parked vehicle {agent} is now active");
            self.push_event(agent, FleetEventKind::Reactivated);
        }
        for &agent in &outcome.vanished {
            debug!(%agent, counted = outcome.counted, "vehicle left the simulation");
            self.push_event(agent, FleetEventKind::Vanished);
        }

        self.summary.reactivations += outcome.reactivated.len() as u64;
        if outcome.counted {
            self.summary.uncontrolled_parkings += outcome.vanished.len() as u64;
        } else {
            self.summary.ramp_up_departures += outcome.vanished.len() as u64;
        }
        Ok(())
    }

    fn reroute(&mut self) -> ControlResult<()> {
        let window = self.config.reroute_window;
        let active: Vec<AgentId> = self.tracker.active().collect();

        for agent in active {
            let edge = self.sim.agent_edge(agent)?;
            let route = self.sim.agent_route(agent)?;
            if !near_route_end(&route, edge, window) {
                continue;
            }

            let trip = match self.trips.trip_from(edge, &mut self.trip_rng) {
                Ok(trip) => trip,
                Err(e) if e.is_recoverable() => {
                    warn!(%agent, error = %e, "no new destination; vehicle keeps its route");
                    self.summary.trip_failures += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match self.sim.change_target(agent, trip.sink) {
                Ok(()) => {}
                Err(e) if !e.is_fatal() => {
                    warn!(%agent, error = %e, "reroute rejected; vehicle keeps its route");
                    self.summary.trip_failures += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            debug!(%agent, from = %edge, sink = %trip.sink, "reroute vehicle");
            self.summary.rerouted += 1;
            self.push_event(agent, FleetEventKind::Rerouted);
        }
        Ok(())
    }

    /// Introduce agents towards the target, then latch stability if the
    /// target is met.
    fn top_up(&mut self) -> ControlResult<()> {
        let target = self.config.target_active as usize;
        let active = self.tracker.active_count();

        if active < target {
            let need = (target - active).min(self.config.max_new_per_second as usize);
            for _ in 0..need {
                if !self.introduce()? {
                    break;
                }
            }
        }

        if self.tracker.active_count() >= target && self.tracker.mark_stable() {
            self.summary.stable_at = Some(self.tick);
            info!(tick = %self.tick, at = %self.clock, active = target, "fleet reached target size");
        }
        Ok(())
    }

    /// Introduce one agent on a fresh trip.  Returns `Ok(false)` if no trip
    /// could be found or the simulator rejected its route.
    fn introduce(&mut self) -> ControlResult<bool> {
        let trip = match self.trips.trip(&mut self.trip_rng) {
            Ok(trip) => trip,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "no trip available; introduction postponed");
                self.summary.trip_failures += 1;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let agent = self.next_agent;
        let route = RouteId::from(agent);
        match self.sim.add_route(route, &[trip.source, trip.sink]) {
            Ok(()) => {}
            Err(e) if !e.is_fatal() => {
                warn!(%route, error = %e, "route rejected; introduction postponed");
                self.summary.trip_failures += 1;
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
        self.sim.add_agent(agent, route)?;

        self.next_agent = agent.next();
        self.tracker.admit(agent);
        self.summary.introduced += 1;
        self.push_event(agent, FleetEventKind::Added);
        debug!(at = %self.clock, %agent, source = %trip.source, sink = %trip.sink, "add vehicle");
        Ok(true)
    }

    fn enforce_parking(&mut self, second: u64) -> ControlResult<()> {
        if second < self.next_second {
            return Ok(());
        }
        let due = self.schedule.due_in(self.next_second..=second);
        self.next_second = second + 1;
        if due == 0 {
            return Ok(());
        }

        let due = u32::try_from(due).unwrap_or(u32::MAX);
        let will_park = self.tracker.offset_uncontrolled(due) as usize;
        if will_park == 0 {
            return Ok(());
        }

        let pool: Vec<AgentId> = self.tracker.active().collect();
        if will_park > pool.len() {
            warn!(
                requested = will_park,
                available = pool.len(),
                "not enough active vehicles to meet the parking schedule"
            );
            self.summary.parking_shortfall += (will_park - pool.len()) as u64;
        }

        for agent in draw_distinct(&pool, will_park, &mut self.park_rng) {
            match self.sim.remove_agent(agent) {
                Ok(()) => {}
                // Left on its own since reconciliation. The quota slot it
                // was drawn for goes unfilled and must not be charged again
                // as an uncontrolled parking.
                Err(SimulatorError::UnknownAgent(_)) => {
                    warn!(at = %self.clock, %agent, "vehicle left before it could be parked");
                    self.tracker.park(agent);
                    self.summary.parking_shortfall += 1;
                    self.push_event(agent, FleetEventKind::Vanished);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            self.tracker.park(agent);
            self.summary.forced_parkings += 1;
            self.push_event(agent, FleetEventKind::ForcedParked);
            debug!(at = %self.clock, %agent, "park vehicle");
        }

        if self.tracker.active_count() < self.config.target_active as usize {
            self.top_up()?;
        }
        Ok(())
    }

    fn push_event(&mut self, agent: AgentId, kind: FleetEventKind) {
        self.events.push(FleetEvent { agent, kind });
    }
}

/// `true` if `edge` is one of the last `window` edges of `route`.
pub fn near_route_end(route: &[EdgeId], edge: EdgeId, window: usize) -> bool {
    let tail = route.len().saturating_sub(window);
    route[tail..].contains(&edge)
}
