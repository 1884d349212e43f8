//! Unit and integration tests for fc-control.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use fc_core::{AgentId, EdgeId, FleetConfig, GeoPoint, RouteId, Tick};
use fc_network::{DijkstraRouter, GridSpec, RoadNetwork, RoadNetworkBuilder, build_grid, connect_edges};
use fc_schedule::{DensityProfile, ParkingSchedule, build_schedule};

use crate::{
    ControllerBuilder, FleetController, FleetCounts, FleetEvent, FleetEventKind, RunSummary,
    SimulatorError, SimulatorResult, TickObserver, TickReport, TrafficSimulator,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const START: u64 = 3 * 3600;

fn grid() -> Arc<RoadNetwork> {
    Arc::new(build_grid(&GridSpec::default()))
}

fn test_config(target: u32, max_new: u32) -> FleetConfig {
    FleetConfig {
        seed:               7,
        start_secs:         START,
        stop_secs:          START + 3600,
        target_active:      target,
        max_new_per_second: max_new,
        parking_events:     0,
        // Agents in the scripted simulator sit on their first edge, so only
        // an agent moved onto its last edge is rerouted.
        reroute_window:     1,
        ..FleetConfig::default()
    }
}

/// `total` events all due at `second`.
fn burst(total: u64, second: u64) -> ParkingSchedule {
    let profile = DensityProfile::from_samples(vec![(second, 1.0)]).unwrap();
    build_schedule(total, START, START + 3600, &profile).unwrap()
}

fn scripted(config: FleetConfig) -> FleetController<ScriptedSim> {
    let net = grid();
    ControllerBuilder::new(config, ScriptedSim::new(net.clone(), 1_000), net).build().unwrap()
}

fn scripted_with(config: FleetConfig, schedule: ParkingSchedule, delta_ms: u64) -> FleetController<ScriptedSim> {
    let net = grid();
    ControllerBuilder::new(config, ScriptedSim::new(net.clone(), delta_ms), net)
        .schedule(schedule)
        .build()
        .unwrap()
}

/// Every agent ever introduced is in exactly one of the two sets.
fn assert_partition<S: TrafficSimulator>(c: &FleetController<S>) {
    let t = c.tracker();
    for i in 0..c.summary().introduced as u32 {
        let a = AgentId(i);
        assert!(t.is_active(a) ^ t.is_parked(a), "{a} active={} parked={}", t.is_active(a), t.is_parked(a));
    }
    assert_eq!((t.active_count() + t.parked_count()) as u64, c.summary().introduced);
}

// ── Scripted simulator ────────────────────────────────────────────────────────

/// Test double whose agents never move on their own.  Tests drive the
/// quirks the controller must cope with: silent removals, agents coming
/// back, agents reaching their last edge.
struct ScriptedSim {
    network:   Arc<RoadNetwork>,
    delta_ms:  u64,
    now_ms:    u64,
    routes:    HashMap<RouteId, Vec<EdgeId>>,
    /// Agent → (route, position).
    live:      BTreeMap<AgentId, (Vec<EdgeId>, usize)>,
    /// Agents removed by anyone; `revive` brings them back.
    gone:      BTreeMap<AgentId, (Vec<EdgeId>, usize)>,
    retargets: Vec<(AgentId, EdgeId)>,
    removals:  Vec<AgentId>,
    /// Agents that leave on their own the moment a removal is attempted.
    slippery:  BTreeSet<AgentId>,
    closed:    bool,
}

impl ScriptedSim {
    fn new(network: Arc<RoadNetwork>, delta_ms: u64) -> Self {
        Self {
            network,
            delta_ms,
            now_ms:    0,
            routes:    HashMap::new(),
            live:      BTreeMap::new(),
            gone:      BTreeMap::new(),
            retargets: Vec::new(),
            removals:  Vec::new(),
            slippery:  BTreeSet::new(),
            closed:    false,
        }
    }

    /// Drop `agent` without telling the controller.
    fn vanish(&mut self, agent: AgentId) -> bool {
        match self.live.remove(&agent) {
            Some(state) => {
                self.gone.insert(agent, state);
                true
            }
            None => false,
        }
    }

    /// Put a removed agent back.
    fn revive(&mut self, agent: AgentId) -> bool {
        match self.gone.remove(&agent) {
            Some(state) => {
                self.live.insert(agent, state);
                true
            }
            None => false,
        }
    }

    fn move_to_last_edge(&mut self, agent: AgentId) {
        let (route, pos) = self.live.get_mut(&agent).unwrap();
        *pos = route.len() - 1;
    }

    fn check(&self) -> SimulatorResult<()> {
        if self.closed { Err(SimulatorError::Closed) } else { Ok(()) }
    }
}

impl TrafficSimulator for ScriptedSim {
    fn current_time_ms(&self) -> SimulatorResult<u64> {
        self.check()?;
        Ok(self.now_ms)
    }

    fn delta_t_ms(&self) -> SimulatorResult<u64> {
        self.check()?;
        Ok(self.delta_ms)
    }

    fn agent_ids(&self) -> SimulatorResult<Vec<AgentId>> {
        self.check()?;
        Ok(self.live.keys().copied().collect())
    }

    fn agent_edge(&self, agent: AgentId) -> SimulatorResult<EdgeId> {
        self.check()?;
        let (route, pos) = self.live.get(&agent).ok_or(SimulatorError::UnknownAgent(agent))?;
        Ok(route[*pos])
    }

    fn agent_route(&self, agent: AgentId) -> SimulatorResult<Vec<EdgeId>> {
        self.check()?;
        let (route, _) = self.live.get(&agent).ok_or(SimulatorError::UnknownAgent(agent))?;
        Ok(route.clone())
    }

    fn add_route(&mut self, route: RouteId, waypoints: &[EdgeId]) -> SimulatorResult<()> {
        self.check()?;
        let edges = connect_edges(&DijkstraRouter, &self.network, waypoints)?;
        self.routes.insert(route, edges);
        Ok(())
    }

    fn add_agent(&mut self, agent: AgentId, route: RouteId) -> SimulatorResult<()> {
        self.check()?;
        let edges = self.routes.get(&route).ok_or(SimulatorError::UnknownRoute(route))?.clone();
        self.live.insert(agent, (edges, 0));
        Ok(())
    }

    fn change_target(&mut self, agent: AgentId, target: EdgeId) -> SimulatorResult<()> {
        self.check()?;
        let current = self.agent_edge(agent)?;
        let path = connect_edges(&DijkstraRouter, &self.network, &[current, target])?;
        self.live.insert(agent, (path, 0));
        self.retargets.push((agent, target));
        Ok(())
    }

    fn remove_agent(&mut self, agent: AgentId) -> SimulatorResult<()> {
        self.check()?;
        self.removals.push(agent);
        if self.slippery.contains(&agent) {
            self.vanish(agent);
            return Err(SimulatorError::UnknownAgent(agent));
        }
        if self.vanish(agent) { Ok(()) } else { Err(SimulatorError::UnknownAgent(agent)) }
    }

    fn step(&mut self) -> SimulatorResult<()> {
        self.check()?;
        self.now_ms += self.delta_ms;
        Ok(())
    }

    fn close(&mut self) -> SimulatorResult<()> {
        self.check()?;
        self.closed = true;
        Ok(())
    }
}

// ── Recording observer ────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    starts:  Vec<(Tick, u64)>,
    ends:    Vec<(Tick, u64, FleetCounts, Vec<FleetEvent>)>,
    traces:  Vec<Tick>,
    summary: Option<RunSummary>,
}

impl TickObserver for Recorder {
    fn on_tick_start(&mut self, tick: Tick, second: u64) {
        self.starts.push((tick, second));
    }

    fn on_tick_end(&mut self, report: &TickReport<'_>) {
        self.ends.push((report.tick, report.second, report.counts, report.events.to_vec()));
    }

    fn on_trace(&mut self, report: &TickReport<'_>) {
        self.traces.push(report.tick);
    }

    fn on_run_end(&mut self, summary: &RunSummary) {
        self.summary = Some(summary.clone());
    }
}

impl Recorder {
    fn count(&self, kind: FleetEventKind) -> usize {
        self.ends.iter().flat_map(|e| e.3.iter()).filter(|e| e.kind == kind).count()
    }
}

// ── Delta matching ────────────────────────────────────────────────────────────

#[cfg(test)]
mod matching {
    use proptest::prelude::*;

    use crate::match_uncontrolled;

    #[test]
    fn reference_cases() {
        assert_eq!(match_uncontrolled(5, 5), (0, 0));
        assert_eq!(match_uncontrolled(8, 3), (5, 0));
        assert_eq!(match_uncontrolled(2, 6), (0, 4));
    }

    #[test]
    fn nothing_to_match() {
        assert_eq!(match_uncontrolled(0, 6), (0, 6));
        assert_eq!(match_uncontrolled(4, 0), (4, 0));
    }

    proptest! {
        #[test]
        fn difference_survives(will_park in 0u32..10_000, uncontrolled in 0u32..10_000) {
            let (w, u) = match_uncontrolled(will_park, uncontrolled);
            prop_assert!(w == 0 || u == 0);
            prop_assert_eq!(will_park as i64 - uncontrolled as i64, w as i64 - u as i64);
        }
    }
}

// ── Parking draw ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod draw {
    use std::collections::BTreeSet;

    use fc_core::{AgentId, SimRng};

    use crate::draw_distinct;

    fn pool(n: u32) -> Vec<AgentId> {
        (0..n).map(|i| AgentId(i * 10)).collect()
    }

    #[test]
    fn picks_are_distinct_members() {
        let pool = pool(50);
        let mut rng = SimRng::new(1);
        for amount in [0, 1, 25, 49, 50] {
            let picks = draw_distinct(&pool, amount, &mut rng);
            assert_eq!(picks.len(), amount);
            let set: BTreeSet<_> = picks.iter().copied().collect();
            assert_eq!(set.len(), amount);
            assert!(picks.iter().all(|a| pool.contains(a)));
        }
    }

    #[test]
    fn over_asking_clamps_to_pool() {
        let pool = pool(3);
        let picks = draw_distinct(&pool, 10, &mut SimRng::new(4));
        assert_eq!(picks.len(), 3);
        assert!(draw_distinct(&[], 2, &mut SimRng::new(4)).is_empty());
    }

    #[test]
    fn every_member_can_be_drawn() {
        let pool = pool(5);
        let mut rng = SimRng::new(9);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            seen.extend(draw_distinct(&pool, 1, &mut rng));
        }
        assert_eq!(seen.len(), 5);
    }
}

// ── Fleet tracker ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tracker {
    use fc_core::AgentId;

    use crate::FleetTracker;

    fn ids(v: &[u32]) -> Vec<AgentId> {
        v.iter().map(|&i| AgentId(i)).collect()
    }

    fn admitted(n: u32) -> FleetTracker {
        let mut t = FleetTracker::new();
        for i in 0..n {
            assert!(t.admit(AgentId(i)));
        }
        t
    }

    #[test]
    fn ramp_up_departures_not_counted() {
        let mut t = admitted(3);
        let out = t.reconcile(&ids(&[0, 2]));
        assert_eq!(out.vanished, ids(&[1]));
        assert!(!out.counted);
        assert!(t.is_parked(AgentId(1)));
        assert_eq!(t.uncontrolled_pending(), 0);
        assert_eq!(t.uncontrolled_total(), 0);
    }

    #[test]
    fn stable_departures_counted() {
        let mut t = admitted(3);
        t.mark_stable();
        let out = t.reconcile(&ids(&[2]));
        assert_eq!(out.vanished, ids(&[0, 1]));
        assert!(out.counted);
        assert_eq!(t.uncontrolled_pending(), 2);
        assert_eq!(t.uncontrolled_total(), 2);
        assert_eq!(t.active_count(), 1);
    }

    #[test]
    fn reappearance_ignored_while_ramping() {
        let mut t = admitted(2);
        t.park(AgentId(0));
        let out = t.reconcile(&ids(&[0, 1]));
        assert!(out.reactivated.is_empty());
        assert!(t.is_parked(AgentId(0)));
    }

    #[test]
    fn reappearance_reactivates_once_stable() {
        let mut t = admitted(2);
        t.mark_stable();
        t.reconcile(&ids(&[1]));
        assert_eq!(t.uncontrolled_pending(), 1);

        let out = t.reconcile(&ids(&[0, 1]));
        assert_eq!(out.reactivated, ids(&[0]));
        assert!(t.is_active(AgentId(0)));
        assert_eq!(t.uncontrolled_pending(), 0);
        // The lifetime count is not taken back.
        assert_eq!(t.uncontrolled_total(), 1);
    }

    #[test]
    fn pending_count_floors_at_zero() {
        let mut t = admitted(3);
        t.mark_stable();
        t.park(AgentId(0));
        t.park(AgentId(1));
        let out = t.reconcile(&ids(&[0, 1, 2]));
        assert_eq!(out.reactivated.len(), 2);
        assert_eq!(t.uncontrolled_pending(), 0);
    }

    #[test]
    fn unknown_live_ids_ignored() {
        let mut t = admitted(1);
        t.mark_stable();
        let out = t.reconcile(&ids(&[0, 99]));
        assert!(out.reactivated.is_empty() && out.vanished.is_empty());
        assert!(!t.is_active(AgentId(99)) && !t.is_parked(AgentId(99)));
    }

    #[test]
    fn admit_and_park_are_idempotent() {
        let mut t = admitted(1);
        assert!(!t.admit(AgentId(0)));
        assert!(t.park(AgentId(0)));
        assert!(!t.park(AgentId(0)));
        assert!(!t.admit(AgentId(0)));
        assert_eq!((t.active_count(), t.parked_count()), (0, 1));
    }

    #[test]
    fn offset_consumes_pending() {
        let mut t = admitted(8);
        t.mark_stable();
        t.reconcile(&ids(&[6, 7]));
        assert_eq!(t.uncontrolled_pending(), 6);
        assert_eq!(t.offset_uncontrolled(2), 0);
        assert_eq!(t.uncontrolled_pending(), 4);
        assert_eq!(t.offset_uncontrolled(10), 6);
        assert_eq!(t.uncontrolled_pending(), 0);
    }

    #[test]
    fn stability_latches() {
        let mut t = FleetTracker::new();
        assert!(t.mark_stable());
        assert!(!t.mark_stable());
        t.reconcile(&[]);
        assert!(t.is_stable());
    }
}

// ── Reroute window ────────────────────────────────────────────────────────────

#[cfg(test)]
mod route_end {
    use fc_core::EdgeId;

    use crate::near_route_end;

    #[test]
    fn last_edges_match() {
        let route: Vec<EdgeId> = (0..6).map(EdgeId).collect();
        assert!(near_route_end(&route, EdgeId(5), 3));
        assert!(near_route_end(&route, EdgeId(3), 3));
        assert!(!near_route_end(&route, EdgeId(2), 3));
        assert!(!near_route_end(&route, EdgeId(4), 1));
        assert!(!near_route_end(&route, EdgeId(42), 3));
    }

    #[test]
    fn short_routes_fully_inside_window() {
        let route = vec![EdgeId(7), EdgeId(8)];
        assert!(near_route_end(&route, EdgeId(7), 3));
        assert!(!near_route_end(&[], EdgeId(7), 3));
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;
    use crate::ControlError;
    use fc_demand::DemandError;

    #[test]
    fn invalid_config_rejected() {
        let net = grid();
        let config = FleetConfig { stop_secs: START, ..test_config(10, 4) };
        let err = ControllerBuilder::new(config, ScriptedSim::new(net.clone(), 1_000), net).build().err().unwrap();
        assert!(matches!(err, ControlError::Config(_)));
    }

    #[test]
    fn unsatisfiable_distance_rejected() {
        let net = grid();
        let config = FleetConfig { min_trip_distance_m: 50_000.0, ..test_config(10, 4) };
        let err = ControllerBuilder::new(config, ScriptedSim::new(net.clone(), 1_000), net).build().err().unwrap();
        assert!(matches!(err, ControlError::Demand(DemandError::UnsatisfiableDistance { .. })));
    }

    #[test]
    fn default_schedule_spreads_requested_events() {
        let config = FleetConfig { parking_events: 360, ..test_config(10, 4) };
        let c = scripted(config);
        assert!((359..=360).contains(&c.schedule().total()));
        assert_eq!(c.schedule().start_secs(), START);
        assert_eq!(c.clock().second_of_day(), START);
    }

    #[test]
    fn explicit_schedule_wins() {
        let config = FleetConfig { parking_events: 360, ..test_config(10, 4) };
        let c = scripted_with(config, burst(3, START + 5), 1_000);
        assert_eq!(c.schedule().total(), 3);
    }
}

// ── Ramp-up and stability ─────────────────────────────────────────────────────

#[cfg(test)]
mod ramp_up {
    use super::*;

    #[test]
    fn reaches_target_in_capped_steps() {
        let mut c = scripted(test_config(10, 4));
        let mut rec = Recorder::default();
        c.run_ticks(4, &mut rec).unwrap();

        let active: Vec<u32> = rec.ends.iter().map(|e| e.2.active).collect();
        let stable: Vec<bool> = rec.ends.iter().map(|e| e.2.stable).collect();
        assert_eq!(active, vec![4, 8, 10, 10]);
        assert_eq!(stable, vec![false, false, true, true]);
        assert_eq!(c.summary().stable_at, Some(Tick(2)));
        assert_eq!(c.summary().introduced, 10);
        assert_eq!(rec.count(FleetEventKind::Added), 10);
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut c = scripted(test_config(5, 5));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        c.simulator_mut().vanish(AgentId(0));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        let live = c.simulator().agent_ids().unwrap();
        assert_eq!(live, (1..=5).map(AgentId).collect::<Vec<_>>());
    }

    #[test]
    fn stability_survives_population_loss() {
        let mut c = scripted(test_config(4, 4));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        assert!(c.tracker().is_stable());

        for i in 0..4 {
            c.simulator_mut().vanish(AgentId(i));
        }
        let mut rec = Recorder::default();
        c.run_ticks(1, &mut rec).unwrap();
        assert!(c.tracker().is_stable());
        assert_eq!(c.tracker().uncontrolled_total(), 4);
        assert_eq!(rec.count(FleetEventKind::Vanished), 4);
        assert_eq!(c.summary().uncontrolled_parkings, 4);
    }

    #[test]
    fn ramp_up_losses_are_not_uncontrolled() {
        let mut c = scripted(test_config(10, 4));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        c.simulator_mut().vanish(AgentId(0));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        assert_eq!(c.tracker().uncontrolled_total(), 0);
        assert_eq!(c.summary().ramp_up_departures, 1);
        assert!(c.tracker().is_parked(AgentId(0)));
    }
}

// ── Reconciliation inside the loop ────────────────────────────────────────────

#[cfg(test)]
mod reconciliation {
    use super::*;

    #[test]
    fn reappearing_agent_is_reactivated() {
        let mut c = scripted(test_config(4, 4));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        c.simulator_mut().vanish(AgentId(2));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        assert_eq!(c.tracker().uncontrolled_pending(), 1);
        // Replacement introduced this tick.
        assert_eq!(c.tracker().active_count(), 4);

        assert!(c.simulator_mut().revive(AgentId(2)));
        let mut rec = Recorder::default();
        c.run_ticks(1, &mut rec).unwrap();

        assert!(c.tracker().is_active(AgentId(2)));
        assert_eq!(c.tracker().uncontrolled_pending(), 0);
        assert_eq!(c.tracker().uncontrolled_total(), 1);
        assert_eq!(c.summary().reactivations, 1);
        assert_eq!(rec.count(FleetEventKind::Reactivated), 1);
        assert_eq!(c.tracker().active_count(), 5);
        assert_partition(&c);
    }
}

// ── Rerouting ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rerouting {
    use super::*;

    #[test]
    fn agent_on_last_edge_gets_new_sink() {
        let mut c = scripted(test_config(6, 6));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();
        assert!(c.simulator().retargets.is_empty());

        // A dead-end sink cannot be routed away from; pick an agent whose
        // sink continues.
        let agent = (0..6)
            .map(AgentId)
            .find(|&a| {
                let sim = c.simulator();
                let last = *sim.agent_route(a).unwrap().last().unwrap();
                !sim.network.edge(last).outgoing_fringe
            })
            .unwrap();
        c.simulator_mut().move_to_last_edge(agent);
        let old_edge = c.simulator().agent_edge(agent).unwrap();
        let mut rec = Recorder::default();
        c.run_ticks(1, &mut rec).unwrap();

        let retargets = &c.simulator().retargets;
        assert_eq!(retargets.len(), 1);
        assert_eq!(retargets[0].0, agent);
        let route = c.simulator().agent_route(agent).unwrap();
        assert_eq!(route.first(), Some(&old_edge));
        assert_eq!(route.last(), Some(&retargets[0].1));
        assert_eq!(c.summary().rerouted, 1);
        assert_eq!(rec.count(FleetEventKind::Rerouted), 1);
    }

    #[test]
    fn wider_window_reroutes_earlier() {
        let config = FleetConfig { reroute_window: 1_000, ..test_config(3, 3) };
        let mut c = scripted(config);
        c.run_ticks(2, &mut crate::NoopObserver).unwrap();
        // Tick 1 sees every agent inside the window.
        assert_eq!(c.summary().rerouted, 3);
    }
}

// ── Parking enforcement ───────────────────────────────────────────────────────

#[cfg(test)]
mod parking {
    use super::*;

    #[test]
    fn scheduled_events_forced_and_refilled() {
        let mut c = scripted_with(test_config(4, 4), burst(3, START + 3), 1_000);
        let mut rec = Recorder::default();
        c.run_ticks(5, &mut rec).unwrap();

        assert_eq!(c.summary().forced_parkings, 3);
        assert_eq!(c.simulator().removals.len(), 3);
        assert_eq!(rec.ends[3].2.forced_total, 3);
        assert_eq!(rec.ends[2].2.forced_total, 0);
        // Refilled within the same tick.
        assert_eq!(rec.ends[3].2.active, 4);
        assert_eq!(c.summary().introduced, 7);
        assert_partition(&c);
    }

    #[test]
    fn uncontrolled_parkings_offset_quota() {
        let mut c = scripted_with(test_config(4, 4), burst(3, START + 3), 1_000);
        c.run_ticks(3, &mut crate::NoopObserver).unwrap();
        c.simulator_mut().vanish(AgentId(0));
        c.simulator_mut().vanish(AgentId(1));
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();

        assert_eq!(c.summary().uncontrolled_parkings, 2);
        assert_eq!(c.summary().forced_parkings, 1);
        assert_eq!(c.tracker().uncontrolled_pending(), 0);
        assert_partition(&c);
    }

    #[test]
    fn surplus_uncontrolled_carries_forward() {
        let mut c = scripted_with(test_config(6, 6), burst(2, START + 3), 1_000);
        c.run_ticks(3, &mut crate::NoopObserver).unwrap();
        for i in 0..5 {
            c.simulator_mut().vanish(AgentId(i));
        }
        c.run_ticks(1, &mut crate::NoopObserver).unwrap();

        assert_eq!(c.summary().forced_parkings, 0);
        assert_eq!(c.tracker().uncontrolled_pending(), 3);
        assert_eq!(c.tracker().uncontrolled_total(), 5);
    }

    #[test]
    fn shortfall_is_clamped_and_counted() {
        let config = FleetConfig { max_new_per_second: 1, ..test_config(2, 1) };
        let mut c = scripted_with(config, burst(5, START + 1), 1_000);
        c.run_ticks(2, &mut crate::NoopObserver).unwrap();

        // Tick 0 introduces one agent; tick 1 introduces a second and then
        // owes five parkings.
        assert_eq!(c.summary().forced_parkings, 2);
        assert_eq!(c.summary().parking_shortfall, 3);
        assert_partition(&c);
    }

    #[test]
    fn long_steps_enforce_every_crossed_second_once() {
        let profile = DensityProfile::from_samples(
            (1..=4).map(|s| (START + s, 0.25)).collect(),
        )
        .unwrap();
        let schedule = build_schedule(8, START, START + 3600, &profile).unwrap();
        let mut c = scripted_with(test_config(10, 10), schedule, 5_000);
        let mut rec = Recorder::default();
        c.run_ticks(3, &mut rec).unwrap();

        let seconds: Vec<u64> = rec.starts.iter().map(|s| s.1).collect();
        assert_eq!(seconds, vec![START, START + 5, START + 10]);
        assert_eq!(rec.ends[0].2.forced_total, 0);
        assert_eq!(rec.ends[1].2.forced_total, 8);
        assert_eq!(rec.ends[2].2.forced_total, 8);
    }

    #[test]
    fn attach_mid_session_skips_past_seconds() {
        let profile = DensityProfile::from_samples(vec![(START + 2, 0.5), (START + 12, 0.5)]).unwrap();
        let schedule = build_schedule(6, START, START + 3600, &profile).unwrap();
        let net = grid();
        let mut sim = ScriptedSim::new(net.clone(), 1_000);
        for _ in 0..10 {
            sim.step().unwrap();
        }
        let mut c = ControllerBuilder::new(test_config(4, 4), sim, net)
            .schedule(schedule)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        c.run_ticks(4, &mut rec).unwrap();

        assert_eq!(rec.starts[0].1, START + 10);
        // Nothing owed for second +2; second +12 is enforced as usual.
        assert_eq!(rec.ends[0].2.forced_total, 0);
        assert_eq!(rec.ends[1].2.forced_total, 0);
        assert_eq!(rec.ends[2].2.forced_total, 3);
        assert_eq!(c.summary().forced_parkings, 3);
        assert_partition(&c);
    }

    #[test]
    fn vehicle_leaving_mid_removal_is_a_shortfall() {
        let mut c = scripted_with(test_config(2, 2), burst(2, START + 3), 1_000);
        c.run_ticks(3, &mut crate::NoopObserver).unwrap();
        c.simulator_mut().slippery.extend([AgentId(0), AgentId(1)]);

        let mut rec = Recorder::default();
        c.run_ticks(2, &mut rec).unwrap();

        assert_eq!(c.summary().forced_parkings, 0);
        assert_eq!(c.summary().parking_shortfall, 2);
        assert_eq!(rec.count(FleetEventKind::Vanished), 2);
        assert!(c.tracker().is_parked(AgentId(0)));
        assert!(c.tracker().is_parked(AgentId(1)));
        // Not charged again on the following reconcile.
        assert_eq!(c.summary().uncontrolled_parkings, 0);
        assert_eq!(c.tracker().uncontrolled_pending(), 0);
        assert_eq!(c.tracker().active_count(), 2);
        assert_partition(&c);
    }
}

// ── Trip exhaustion ───────────────────────────────────────────────────────────

#[cfg(test)]
mod exhaustion {
    use super::*;

    /// A 2×2 block with a lone node far to the north.  The diagonal admits a
    /// long floor that no drawable pair can meet.
    fn block_with_outpost() -> Arc<RoadNetwork> {
        let origin = GeoPoint::new(41.16, -8.62);
        let mut b = RoadNetworkBuilder::new();
        let n: Vec<_> = [(0.0, 0.0), (0.0, 100.0), (100.0, 0.0), (100.0, 100.0)]
            .iter()
            .map(|&(north, east)| b.add_node(origin.offset_m(north, east)))
            .collect();
        b.add_road(n[0], n[1], 100.0, 7_000);
        b.add_road(n[1], n[3], 100.0, 7_000);
        b.add_road(n[3], n[2], 100.0, 7_000);
        b.add_road(n[2], n[0], 100.0, 7_000);
        b.add_node(origin.offset_m(5_000.0, 0.0));
        Arc::new(b.build())
    }

    #[test]
    fn missing_trips_postpone_introductions() {
        let net = block_with_outpost();
        let config = FleetConfig { min_trip_distance_m: 2_000.0, max_trip_tries: 20, ..test_config(4, 4) };
        let mut c = ControllerBuilder::new(config, ScriptedSim::new(net.clone(), 1_000), net).build().unwrap();
        c.run_ticks(3, &mut crate::NoopObserver).unwrap();

        assert_eq!(c.summary().introduced, 0);
        // One failed attempt per tick; the rest of the tick's quota is skipped.
        assert_eq!(c.summary().trip_failures, 3);
        assert!(!c.tracker().is_stable());
        assert!(c.simulator().agent_ids().unwrap().is_empty());
    }
}

// ── Observer hooks ────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use super::*;

    #[test]
    fn trace_follows_interval() {
        let config = FleetConfig { trace_interval_ticks: 4, ..test_config(3, 3) };
        let mut c = scripted(config);
        let mut rec = Recorder::default();
        c.run_ticks(10, &mut rec).unwrap();
        assert_eq!(rec.starts.len(), 10);
        assert_eq!(rec.ends.len(), 10);
        assert_eq!(rec.traces, vec![Tick(0), Tick(4), Tick(8)]);
    }

    #[test]
    fn run_stops_at_horizon_and_closes() {
        let config = FleetConfig { stop_secs: START + 30, ..test_config(3, 3) };
        let mut c = scripted(config);
        let mut rec = Recorder::default();
        let summary = c.run(&mut rec).unwrap();

        assert_eq!(summary.ticks, 30);
        assert_eq!(rec.summary, Some(summary.clone()));
        assert_eq!(summary.final_active, 3);
        assert!(c.simulator().closed);
    }
}

// ── Properties over scripted runs ─────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn partition_and_stability_hold(
            ops in prop::collection::vec((0usize..4, any::<bool>()), 40),
        ) {
            let profile = DensityProfile::uniform(START, START + 40);
            let schedule = build_schedule(30, START, START + 3600, &profile).unwrap();
            let mut c = scripted_with(test_config(8, 3), schedule, 1_000);
            let mut was_stable = false;

            for (vanish, revive) in ops {
                let live = c.simulator().agent_ids().unwrap();
                for agent in live.into_iter().take(vanish) {
                    c.simulator_mut().vanish(agent);
                }
                let first_gone = c.simulator().gone.keys().next().copied();
                if let (true, Some(agent)) = (revive, first_gone) {
                    c.simulator_mut().revive(agent);
                }

                c.run_ticks(1, &mut crate::NoopObserver).unwrap();

                assert_partition(&c);
                let stable = c.tracker().is_stable();
                prop_assert!(stable || !was_stable);
                was_stable = stable;
            }
        }
    }
}

// ── Loopback simulator ────────────────────────────────────────────────────────

#[cfg(test)]
mod loopback {
    use super::*;
    use crate::LoopbackSimulator;

    /// 0 ─ 1 ─ 2 ─ 3 in a line, 1 s per edge.
    ///
    /// Edge ids: 0: 0→1, 1: 1→0, 2: 1→2, 3: 2→1, 4: 2→3, 5: 3→2.
    fn line() -> Arc<RoadNetwork> {
        let mut b = RoadNetworkBuilder::new();
        let n: Vec<_> = (0..4).map(|i| b.add_node(GeoPoint::new(0.0, i as f32 * 0.01))).collect();
        for w in n.windows(2) {
            b.add_road(w[0], w[1], 1_000.0, 1_000);
        }
        Arc::new(b.build())
    }

    #[test]
    fn agent_drives_route_and_leaves() {
        let mut sim = LoopbackSimulator::new(line());
        sim.add_route(RouteId(0), &[EdgeId(0), EdgeId(4)]).unwrap();
        sim.add_agent(AgentId(0), RouteId(0)).unwrap();
        assert_eq!(sim.agent_route(AgentId(0)).unwrap(), vec![EdgeId(0), EdgeId(2), EdgeId(4)]);

        let mut edges = vec![sim.agent_edge(AgentId(0)).unwrap()];
        for _ in 0..2 {
            sim.step().unwrap();
            edges.push(sim.agent_edge(AgentId(0)).unwrap());
        }
        assert_eq!(edges, vec![EdgeId(0), EdgeId(2), EdgeId(4)]);

        sim.step().unwrap();
        assert!(sim.agent_ids().unwrap().is_empty());
        assert_eq!(sim.arrivals(), 1);
        assert_eq!(sim.current_time_ms().unwrap(), 3_000);
    }

    #[test]
    fn long_steps_cross_several_edges() {
        let mut sim = LoopbackSimulator::new(line()).with_delta_t_ms(2_500);
        sim.add_route(RouteId(0), &[EdgeId(0), EdgeId(4)]).unwrap();
        sim.add_agent(AgentId(0), RouteId(0)).unwrap();
        sim.step().unwrap();
        assert_eq!(sim.agent_edge(AgentId(0)).unwrap(), EdgeId(4));
        sim.step().unwrap();
        assert_eq!(sim.agent_count().unwrap(), 0);
    }

    #[test]
    fn change_target_replaces_rest_of_route() {
        let mut sim = LoopbackSimulator::new(line());
        sim.add_route(RouteId(0), &[EdgeId(0), EdgeId(4)]).unwrap();
        sim.add_agent(AgentId(0), RouteId(0)).unwrap();
        sim.change_target(AgentId(0), EdgeId(1)).unwrap();
        assert_eq!(sim.agent_route(AgentId(0)).unwrap(), vec![EdgeId(0), EdgeId(1)]);
    }

    #[test]
    fn unreachable_target_is_rejected_but_not_fatal() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 0.01));
        let d = b.add_node(GeoPoint::new(0.01, 0.0));
        let e = b.add_node(GeoPoint::new(0.01, 0.01));
        b.add_directed_edge(a, c, 1_000.0, 1_000);
        b.add_directed_edge(d, e, 1_000.0, 1_000);
        let mut sim = LoopbackSimulator::new(Arc::new(b.build()));

        let err = sim.add_route(RouteId(0), &[EdgeId(0), EdgeId(1)]).unwrap_err();
        assert!(matches!(err, SimulatorError::NoRoute(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn bad_commands_are_errors() {
        let mut sim = LoopbackSimulator::new(line());
        assert!(matches!(sim.add_route(RouteId(0), &[]), Err(SimulatorError::Protocol(_))));
        assert!(matches!(sim.add_agent(AgentId(0), RouteId(9)), Err(SimulatorError::UnknownRoute(_))));
        assert!(matches!(sim.remove_agent(AgentId(3)), Err(SimulatorError::UnknownAgent(_))));

        sim.add_route(RouteId(0), &[EdgeId(0)]).unwrap();
        assert!(matches!(sim.add_route(RouteId(0), &[EdgeId(0)]), Err(SimulatorError::DuplicateRoute(_))));
        sim.add_agent(AgentId(0), RouteId(0)).unwrap();
        assert!(matches!(sim.add_agent(AgentId(0), RouteId(0)), Err(SimulatorError::DuplicateAgent(_))));
        sim.remove_agent(AgentId(0)).unwrap();
        assert_eq!(sim.arrivals(), 0);
    }

    #[test]
    fn routes_are_consumed_by_their_agent() {
        let mut sim = LoopbackSimulator::new(line());
        sim.add_route(RouteId(0), &[EdgeId(0), EdgeId(2)]).unwrap();
        sim.add_agent(AgentId(0), RouteId(0)).unwrap();
        assert!(matches!(sim.add_agent(AgentId(1), RouteId(0)), Err(SimulatorError::UnknownRoute(_))));

        // The id is free again and the first agent still drives its copy.
        sim.add_route(RouteId(0), &[EdgeId(4)]).unwrap();
        sim.add_agent(AgentId(1), RouteId(0)).unwrap();
        assert_eq!(sim.agent_ids().unwrap(), vec![AgentId(0), AgentId(1)]);
        assert_eq!(sim.agent_route(AgentId(0)).unwrap(), vec![EdgeId(0), EdgeId(2)]);
    }

    #[test]
    fn closed_session_refuses_everything() {
        let mut sim = LoopbackSimulator::new(line());
        sim.close().unwrap();
        assert!(sim.is_closed());
        assert!(matches!(sim.step(), Err(SimulatorError::Closed)));
        assert!(matches!(sim.agent_ids(), Err(SimulatorError::Closed)));
        assert!(matches!(sim.close(), Err(SimulatorError::Closed)));
        assert!(sim.delta_t_ms().unwrap_err().is_fatal());
    }

    fn loopback_run(seed: u64) -> (RunSummary, FleetController<LoopbackSimulator>) {
        let net = grid();
        let config = FleetConfig {
            seed,
            start_secs:         START,
            stop_secs:          START + 600,
            target_active:      20,
            max_new_per_second: 4,
            parking_events:     100,
            ..FleetConfig::default()
        };
        let mut c = ControllerBuilder::new(config, LoopbackSimulator::new(net.clone()), net)
            .build()
            .unwrap();
        let summary = c.run(&mut crate::NoopObserver).unwrap();
        (summary, c)
    }

    #[test]
    fn end_to_end_run() {
        let (summary, c) = loopback_run(31_338);

        assert_eq!(summary.ticks, 600);
        assert_eq!(summary.stable_at, Some(Tick(4)));
        assert!(summary.forced_parkings > 0);
        assert!(summary.forced_parkings <= 100);
        assert_eq!(summary.introduced, (summary.final_active + summary.final_parked) as u64);
        assert!(summary.final_active <= 20);
        assert!(c.simulator().is_closed());
        assert_partition(&c);
    }

    #[test]
    fn same_seed_same_run() {
        let (a, _) = loopback_run(5);
        let (b, _) = loopback_run(5);
        assert_eq!(a, b);
    }
}
