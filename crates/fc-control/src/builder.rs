//! Fluent builder for constructing a [`FleetController`].

use std::sync::Arc;

use tracing::{debug, info};

use fc_core::{AgentId, FleetConfig, SimClock, SimRng, Tick, format_hm};
use fc_demand::TripGenerator;
use fc_network::RoadNetwork;
use fc_schedule::{DensityProfile, ParkingSchedule, build_schedule};

use crate::{ControlResult, FleetController, FleetTracker, RunSummary, TrafficSimulator};

/// RNG stream offsets split off the root seed.
const TRIP_STREAM: u64 = 0;
const PARK_STREAM: u64 = 1;

/// Fluent builder for [`FleetController<S>`].
///
/// # Required inputs
///
/// - [`FleetConfig`]: seed, window, target, distance floor, …
/// - `S: TrafficSimulator`: an open simulator session
/// - the shared [`RoadNetwork`] trips are drawn from
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                              |
/// |-----------------|------------------------------------------------------|
/// | `.density(p)`   | `DensityProfile::uniform(start_secs, stop_secs)`     |
/// | `.schedule(s)`  | built from the density profile and `parking_events`  |
///
/// # Example
///
/// ```rust,ignore
/// let sim = LoopbackSimulator::new(network.clone());
/// let mut controller = ControllerBuilder::new(config, sim, network)
///     .density(load_density_csv(path)?)
///     .build()?;
/// let summary = controller.run(&mut NoopObserver)?;
/// ```
pub struct ControllerBuilder<S: TrafficSimulator> {
    config:   FleetConfig,
    sim:      S,
    network:  Arc<RoadNetwork>,
    density:  Option<DensityProfile>,
    schedule: Option<ParkingSchedule>,
}

impl<S: TrafficSimulator> ControllerBuilder<S> {
    pub fn new(config: FleetConfig, sim: S, network: Arc<RoadNetwork>) -> Self {
        Self { config, sim, network, density: None, schedule: None }
    }

    /// Empirical parking density used to spread `parking_events` over the
    /// run window.
    pub fn density(mut self, density: DensityProfile) -> Self {
        self.density = Some(density);
        self
    }

    /// Use a ready-made schedule; `parking_events` and any density profile
    /// are then ignored.
    pub fn schedule(mut self, schedule: ParkingSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Validate the configuration, build the trip generator and parking
    /// schedule, and read the simulator's clock.
    pub fn build(self) -> ControlResult<FleetController<S>> {
        let config = self.config;
        config.validate()?;

        let trips = TripGenerator::from_config(self.network, &config)?;

        let schedule = match self.schedule {
            Some(s) => s,
            None => {
                let density = self
                    .density
                    .unwrap_or_else(|| DensityProfile::uniform(config.start_secs, config.stop_secs));
                build_schedule(config.parking_events, config.start_secs, config.stop_secs, &density)?
            }
        };
        info!(
            "Forcing {} parking events from {} to {} ({} requested)",
            schedule.total(),
            format_hm(config.start_secs),
            format_hm(config.stop_secs),
            config.parking_events
        );

        let mut root = SimRng::new(config.seed);
        let trip_rng = root.child(TRIP_STREAM);
        let park_rng = root.child(PARK_STREAM);

        let mut clock = SimClock::new(config.start_secs);
        clock.set_elapsed_ms(self.sim.current_time_ms()?);
        debug!(step_ms = self.sim.delta_t_ms()?, at = %clock, "simulator session ready");

        // Seconds already elapsed on attach are not owed.
        let next_second = clock.second_of_day();

        Ok(FleetController {
            next_second,
            config,
            sim:         self.sim,
            trips,
            schedule,
            tracker:     FleetTracker::new(),
            clock,
            tick:        Tick::ZERO,
            next_agent:  AgentId(0),
            trip_rng,
            park_rng,
            summary:     RunSummary::default(),
            events:      Vec::new(),
        })
    }
}
