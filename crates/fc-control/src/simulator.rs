//! The boundary with the external traffic simulator.
//!
//! The controller drives the simulator through this trait and nothing else.
//! Calls are synchronous; each may fail, and apart from route rejections
//! (see [`SimulatorError::is_fatal`]) any failure aborts the run.
//!
//! Time is reported in milliseconds since the session began.

use fc_core::{AgentId, EdgeId, RouteId};

use crate::SimulatorResult;

pub trait TrafficSimulator {
    // ── Queries ───────────────────────────────────────────────────────────

    /// Milliseconds of simulated time elapsed.
    fn current_time_ms(&self) -> SimulatorResult<u64>;

    /// Milliseconds one [`step`](Self::step) advances.
    fn delta_t_ms(&self) -> SimulatorResult<u64>;

    /// Agents currently driving, in ascending id order.
    fn agent_ids(&self) -> SimulatorResult<Vec<AgentId>>;

    fn agent_count(&self) -> SimulatorResult<usize> {
        Ok(self.agent_ids()?.len())
    }

    /// The edge `agent` is on.
    fn agent_edge(&self, agent: AgentId) -> SimulatorResult<EdgeId>;

    /// The full edge sequence `agent` is following.
    fn agent_route(&self, agent: AgentId) -> SimulatorResult<Vec<EdgeId>>;

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Register a route through the given waypoint edges.  The simulator
    /// fills in the path between consecutive waypoints.
    fn add_route(&mut self, route: RouteId, waypoints: &[EdgeId]) -> SimulatorResult<()>;

    /// Insert `agent` at the start of `route`.
    fn add_agent(&mut self, agent: AgentId, route: RouteId) -> SimulatorResult<()>;

    /// Send `agent` to `target` from wherever it is now.
    fn change_target(&mut self, agent: AgentId, target: EdgeId) -> SimulatorResult<()>;

    /// Take `agent` out of the simulation.
    fn remove_agent(&mut self, agent: AgentId) -> SimulatorResult<()>;

    /// Advance simulated time by one step.
    fn step(&mut self) -> SimulatorResult<()>;

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// End the session.  Every later call fails with
    /// [`SimulatorError::Closed`](crate::SimulatorError::Closed).
    fn close(&mut self) -> SimulatorResult<()>;
}
