//! In-process [`TrafficSimulator`] over a shared [`RoadNetwork`].
//!
//! Agents drive their routes edge by edge at free-flow speed: each edge
//! takes its `edge_travel_ms`, and time left over at the end of an edge is
//! spent on the next one within the same step.  An agent that finishes the
//! last edge of its route is removed in that step without notice, which is
//! how the external simulator behaves on arrival.
//!
//! Routes are registered as waypoint lists and expanded with the router,
//! the same way the external simulator fills in a two-edge trip.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use fc_core::{AgentId, EdgeId, RouteId};
use fc_network::{DijkstraRouter, RoadNetwork, Router, connect_edges};

use crate::{SimulatorError, SimulatorResult, TrafficSimulator};

/// Default step length.
pub const DEFAULT_DELTA_T_MS: u64 = 1_000;

/// Movement state of one loopback agent.
#[derive(Clone, Debug)]
struct Vehicle {
    route:        Vec<EdgeId>,
    /// Index into `route` of the edge being driven.
    position:     usize,
    /// Milliseconds still needed to reach the end of the current edge.
    remaining_ms: u64,
}

impl Vehicle {
    fn current_edge(&self) -> EdgeId {
        self.route[self.position]
    }
}

pub struct LoopbackSimulator<R: Router = DijkstraRouter> {
    network:    Arc<RoadNetwork>,
    router:     R,
    delta_t_ms: u64,
    now_ms:     u64,
    routes:     HashMap<RouteId, Vec<EdgeId>>,
    vehicles:   BTreeMap<AgentId, Vehicle>,
    arrivals:   u64,
    closed:     bool,
}

impl LoopbackSimulator<DijkstraRouter> {
    pub fn new(network: Arc<RoadNetwork>) -> Self {
        Self::with_router(network, DijkstraRouter)
    }
}

impl<R: Router> LoopbackSimulator<R> {
    pub fn with_router(network: Arc<RoadNetwork>, router: R) -> Self {
        Self {
            network,
            router,
            delta_t_ms: DEFAULT_DELTA_T_MS,
            now_ms:     0,
            routes:     HashMap::new(),
            vehicles:   BTreeMap::new(),
            arrivals:   0,
            closed:     false,
        }
    }

    /// Change the step length.  Values below 1 ms are raised to 1 ms.
    pub fn with_delta_t_ms(mut self, delta_t_ms: u64) -> Self {
        self.delta_t_ms = delta_t_ms.max(1);
        self
    }

    /// Agents removed on reaching the end of their route so far.
    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> SimulatorResult<()> {
        if self.closed { Err(SimulatorError::Closed) } else { Ok(()) }
    }

    fn vehicle(&self, agent: AgentId) -> SimulatorResult<&Vehicle> {
        self.vehicles.get(&agent).ok_or(SimulatorError::UnknownAgent(agent))
    }

    fn travel_ms(&self, edge: EdgeId) -> u64 {
        self.network.edge_travel_ms[edge.index()] as u64
    }
}

impl<R: Router> TrafficSimulator for LoopbackSimulator<R> {
    fn current_time_ms(&self) -> SimulatorResult<u64> {
        self.ensure_open()?;
        Ok(self.now_ms)
    }

    fn delta_t_ms(&self) -> SimulatorResult<u64> {
        self.ensure_open()?;
        Ok(self.delta_t_ms)
    }

    fn agent_ids(&self) -> SimulatorResult<Vec<AgentId>> {
        self.ensure_open()?;
        Ok(self.vehicles.keys().copied().collect())
    }

    fn agent_count(&self) -> SimulatorResult<usize> {
        self.ensure_open()?;
        Ok(self.vehicles.len())
    }

    fn agent_edge(&self, agent: AgentId) -> SimulatorResult<EdgeId> {
        self.ensure_open()?;
        Ok(self.vehicle(agent)?.current_edge())
    }

    fn agent_route(&self, agent: AgentId) -> SimulatorResult<Vec<EdgeId>> {
        self.ensure_open()?;
        Ok(self.vehicle(agent)?.route.clone())
    }

    fn add_route(&mut self, route: RouteId, waypoints: &[EdgeId]) -> SimulatorResult<()> {
        self.ensure_open()?;
        if self.routes.contains_key(&route) {
            return Err(SimulatorError::DuplicateRoute(route));
        }
        if waypoints.is_empty() {
            return Err(SimulatorError::Protocol(format!("route {route} has no edges")));
        }
        let edges = connect_edges(&self.router, &self.network, waypoints)?;
        self.routes.insert(route, edges);
        Ok(())
    }

    fn add_agent(&mut self, agent: AgentId, route: RouteId) -> SimulatorResult<()> {
        self.ensure_open()?;
        if self.vehicles.contains_key(&agent) {
            return Err(SimulatorError::DuplicateAgent(agent));
        }
        // A route is consumed by the agent that drives it.
        let edges = self.routes.remove(&route).ok_or(SimulatorError::UnknownRoute(route))?;
        let remaining_ms = self.travel_ms(edges[0]);
        let vehicle = Vehicle { route: edges, position: 0, remaining_ms };
        self.vehicles.insert(agent, vehicle);
        Ok(())
    }

    fn change_target(&mut self, agent: AgentId, target: EdgeId) -> SimulatorResult<()> {
        self.ensure_open()?;
        let current = self.vehicle(agent)?.current_edge();
        let path = connect_edges(&self.router, &self.network, &[current, target])?;
        if let Some(vehicle) = self.vehicles.get_mut(&agent) {
            vehicle.route = path;
            vehicle.position = 0;
        }
        Ok(())
    }

    fn remove_agent(&mut self, agent: AgentId) -> SimulatorResult<()> {
        self.ensure_open()?;
        self.vehicles.remove(&agent).map(|_| ()).ok_or(SimulatorError::UnknownAgent(agent))
    }

    fn step(&mut self) -> SimulatorResult<()> {
        self.ensure_open()?;
        self.now_ms += self.delta_t_ms;

        let network = &self.network;
        let delta = self.delta_t_ms;
        let before = self.vehicles.len();
        self.vehicles.retain(|_, v| {
            let mut budget = delta;
            while budget >= v.remaining_ms {
                budget -= v.remaining_ms;
                v.position += 1;
                match v.route.get(v.position) {
                    Some(edge) => v.remaining_ms = network.edge_travel_ms[edge.index()] as u64,
                    None => return false,
                }
            }
            v.remaining_ms -= budget;
            true
        });
        self.arrivals += (before - self.vehicles.len()) as u64;
        Ok(())
    }

    fn close(&mut self) -> SimulatorResult<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}
