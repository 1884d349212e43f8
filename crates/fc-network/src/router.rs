//! Routing trait and default Dijkstra implementation.
//!
//! The fleet controller never routes; it only picks endpoints.  Routing is
//! needed by in-process simulators, which (like SUMO) accept a list of
//! waypoint edges and fill in the path between them.
//!
//! Costs are free-flow travel times in milliseconds.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use fc_core::{EdgeId, NodeId};

use crate::network::RoadNetwork;
use crate::{NetworkError, NetworkResult};

// ── Route ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Route {
    /// Edges to traverse in order.
    pub edges: Vec<EdgeId>,
    pub total_travel_secs: f32,
}

impl Route {
    /// `true` if source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable node-to-node shortest-path engine.
pub trait Router {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> NetworkResult<Route>;
}

/// Join consecutive waypoint edges into one drivable edge sequence.
///
/// The result starts with the first waypoint and ends with the last; between
/// waypoints `a` and `b` it inserts the shortest path from `a`'s to-node to
/// `b`'s from-node.  Repeated waypoints collapse.
pub fn connect_edges<R: Router + ?Sized>(
    router:    &R,
    network:   &RoadNetwork,
    waypoints: &[EdgeId],
) -> NetworkResult<Vec<EdgeId>> {
    for &w in waypoints {
        if !network.contains_edge(w) {
            return Err(NetworkError::EdgeNotFound(w));
        }
    }
    let Some((&first, rest)) = waypoints.split_first() else {
        return Ok(Vec::new());
    };

    let mut path = vec![first];
    let mut last = first;
    for &next in rest {
        if next == last {
            continue;
        }
        let leg = router.route(
            network,
            network.edge_to[last.index()],
            network.edge_from[next.index()],
        )?;
        path.extend(leg.edges);
        path.push(next);
        last = next;
    }
    Ok(path)
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra over `edge_travel_ms`.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> NetworkResult<Route> {
        let n = network.node_count();
        if from.index() >= n {
            return Err(NetworkError::NodeNotFound(from));
        }
        if to.index() >= n {
            return Err(NetworkError::NodeNotFound(to));
        }
        if from == to {
            return Ok(Route { edges: vec![], total_travel_secs: 0.0 });
        }

        let mut dist      = vec![u32::MAX; n];
        let mut prev_edge = vec![EdgeId::INVALID; n];
        dist[from.index()] = 0;

        // NodeId as secondary key keeps tie-breaking deterministic.
        let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Ok(reconstruct(network, &prev_edge, to, cost));
            }
            if cost > dist[node.index()] {
                continue;
            }
            for edge in network.out_edges(node) {
                let neighbor = network.edge_to[edge.index()];
                let new_cost = cost.saturating_add(network.edge_travel_ms[edge.index()]);
                if new_cost < dist[neighbor.index()] {
                    dist[neighbor.index()] = new_cost;
                    prev_edge[neighbor.index()] = edge;
                    heap.push(Reverse((new_cost, neighbor)));
                }
            }
        }

        Err(NetworkError::NoRoute { from, to })
    }
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[EdgeId], to: NodeId, total_ms: u32) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    Route {
        edges,
        total_travel_secs: total_ms as f32 / 1000.0,
    }
}
