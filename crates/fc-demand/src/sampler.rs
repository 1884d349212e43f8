//! Discrete inverse-CDF edge sampler.
//!
//! Construction walks the network once and records a prefix sum of edge
//! weights.  A draw picks `r` uniformly in `[0, total)` and binary-searches
//! for the first prefix sum strictly greater than `r`, so each edge is
//! returned with probability `w(edge) / total`.  Zero-weight edges share
//! their predecessor's prefix sum and can never be selected.
//!
//! Build: O(E).  Draw: O(log E).

use fc_core::{EdgeId, SimRng};
use fc_network::{EdgeView, RoadNetwork};

use crate::{DemandError, DemandResult};

// ── Weight policy ─────────────────────────────────────────────────────────────

/// Which end of a trip a sampler produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FringeRole {
    Source,
    Sink,
}

impl FringeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            FringeRole::Source => "source",
            FringeRole::Sink   => "sink",
        }
    }

    /// Weight of `edge` for this role.
    ///
    /// | Edge                                  | Source       | Sink         |
    /// |---------------------------------------|--------------|--------------|
    /// | outgoing-fringe (dead end ahead)      | 0            | × factor     |
    /// | incoming-fringe (nothing feeds it)    | × factor     | 0            |
    /// | interior                              | 1            | 1            |
    ///
    /// An edge that is fringe both ways is always forbidden.
    pub fn weight(self, edge: &EdgeView, fringe_factor: f64) -> f64 {
        let (bonus, forbidden) = match self {
            FringeRole::Source => (edge.incoming_fringe, edge.outgoing_fringe),
            FringeRole::Sink   => (edge.outgoing_fringe, edge.incoming_fringe),
        };
        if forbidden {
            return 0.0;
        }
        if bonus && fringe_factor != 1.0 {
            return fringe_factor;
        }
        1.0
    }
}

// ── WeightedEdgeSampler ───────────────────────────────────────────────────────

/// Draws edges with probability proportional to a weight function.
#[derive(Clone, Debug)]
pub struct WeightedEdgeSampler {
    /// `cumulative[i]` = sum of weights of edges `0..=i`.
    cumulative: Vec<f64>,
    total: f64,
    /// Highest index with positive weight; fallback for a draw that rounds
    /// up to `total`.
    last_positive: usize,
}

impl WeightedEdgeSampler {
    /// Build a sampler over every edge of `network`.
    ///
    /// Fails with [`DemandError::InvalidWeights`] if the weights sum to zero
    /// or any weight is negative or not finite.
    pub fn new<F>(network: &RoadNetwork, weight: F) -> DemandResult<Self>
    where
        F: Fn(&EdgeView) -> f64,
    {
        Self::build(network, "weighted", weight)
    }

    /// Sampler for one end of a trip, using the fringe weight policy.
    pub fn for_role(network: &RoadNetwork, role: FringeRole, fringe_factor: f64) -> DemandResult<Self> {
        Self::build(network, role.as_str(), |e| role.weight(e, fringe_factor))
    }

    fn build<F>(network: &RoadNetwork, role: &'static str, weight: F) -> DemandResult<Self>
    where
        F: Fn(&EdgeView) -> f64,
    {
        let mut cumulative = Vec::with_capacity(network.edge_count());
        let mut total = 0.0f64;
        let mut last_positive = 0;

        for edge in network.edges() {
            let w = weight(&edge);
            if !(w.is_finite() && w >= 0.0) {
                return Err(DemandError::InvalidWeights {
                    role,
                    reason: format!("edge {} has weight {w}", edge.id),
                });
            }
            if w > 0.0 {
                last_positive = cumulative.len();
            }
            total += w;
            cumulative.push(total);
        }

        if total <= 0.0 {
            return Err(DemandError::InvalidWeights {
                role,
                reason: format!("total weight over {} edges is zero", cumulative.len()),
            });
        }

        Ok(Self { cumulative, total, last_positive })
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Number of edges covered, including zero-weight ones.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Probability that a draw returns `edge`.
    pub fn probability(&self, edge: EdgeId) -> f64 {
        let i = edge.index();
        if i >= self.cumulative.len() {
            return 0.0;
        }
        let below = if i == 0 { 0.0 } else { self.cumulative[i - 1] };
        (self.cumulative[i] - below) / self.total
    }

    /// Draw one edge.
    pub fn sample(&self, rng: &mut SimRng) -> EdgeId {
        let r = rng.random::<f64>() * self.total;
        let mut index = self.cumulative.partition_point(|&c| c <= r);
        if index >= self.cumulative.len() {
            index = self.last_positive;
        }
        EdgeId(index as u32)
    }
}
