//! Distance-constrained trip generation.

use std::sync::Arc;

use tracing::debug;

use fc_core::{EdgeId, FleetConfig, SimRng};
use fc_network::RoadNetwork;

use crate::{DemandError, DemandResult, FringeRole, WeightedEdgeSampler};

/// An origin/destination assignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Trip {
    pub source: EdgeId,
    pub sink: EdgeId,
}

impl Trip {
    /// Straight-line distance from the source edge's start node to the sink
    /// edge's end node.  This is the quantity the distance floor applies to.
    pub fn straight_line_m(&self, network: &RoadNetwork) -> f64 {
        let from = network.edge(self.source).from_pos;
        let to = network.edge(self.sink).to_pos;
        from.distance_m(to) as f64
    }
}

/// Pairs a source-biased and a sink-biased sampler over one shared network.
pub struct TripGenerator {
    network: Arc<RoadNetwork>,
    source: WeightedEdgeSampler,
    sink: WeightedEdgeSampler,
    min_distance_m: f64,
    max_tries: u32,
}

impl TripGenerator {
    /// Validate the distance floor against the network and build both
    /// samplers.
    ///
    /// # Errors
    /// - [`DemandError::UnsatisfiableDistance`] if `min_distance_m` exceeds
    ///   the bounding-box diagonal.
    /// - [`DemandError::InvalidWeights`] if either role has no usable edge.
    pub fn new(
        network:        Arc<RoadNetwork>,
        fringe_factor:  f64,
        min_distance_m: f64,
        max_tries:      u32,
    ) -> DemandResult<Self> {
        let diagonal_m = network.bbox_diagonal_m() as f64;
        if min_distance_m > diagonal_m {
            return Err(DemandError::UnsatisfiableDistance { min_m: min_distance_m, diagonal_m });
        }

        let source = WeightedEdgeSampler::for_role(&network, FringeRole::Source, fringe_factor)?;
        let sink = WeightedEdgeSampler::for_role(&network, FringeRole::Sink, fringe_factor)?;
        debug!(
            edges = network.edge_count(),
            source_weight = source.total_weight(),
            sink_weight = sink.total_weight(),
            diagonal_m,
            "trip generator ready"
        );

        Ok(Self { network, source, sink, min_distance_m, max_tries })
    }

    /// [`new`](Self::new) with the fringe factor, distance floor and try
    /// budget taken from `config`.
    pub fn from_config(network: Arc<RoadNetwork>, config: &FleetConfig) -> DemandResult<Self> {
        Self::new(network, config.fringe_factor, config.min_trip_distance_m, config.max_trip_tries)
    }

    pub fn min_distance_m(&self) -> f64 {
        self.min_distance_m
    }

    /// A trip with the configured floor and try budget.
    pub fn trip(&self, rng: &mut SimRng) -> DemandResult<Trip> {
        self.get_trip(self.min_distance_m, self.max_tries, rng)
    }

    /// A trip from `source` with the configured floor and try budget.
    pub fn trip_from(&self, source: EdgeId, rng: &mut SimRng) -> DemandResult<Trip> {
        self.get_trip_with_source(source, self.min_distance_m, self.max_tries, rng)
    }

    /// Draw independent (source, sink) pairs until one is at least
    /// `min_distance_m` apart, giving up after `max_tries` draws.
    pub fn get_trip(&self, min_distance_m: f64, max_tries: u32, rng: &mut SimRng) -> DemandResult<Trip> {
        for _ in 0..max_tries {
            let trip = Trip {
                source: self.source.sample(rng),
                sink:   self.sink.sample(rng),
            };
            if trip.straight_line_m(&self.network) >= min_distance_m {
                return Ok(trip);
            }
        }
        Err(DemandError::TripNotFound { tries: max_tries, min_m: min_distance_m })
    }

    /// Like [`get_trip`](Self::get_trip) but with the source pinned; only the
    /// sink is redrawn.
    pub fn get_trip_with_source(
        &self,
        source:         EdgeId,
        min_distance_m: f64,
        max_tries:      u32,
        rng:            &mut SimRng,
    ) -> DemandResult<Trip> {
        if !self.network.contains_edge(source) {
            return Err(DemandError::UnknownEdge(source));
        }
        for _ in 0..max_tries {
            let trip = Trip { source, sink: self.sink.sample(rng) };
            if trip.straight_line_m(&self.network) >= min_distance_m {
                return Ok(trip);
            }
        }
        Err(DemandError::TripNotFound { tries: max_tries, min_m: min_distance_m })
    }
}
