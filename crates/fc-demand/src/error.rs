//! Demand-generation error type.

use thiserror::Error;

use fc_core::EdgeId;

#[derive(Debug, Error)]
pub enum DemandError {
    /// Every edge was given zero weight (or a weight was unusable), so the
    /// sampler has nothing to draw from.
    #[error("no usable {role} edges: {reason}")]
    InvalidWeights { role: &'static str, reason: String },

    /// The distance floor exceeds the network's bounding-box diagonal, so no
    /// pair of edges can ever satisfy it.
    #[error("cannot achieve a minimum trip length of {min_m} m in a network with diameter {diagonal_m} m")]
    UnsatisfiableDistance { min_m: f64, diagonal_m: f64 },

    /// No drawn pair met the distance floor.  Recoverable: the caller may
    /// try again later.
    #[error("no trip of at least {min_m} m found in {tries} tries")]
    TripNotFound { tries: u32, min_m: f64 },

    #[error("edge {0} is not part of the network")]
    UnknownEdge(EdgeId),
}

impl DemandError {
    /// `true` for errors a running controller can shrug off and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DemandError::TripNotFound { .. })
    }
}

pub type DemandResult<T> = Result<T, DemandError>;
