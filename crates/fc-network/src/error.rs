//! Network-subsystem error type.

use thiserror::Error;

use fc_core::{EdgeId, NodeId};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("edge {0} not found in network")]
    EdgeNotFound(EdgeId),

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
