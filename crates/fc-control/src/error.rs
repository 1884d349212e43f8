use thiserror::Error;

use fc_core::{AgentId, FcError, RouteId};
use fc_demand::DemandError;
use fc_network::NetworkError;
use fc_schedule::ScheduleError;

/// Failures reported across the simulator boundary.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The connection was closed, by us or by the other side.
    #[error("simulator connection is closed")]
    Closed,

    #[error("simulator does not know agent {0}")]
    UnknownAgent(AgentId),

    #[error("simulator does not know route {0}")]
    UnknownRoute(RouteId),

    #[error("agent {0} already exists")]
    DuplicateAgent(AgentId),

    #[error("route {0} already exists")]
    DuplicateRoute(RouteId),

    /// The simulator could not connect the requested edges.  The command is
    /// rejected but the session stays usable.
    #[error("simulator rejected route: {0}")]
    NoRoute(#[from] NetworkError),

    #[error("simulator protocol error: {0}")]
    Protocol(String),
}

impl SimulatorError {
    /// `false` only for command rejections after which the run can go on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SimulatorError::NoRoute(_))
    }
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("configuration error: {0}")]
    Config(#[from] FcError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("simulator error: {0}")]
    Simulator(#[from] SimulatorError),
}

pub type ControlResult<T> = Result<T, ControlError>;
