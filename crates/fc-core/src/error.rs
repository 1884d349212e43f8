//! Base error type for `fc-core`.

use thiserror::Error;

/// Errors raised by core types, chiefly configuration validation.
#[derive(Debug, Error)]
pub enum FcError {
    #[error("configuration error: {0}")]
    Config(String),
}

pub type FcResult<T> = Result<T, FcError>;
