use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("density parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schedule window [{start}, {end}) is empty")]
    InvalidWindow { start: u64, end: u64 },

    #[error("density at second {second} is {value}; densities must be finite and non-negative")]
    InvalidDensity { second: u64, value: f64 },

    #[error("density listed twice for second {0}")]
    DuplicateSecond(u64),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
