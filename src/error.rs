use thiserror::Error;

/// Speedometer error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeedometerError {
    #[error(
        "Vincenty iteration did not converge after {iterations} iterations \
         ({lat1}, {lon1}) -> ({lat2}, {lon2})"
    )]
    SolverNonConvergence {
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
        iterations: u32,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SpeedometerError>;

impl From<config::ConfigError> for SpeedometerError {
    fn from(err: config::ConfigError) -> Self {
        SpeedometerError::InvalidConfig(err.to_string())
    }
}
