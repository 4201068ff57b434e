use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("beta must be a finite number >= 0, got {0}")]
    InvalidBeta(f64),
    #[error("environmentScore must be a finite number, got {0}")]
    InvalidEnvironmentScore(f64),
    #[error("pathCount must be >= 1")]
    InvalidPathCount,
    #[error(
        "pathCount x periodCount exceeds the random stream capacity \
         ({path_count} paths x {period_count} periods)"
    )]
    StreamCapacityExceeded {
        path_count: usize,
        period_count: usize,
    },
    #[error("unknown cycleKey `{0}`")]
    UnknownCycle(String),
    #[error("unknown scenarioKey `{0}`")]
    UnknownScenario(String),
    #[error("{field} is out of range: {value}")]
    InvalidParameter { field: &'static str, value: f64 },
    #[error("invalid holdings: {0}")]
    InvalidHoldings(String),
}

pub type SimResult<T> = Result<T, SimulationError>;
