mod alignment;
mod engine;
mod error;
mod params;
mod random;
mod types;

pub use alignment::{AlignmentScore, AssetClass, Holding, parse_holdings, score_alignment};
pub use engine::{Execution, SimulationOptions, aggregate, simulate, simulate_path, simulate_with};
pub use error::{SimResult, SimulationError};
pub use params::{PERIODS_PER_YEAR, ResolvedParameters, resolve_parameters};
pub use random::{RandomStream, STREAM_CAPACITY, derive_seed, fnv1a, path_seed, path_stride};
pub use types::{
    CycleKey, DEFAULT_PATH_COUNT, DEFAULT_PERIOD_COUNT, EnvironmentParameters, PathOutcome,
    RequestFingerprint, ScenarioKey, ScenarioParameters, SimulationRequest, SimulationResult,
};
