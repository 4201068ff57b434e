use rayon::prelude::*;
use tracing::{debug, warn};

use super::error::{SimResult, SimulationError};
use super::params::{ResolvedParameters, clamp_environment_score, resolve_parameters};
use super::random::{RandomStream, STREAM_CAPACITY, derive_seed, path_seed, path_stride};
use super::types::{
    EnvironmentParameters, PathOutcome, ScenarioParameters, SimulationRequest, SimulationResult,
};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Execution {
    Sequential,
    #[default]
    Parallel,
}

/// Per-call knobs that are not part of the request itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimulationOptions {
    pub execution: Execution,
    /// Replaces the scenario catalog row for this call. The seed still uses
    /// the request's scenario key.
    pub scenario_override: Option<ScenarioParameters>,
    pub environment_override: Option<EnvironmentParameters>,
}

pub fn simulate(request: &SimulationRequest) -> SimResult<SimulationResult> {
    simulate_with(request, &SimulationOptions::default())
}

pub fn simulate_with(
    request: &SimulationRequest,
    options: &SimulationOptions,
) -> SimResult<SimulationResult> {
    if request.path_count == 0 {
        return Err(SimulationError::InvalidPathCount);
    }
    let stride = path_stride(request.period_count);
    if (request.path_count as u64)
        .checked_mul(stride)
        .is_none_or(|steps| steps > STREAM_CAPACITY)
    {
        return Err(SimulationError::StreamCapacityExceeded {
            path_count: request.path_count,
            period_count: request.period_count,
        });
    }

    let scenario = options
        .scenario_override
        .unwrap_or_else(|| request.scenario.parameters());
    let environment = options
        .environment_override
        .unwrap_or_else(|| request.cycle.parameters());
    let params =
        resolve_parameters(request.beta, request.environment_score, scenario, environment)?;

    let score = clamp_environment_score(request.environment_score)?;
    if score != request.environment_score {
        warn!(
            subject = %request.subject_key,
            raw = request.environment_score,
            clamped = score,
            "environment score outside [0, 100], clamped"
        );
    }
    let base_seed = derive_seed(
        &request.subject_key,
        request.cycle,
        request.scenario,
        score.round() as u32,
    );
    debug!(
        subject = %request.subject_key,
        cycle = %request.cycle,
        scenario = %request.scenario,
        base_seed,
        stride,
        mu_period = params.mu_period,
        sigma_period = params.sigma_period,
        paths = request.path_count,
        periods = request.period_count,
        "resolved simulation parameters"
    );

    let outcomes = run_paths(
        &params,
        base_seed,
        stride,
        request.path_count,
        request.period_count,
        options.execution,
    );
    let result = aggregate(outcomes);
    debug!(
        median = result.median,
        upside95 = result.upside95,
        downside5 = result.downside5,
        tail_drawdown95 = result.tail_drawdown95,
        "simulation complete"
    );
    Ok(result)
}

fn run_paths(
    params: &ResolvedParameters,
    base_seed: u32,
    stride: u64,
    path_count: usize,
    period_count: usize,
    execution: Execution,
) -> Vec<PathOutcome> {
    let run_one = |index: usize| {
        let mut rng = RandomStream::new(path_seed(base_seed, index as u64, stride));
        simulate_path(params.mu_period, params.sigma_period, period_count, &mut rng)
    };

    match execution {
        Execution::Sequential => (0..path_count).map(run_one).collect(),
        Execution::Parallel => (0..path_count).into_par_iter().map(run_one).collect(),
    }
}

/// One log-normal price path starting at 1.0.
pub fn simulate_path(
    mu_period: f64,
    sigma_period: f64,
    period_count: usize,
    rng: &mut RandomStream,
) -> PathOutcome {
    let drift = mu_period - 0.5 * sigma_period * sigma_period;
    let mut price = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst_drawdown = 0.0_f64;

    for _ in 0..period_count {
        let z = rng.standard_normal();
        price *= (drift + sigma_period * z).exp();
        peak = peak.max(price);
        let drawdown = (price - peak) / peak;
        if drawdown < worst_drawdown {
            worst_drawdown = drawdown;
        }
    }

    PathOutcome {
        final_return: price - 1.0,
        worst_drawdown,
    }
}

/// Nearest-rank percentile of an ascending slice: index `floor(q * (n - 1))`.
fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let last = sorted.len() - 1;
    let index = ((q * last as f64).floor().max(0.0) as usize).min(last);
    sorted[index]
}

pub fn aggregate(outcomes: Vec<PathOutcome>) -> SimulationResult {
    let (mut returns, mut drawdowns): (Vec<f64>, Vec<f64>) = outcomes
        .into_iter()
        .map(|o| (o.final_return, o.worst_drawdown.abs()))
        .unzip();
    returns.sort_by(|a, b| a.total_cmp(b));
    drawdowns.sort_by(|a, b| a.total_cmp(b));

    SimulationResult {
        median: nearest_rank(&returns, 0.50),
        upside95: nearest_rank(&returns, 0.95),
        downside5: nearest_rank(&returns, 0.05),
        tail_drawdown95: 0.0 - nearest_rank(&drawdowns, 0.95),
    }
}
