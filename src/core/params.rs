use super::error::{SimResult, SimulationError};
use super::types::{EnvironmentParameters, ScenarioParameters};

/// A period is one month; annual figures are converted with these.
pub const PERIODS_PER_YEAR: f64 = 12.0;

const BASE_MEAN_FLOOR: f64 = -0.10;
const BASE_MEAN_SPAN: f64 = 0.30;
const BASE_VOL_PER_BETA: f64 = 0.18;
const MIN_EFFECTIVE_BETA: f64 = 0.3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedParameters {
    pub mu_annual: f64,
    pub sigma_annual: f64,
    pub mu_period: f64,
    pub sigma_period: f64,
}

pub fn validate_beta(beta: f64) -> SimResult<f64> {
    if !beta.is_finite() || beta < 0.0 {
        return Err(SimulationError::InvalidBeta(beta));
    }
    Ok(beta)
}

/// Finite scores are clamped into [0, 100]; NaN and infinities are caller errors.
pub fn clamp_environment_score(score: f64) -> SimResult<f64> {
    if !score.is_finite() {
        return Err(SimulationError::InvalidEnvironmentScore(score));
    }
    Ok(score.clamp(0.0, 100.0))
}

pub fn validate_scenario(scenario: ScenarioParameters) -> SimResult<ScenarioParameters> {
    check_finite("scenario.meanShift", scenario.mean_shift)?;
    check_non_negative("scenario.volMultiplier", scenario.vol_multiplier)?;
    Ok(scenario)
}

pub fn validate_environment(
    environment: EnvironmentParameters,
) -> SimResult<EnvironmentParameters> {
    check_finite("environment.meanMultiplier", environment.mean_multiplier)?;
    check_non_negative("environment.volMultiplier", environment.vol_multiplier)?;
    Ok(environment)
}

fn check_finite(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { field, value })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { field, value })
    }
}

pub fn resolve_parameters(
    beta: f64,
    environment_score: f64,
    scenario: ScenarioParameters,
    environment: EnvironmentParameters,
) -> SimResult<ResolvedParameters> {
    let beta = validate_beta(beta)?;
    let score = clamp_environment_score(environment_score)?;
    let scenario = validate_scenario(scenario)?;
    let environment = validate_environment(environment)?;

    let base_mean = BASE_MEAN_FLOOR + (score / 100.0) * BASE_MEAN_SPAN;
    let base_vol = BASE_VOL_PER_BETA * beta.max(MIN_EFFECTIVE_BETA);

    let mu_annual = (base_mean + scenario.mean_shift) * environment.mean_multiplier;
    let sigma_annual = base_vol * scenario.vol_multiplier * environment.vol_multiplier;

    // ln(1 + mu) is undefined at or below a total annual loss.
    if mu_annual <= -1.0 || !mu_annual.is_finite() {
        return Err(SimulationError::InvalidParameter {
            field: "muAnnual",
            value: mu_annual,
        });
    }
    if !sigma_annual.is_finite() {
        return Err(SimulationError::InvalidParameter {
            field: "sigmaAnnual",
            value: sigma_annual,
        });
    }

    Ok(ResolvedParameters {
        mu_annual,
        sigma_annual,
        mu_period: (1.0 + mu_annual).ln() / PERIODS_PER_YEAR,
        sigma_period: sigma_annual / PERIODS_PER_YEAR.sqrt(),
    })
}
