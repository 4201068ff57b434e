use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::SimulationError;

pub const DEFAULT_PATH_COUNT: usize = 10_000;
pub const DEFAULT_PERIOD_COUNT: usize = 12;

/// Macro cycle phase the portfolio is being evaluated against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum CycleKey {
    #[serde(rename = "goldilocks")]
    Goldilocks,
    #[serde(rename = "reflation")]
    Reflation,
    #[serde(rename = "stagflation")]
    Stagflation,
    #[serde(rename = "deflation")]
    Deflation,
}

/// Historical stress episode replayed on top of the cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum ScenarioKey {
    #[serde(rename = "baseline")]
    Baseline,
    #[serde(rename = "dotcom-2000")]
    DotCom2000,
    #[serde(rename = "gfc-2008")]
    Gfc2008,
    #[serde(rename = "covid-2020")]
    Covid2020,
    #[serde(rename = "inflation-2022")]
    Inflation2022,
    #[serde(rename = "stagflation-1970s")]
    Stagflation1970s,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentParameters {
    pub mean_multiplier: f64,
    pub vol_multiplier: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParameters {
    pub mean_shift: f64,
    pub vol_multiplier: f64,
}

impl CycleKey {
    pub const ALL: [CycleKey; 4] = [
        CycleKey::Goldilocks,
        CycleKey::Reflation,
        CycleKey::Stagflation,
        CycleKey::Deflation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CycleKey::Goldilocks => "goldilocks",
            CycleKey::Reflation => "reflation",
            CycleKey::Stagflation => "stagflation",
            CycleKey::Deflation => "deflation",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CycleKey::Goldilocks => "Goldilocks (growth up, inflation down)",
            CycleKey::Reflation => "Reflation (growth up, inflation up)",
            CycleKey::Stagflation => "Stagflation (growth down, inflation up)",
            CycleKey::Deflation => "Deflation (growth down, inflation down)",
        }
    }

    pub fn parameters(self) -> EnvironmentParameters {
        let (mean_multiplier, vol_multiplier) = match self {
            CycleKey::Goldilocks => (1.00, 1.00),
            CycleKey::Reflation => (1.15, 1.10),
            CycleKey::Stagflation => (0.70, 1.30),
            CycleKey::Deflation => (0.80, 1.20),
        };
        EnvironmentParameters {
            mean_multiplier,
            vol_multiplier,
        }
    }
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 6] = [
        ScenarioKey::Baseline,
        ScenarioKey::DotCom2000,
        ScenarioKey::Gfc2008,
        ScenarioKey::Covid2020,
        ScenarioKey::Inflation2022,
        ScenarioKey::Stagflation1970s,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioKey::Baseline => "baseline",
            ScenarioKey::DotCom2000 => "dotcom-2000",
            ScenarioKey::Gfc2008 => "gfc-2008",
            ScenarioKey::Covid2020 => "covid-2020",
            ScenarioKey::Inflation2022 => "inflation-2022",
            ScenarioKey::Stagflation1970s => "stagflation-1970s",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKey::Baseline => "Baseline (no stress overlay)",
            ScenarioKey::DotCom2000 => "Dot-com bust (2000-2002)",
            ScenarioKey::Gfc2008 => "Global financial crisis (2008)",
            ScenarioKey::Covid2020 => "COVID crash (2020)",
            ScenarioKey::Inflation2022 => "Inflation shock (2022)",
            ScenarioKey::Stagflation1970s => "1970s stagflation",
        }
    }

    pub fn parameters(self) -> ScenarioParameters {
        let (mean_shift, vol_multiplier) = match self {
            ScenarioKey::Baseline => (0.0, 1.0),
            ScenarioKey::DotCom2000 => (-0.08, 1.40),
            ScenarioKey::Gfc2008 => (-0.15, 2.00),
            ScenarioKey::Covid2020 => (-0.05, 1.60),
            ScenarioKey::Inflation2022 => (-0.10, 1.30),
            ScenarioKey::Stagflation1970s => (-0.07, 1.25),
        };
        ScenarioParameters {
            mean_shift,
            vol_multiplier,
        }
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('_', "-")
}

impl FromStr for CycleKey {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        CycleKey::ALL
            .into_iter()
            .find(|cycle| cycle.as_str() == key)
            .ok_or_else(|| SimulationError::UnknownCycle(s.to_string()))
    }
}

impl FromStr for ScenarioKey {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        ScenarioKey::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == key)
            .ok_or_else(|| SimulationError::UnknownScenario(s.to_string()))
    }
}

impl fmt::Display for CycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SimulationRequest {
    /// Identifies the simulated portfolio. Only feeds the seed.
    pub subject_key: String,
    pub beta: f64,
    pub environment_score: f64,
    pub cycle: CycleKey,
    pub scenario: ScenarioKey,
    pub path_count: usize,
    /// Horizon in months.
    pub period_count: usize,
}

impl SimulationRequest {
    pub fn new(
        subject_key: impl Into<String>,
        beta: f64,
        environment_score: f64,
        cycle: CycleKey,
        scenario: ScenarioKey,
    ) -> Self {
        Self {
            subject_key: subject_key.into(),
            beta,
            environment_score,
            cycle,
            scenario,
            path_count: DEFAULT_PATH_COUNT,
            period_count: DEFAULT_PERIOD_COUNT,
        }
    }

    pub fn with_path_count(mut self, path_count: usize) -> Self {
        self.path_count = path_count;
        self
    }

    pub fn with_period_count(mut self, period_count: usize) -> Self {
        self.period_count = period_count;
        self
    }

    /// Every input that can change the result, in a form usable as a map key.
    pub fn fingerprint(&self) -> RequestFingerprint {
        RequestFingerprint {
            subject_key: self.subject_key.clone(),
            beta_bits: self.beta.to_bits(),
            environment_score_bits: self.environment_score.to_bits(),
            cycle: self.cycle,
            scenario: self.scenario,
            path_count: self.path_count,
            period_count: self.period_count,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFingerprint {
    pub subject_key: String,
    pub beta_bits: u64,
    pub environment_score_bits: u64,
    pub cycle: CycleKey,
    pub scenario: ScenarioKey,
    pub path_count: usize,
    pub period_count: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathOutcome {
    pub final_return: f64,
    /// Most negative peak-to-trough decline, in [-1, 0].
    pub worst_drawdown: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub median: f64,
    pub upside95: f64,
    pub downside5: f64,
    pub tail_drawdown95: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_parse_from_slugs_case_insensitively() {
        assert_eq!("Goldilocks".parse::<CycleKey>(), Ok(CycleKey::Goldilocks));
        assert_eq!("gfc_2008".parse::<ScenarioKey>(), Ok(ScenarioKey::Gfc2008));
        assert_eq!(
            " STAGFLATION-1970S ".parse::<ScenarioKey>(),
            Ok(ScenarioKey::Stagflation1970s)
        );
    }

    #[test]
    fn unknown_keys_are_rejected_with_the_raw_value() {
        assert_eq!(
            "boom".parse::<CycleKey>(),
            Err(SimulationError::UnknownCycle("boom".to_string()))
        );
        assert_eq!(
            "crash-1929".parse::<ScenarioKey>(),
            Err(SimulationError::UnknownScenario("crash-1929".to_string()))
        );
    }

    #[test]
    fn every_key_round_trips_through_its_slug() {
        for cycle in CycleKey::ALL {
            assert_eq!(cycle.to_string().parse::<CycleKey>(), Ok(cycle));
            assert_eq!(
                serde_json::to_string(&cycle).expect("serialize"),
                format!("\"{}\"", cycle.as_str())
            );
        }
        for scenario in ScenarioKey::ALL {
            assert_eq!(scenario.to_string().parse::<ScenarioKey>(), Ok(scenario));
            assert_eq!(
                serde_json::to_string(&scenario).expect("serialize"),
                format!("\"{}\"", scenario.as_str())
            );
        }
    }

    #[test]
    fn catalog_tables_are_well_formed() {
        assert_eq!(
            CycleKey::Goldilocks.parameters(),
            EnvironmentParameters {
                mean_multiplier: 1.0,
                vol_multiplier: 1.0
            }
        );
        assert_eq!(
            ScenarioKey::Covid2020.parameters(),
            ScenarioParameters {
                mean_shift: -0.05,
                vol_multiplier: 1.6
            }
        );
        for cycle in CycleKey::ALL {
            let p = cycle.parameters();
            assert!(p.mean_multiplier > 0.0 && p.vol_multiplier > 0.0);
        }
        for scenario in ScenarioKey::ALL {
            let p = scenario.parameters();
            assert!(p.mean_shift <= 0.0 && p.vol_multiplier >= 1.0);
        }
    }

    #[test]
    fn request_defaults_to_ten_thousand_monthly_paths_over_a_year() {
        let request = SimulationRequest::new(
            "p-1",
            1.0,
            50.0,
            CycleKey::Goldilocks,
            ScenarioKey::Baseline,
        );
        assert_eq!(request.path_count, 10_000);
        assert_eq!(request.period_count, 12);

        let request = request.with_path_count(7).with_period_count(0);
        assert_eq!(request.path_count, 7);
        assert_eq!(request.period_count, 0);
    }

    #[test]
    fn fingerprint_distinguishes_requests_and_works_as_a_cache_key() {
        let base = SimulationRequest::new(
            "p-1",
            1.0,
            50.0,
            CycleKey::Goldilocks,
            ScenarioKey::Baseline,
        );
        let mut cache = HashMap::new();
        cache.insert(base.fingerprint(), 1);
        cache.insert(base.clone().fingerprint(), 2);
        assert_eq!(cache.len(), 1);

        let mut other = base.clone();
        other.beta = 1.0 + f64::EPSILON;
        cache.insert(other.fingerprint(), 3);
        cache.insert(base.clone().with_period_count(24).fingerprint(), 4);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = SimulationResult {
            median: 0.01,
            upside95: 0.2,
            downside5: -0.15,
            tail_drawdown95: -0.3,
        };
        let json = serde_json::to_value(result).expect("serialize");
        assert_eq!(json["upside95"], 0.2);
        assert_eq!(json["downside5"], -0.15);
        assert_eq!(json["tailDrawdown95"], -0.3);
    }
}
