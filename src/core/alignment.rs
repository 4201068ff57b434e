use std::str::FromStr;

use serde::Serialize;

use super::error::{SimResult, SimulationError};
use super::types::CycleKey;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    Equities,
    Bonds,
    Commodities,
    RealEstate,
    Cash,
    Gold,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Equities,
        AssetClass::Bonds,
        AssetClass::Commodities,
        AssetClass::RealEstate,
        AssetClass::Cash,
        AssetClass::Gold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Equities => "equities",
            AssetClass::Bonds => "bonds",
            AssetClass::Commodities => "commodities",
            AssetClass::RealEstate => "real-estate",
            AssetClass::Cash => "cash",
            AssetClass::Gold => "gold",
        }
    }

    /// Market sensitivity relative to a broad equity index.
    pub fn beta(self) -> f64 {
        match self {
            AssetClass::Equities => 1.0,
            AssetClass::Bonds => 0.2,
            AssetClass::Commodities => 0.6,
            AssetClass::RealEstate => 0.8,
            AssetClass::Cash => 0.0,
            AssetClass::Gold => 0.1,
        }
    }

    /// How well the class has historically held up in `cycle`, 0-100.
    pub fn favorability(self, cycle: CycleKey) -> f64 {
        use AssetClass::*;
        use CycleKey::*;
        match (self, cycle) {
            (Equities, Goldilocks) => 85.0,
            (Equities, Reflation) => 70.0,
            (Equities, Stagflation) => 20.0,
            (Equities, Deflation) => 35.0,
            (Bonds, Goldilocks) => 55.0,
            (Bonds, Reflation) => 25.0,
            (Bonds, Stagflation) => 30.0,
            (Bonds, Deflation) => 85.0,
            (Commodities, Goldilocks) => 30.0,
            (Commodities, Reflation) => 85.0,
            (Commodities, Stagflation) => 75.0,
            (Commodities, Deflation) => 10.0,
            (RealEstate, Goldilocks) => 70.0,
            (RealEstate, Reflation) => 65.0,
            (RealEstate, Stagflation) => 35.0,
            (RealEstate, Deflation) => 30.0,
            (Cash, Goldilocks) => 40.0,
            (Cash, Reflation) => 35.0,
            (Cash, Stagflation) => 60.0,
            (Cash, Deflation) => 55.0,
            (Gold, Goldilocks) => 30.0,
            (Gold, Reflation) => 55.0,
            (Gold, Stagflation) => 90.0,
            (Gold, Deflation) => 60.0,
        }
    }
}

impl FromStr for AssetClass {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        AssetClass::ALL
            .into_iter()
            .find(|class| class.as_str() == key)
            .ok_or_else(|| SimulationError::InvalidHoldings(format!("unknown asset class `{s}`")))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Holding {
    pub asset_class: AssetClass,
    pub weight: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentScore {
    pub cycle: CycleKey,
    pub beta: f64,
    pub environment_score: f64,
}

/// Parses `equities=60,bonds=40`. Weights are relative; they need not sum to 100.
pub fn parse_holdings(raw: &str) -> SimResult<Vec<Holding>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (class, weight) = part.split_once('=').ok_or_else(|| {
                SimulationError::InvalidHoldings(format!("expected class=weight, got `{part}`"))
            })?;
            let weight = weight.trim().parse::<f64>().map_err(|_| {
                SimulationError::InvalidHoldings(format!("weight for `{class}` is not a number"))
            })?;
            Ok(Holding {
                asset_class: class.parse()?,
                weight,
            })
        })
        .collect()
}

pub fn score_alignment(holdings: &[Holding], cycle: CycleKey) -> SimResult<AlignmentScore> {
    if holdings.is_empty() {
        return Err(SimulationError::InvalidHoldings(
            "allocation is empty".to_string(),
        ));
    }
    if let Some(bad) = holdings
        .iter()
        .find(|h| !h.weight.is_finite() || h.weight < 0.0)
    {
        return Err(SimulationError::InvalidHoldings(format!(
            "weight for `{}` must be a finite number >= 0, got {}",
            bad.asset_class.as_str(),
            bad.weight
        )));
    }

    let total: f64 = holdings.iter().map(|h| h.weight).sum();
    if total <= 0.0 {
        return Err(SimulationError::InvalidHoldings(
            "weights sum to zero".to_string(),
        ));
    }

    let (beta, environment_score) = holdings.iter().fold((0.0, 0.0), |(beta, score), h| {
        let w = h.weight / total;
        (
            beta + w * h.asset_class.beta(),
            score + w * h.asset_class.favorability(cycle),
        )
    });

    Ok(AlignmentScore {
        cycle,
        beta,
        environment_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn sixty_forty_in_goldilocks() {
        let holdings = parse_holdings("equities=60, bonds=40").expect("valid");
        let score = score_alignment(&holdings, CycleKey::Goldilocks).expect("valid");
        assert_approx(score.beta, 0.68);
        assert_approx(score.environment_score, 73.0);
    }

    #[test]
    fn weights_are_normalized() {
        let a = score_alignment(
            &parse_holdings("equities=3,gold=1").expect("valid"),
            CycleKey::Stagflation,
        )
        .expect("valid");
        let b = score_alignment(
            &parse_holdings("equities=75,gold=25").expect("valid"),
            CycleKey::Stagflation,
        )
        .expect("valid");
        assert_approx(a.beta, b.beta);
        assert_approx(a.environment_score, b.environment_score);
        assert_approx(a.environment_score, 37.5);
    }

    #[test]
    fn all_cash_has_zero_beta() {
        let score = score_alignment(
            &[Holding {
                asset_class: AssetClass::Cash,
                weight: 1.0,
            }],
            CycleKey::Deflation,
        )
        .expect("valid");
        assert_eq!(score.beta, 0.0);
        assert_approx(score.environment_score, 55.0);
    }

    #[test]
    fn malformed_allocations_are_rejected() {
        assert!(matches!(
            parse_holdings("equities"),
            Err(SimulationError::InvalidHoldings(_))
        ));
        assert!(matches!(
            parse_holdings("equities=lots"),
            Err(SimulationError::InvalidHoldings(_))
        ));
        assert!(matches!(
            parse_holdings("crypto=10"),
            Err(SimulationError::InvalidHoldings(_))
        ));
        assert!(matches!(
            score_alignment(&[], CycleKey::Goldilocks),
            Err(SimulationError::InvalidHoldings(_))
        ));
        let zero = parse_holdings("bonds=0,cash=0").expect("parses");
        assert!(score_alignment(&zero, CycleKey::Goldilocks).is_err());
        let negative = parse_holdings("bonds=-5,cash=10").expect("parses");
        assert!(score_alignment(&negative, CycleKey::Goldilocks).is_err());
    }

    #[test]
    fn asset_class_names_accept_underscores() {
        assert_eq!("REAL_ESTATE".parse::<AssetClass>(), Ok(AssetClass::RealEstate));
    }

    proptest! {
        #[test]
        fn prop_score_stays_within_catalog_bounds(
            weights in proptest::collection::vec(0.0f64..100.0, 6),
            cycle_idx in 0usize..4,
        ) {
            let holdings: Vec<Holding> = AssetClass::ALL
                .into_iter()
                .zip(weights.iter().copied())
                .map(|(asset_class, weight)| Holding { asset_class, weight })
                .collect();
            let total: f64 = weights.iter().sum();
            let result = score_alignment(&holdings, CycleKey::ALL[cycle_idx]);
            if total > 0.0 {
                let score = result.expect("positive total");
                prop_assert!((0.0..=1.0 + 1e-12).contains(&score.beta));
                prop_assert!((0.0..=100.0 + 1e-9).contains(&score.environment_score));
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
