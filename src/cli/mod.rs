use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::core::{
    AlignmentScore, CycleKey, Execution, ScenarioKey, SimulationOptions, SimulationRequest,
    SimulationResult, parse_holdings, score_alignment, simulate_with,
};

#[derive(Parser, Debug)]
#[command(
    name = "scenario-sim",
    about = "Seeded Monte Carlo stress simulator for portfolio return distributions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a forward return distribution for one portfolio
    Simulate(SimulateArgs),
    /// List the macro cycles and stress scenarios with their parameters
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Derive beta and environment score from a holdings allocation
    Score {
        /// Comma-separated class=weight pairs, e.g. equities=60,bonds=40
        #[arg(long)]
        holdings: String,
        #[arg(long, default_value = "goldilocks")]
        cycle: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Portfolio identifier; only affects the random seed
    #[arg(long, default_value = "portfolio")]
    pub subject: String,
    #[arg(long, allow_negative_numbers = true)]
    pub beta: Option<f64>,
    #[arg(long, allow_negative_numbers = true, help = "Cycle alignment score, 0-100")]
    pub environment_score: Option<f64>,
    /// Derive beta and environment score from class=weight pairs instead
    #[arg(long)]
    pub holdings: Option<String>,
    #[arg(long, default_value = "goldilocks")]
    pub cycle: String,
    #[arg(long, default_value = "baseline")]
    pub scenario: String,
    #[arg(long, default_value_t = 10_000, allow_negative_numbers = true)]
    pub paths: i64,
    #[arg(
        long,
        default_value_t = 12,
        allow_negative_numbers = true,
        help = "Horizon in months"
    )]
    pub periods: i64,
    /// Run every path on the calling thread
    #[arg(long)]
    pub sequential: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    subject_key: String,
    cycle: CycleKey,
    scenario: ScenarioKey,
    beta: f64,
    environment_score: f64,
    path_count: usize,
    period_count: usize,
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CycleRow {
    key: CycleKey,
    label: &'static str,
    mean_multiplier: f64,
    vol_multiplier: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioRow {
    key: ScenarioKey,
    label: &'static str,
    mean_shift: f64,
    vol_multiplier: f64,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    cycles: Vec<CycleRow>,
    scenarios: Vec<ScenarioRow>,
}

/// Executes a parsed command and returns what should be printed to stdout.
pub fn run(cli: Cli) -> Result<String, String> {
    match cli.command {
        Command::Simulate(args) => run_simulate(args),
        Command::Catalog { json } => render_catalog(json),
        Command::Score {
            holdings,
            cycle,
            json,
        } => {
            let score = build_alignment(&holdings, &cycle)?;
            if json {
                to_json(&score)
            } else {
                Ok(format!(
                    "cycle              {}\nbeta               {:.3}\nenvironment score  {:.1}\n",
                    score.cycle, score.beta, score.environment_score
                ))
            }
        }
    }
}

fn run_simulate(args: SimulateArgs) -> Result<String, String> {
    let json = args.json;
    let (request, options) = build_request(args)?;
    info!(
        subject = %request.subject_key,
        cycle = %request.cycle,
        scenario = %request.scenario,
        paths = request.path_count,
        "running scenario simulation"
    );
    let result = simulate_with(&request, &options).map_err(|e| e.to_string())?;
    let response = SimulateResponse {
        subject_key: request.subject_key,
        cycle: request.cycle,
        scenario: request.scenario,
        beta: request.beta,
        environment_score: request.environment_score,
        path_count: request.path_count,
        period_count: request.period_count,
        result,
    };
    if json {
        to_json(&response)
    } else {
        Ok(render_summary(&response))
    }
}

fn build_alignment(holdings: &str, cycle: &str) -> Result<AlignmentScore, String> {
    let cycle = cycle
        .parse::<CycleKey>()
        .map_err(|e| format!("--cycle: {e}"))?;
    let holdings = parse_holdings(holdings).map_err(|e| format!("--holdings: {e}"))?;
    score_alignment(&holdings, cycle).map_err(|e| format!("--holdings: {e}"))
}

fn build_request(args: SimulateArgs) -> Result<(SimulationRequest, SimulationOptions), String> {
    if args.paths < 1 {
        return Err("--paths must be >= 1".to_string());
    }
    if args.periods < 0 {
        return Err("--periods must be >= 0".to_string());
    }
    let path_count = usize::try_from(args.paths).map_err(|_| "--paths is too large".to_string())?;
    let period_count =
        usize::try_from(args.periods).map_err(|_| "--periods is too large".to_string())?;

    let cycle = args
        .cycle
        .parse::<CycleKey>()
        .map_err(|e| format!("--cycle: {e}"))?;
    let scenario = args
        .scenario
        .parse::<ScenarioKey>()
        .map_err(|e| format!("--scenario: {e}"))?;

    let (beta, environment_score) = match &args.holdings {
        Some(holdings) => {
            if args.beta.is_some() || args.environment_score.is_some() {
                return Err(
                    "--holdings cannot be combined with --beta or --environment-score".to_string(),
                );
            }
            let score = build_alignment(holdings, &args.cycle)?;
            (score.beta, score.environment_score)
        }
        None => {
            let Some(beta) = args.beta else {
                return Err("--beta is required unless --holdings is given".to_string());
            };
            let Some(environment_score) = args.environment_score else {
                return Err(
                    "--environment-score is required unless --holdings is given".to_string(),
                );
            };
            (beta, environment_score)
        }
    };

    if !beta.is_finite() || beta < 0.0 {
        return Err("--beta must be a finite number >= 0".to_string());
    }
    if !environment_score.is_finite() {
        return Err("--environment-score must be a finite number".to_string());
    }

    let request = SimulationRequest::new(args.subject, beta, environment_score, cycle, scenario)
        .with_path_count(path_count)
        .with_period_count(period_count);
    let options = SimulationOptions {
        execution: if args.sequential {
            Execution::Sequential
        } else {
            Execution::Parallel
        },
        ..SimulationOptions::default()
    };
    Ok((request, options))
}

fn render_summary(response: &SimulateResponse) -> String {
    let pct = |v: f64| format!("{:+.2}%", v * 100.0);
    let mut out = String::new();
    out.push_str(&format!(
        "Scenario simulation for `{}`\n",
        response.subject_key
    ));
    out.push_str(&format!(
        "  cycle {} / scenario {}\n",
        response.cycle, response.scenario
    ));
    out.push_str(&format!(
        "  beta {:.2}, environment score {:.1}, {} paths over {} months\n",
        response.beta, response.environment_score, response.path_count, response.period_count
    ));
    out.push_str(&format!(
        "  median return        {}\n",
        pct(response.result.median)
    ));
    out.push_str(&format!(
        "  upside (p95)         {}\n",
        pct(response.result.upside95)
    ));
    out.push_str(&format!(
        "  downside (p5)        {}\n",
        pct(response.result.downside5)
    ));
    out.push_str(&format!(
        "  tail drawdown (p95)  {}\n",
        pct(response.result.tail_drawdown95)
    ));
    out
}

fn render_catalog(json: bool) -> Result<String, String> {
    let catalog = CatalogResponse {
        cycles: CycleKey::ALL
            .into_iter()
            .map(|key| {
                let p = key.parameters();
                CycleRow {
                    key,
                    label: key.label(),
                    mean_multiplier: p.mean_multiplier,
                    vol_multiplier: p.vol_multiplier,
                }
            })
            .collect(),
        scenarios: ScenarioKey::ALL
            .into_iter()
            .map(|key| {
                let p = key.parameters();
                ScenarioRow {
                    key,
                    label: key.label(),
                    mean_shift: p.mean_shift,
                    vol_multiplier: p.vol_multiplier,
                }
            })
            .collect(),
    };
    if json {
        return to_json(&catalog);
    }

    let mut out = String::from("Cycles (mean x, vol x)\n");
    for row in &catalog.cycles {
        out.push_str(&format!(
            "  {:<18} {:>5.2} {:>5.2}  {}\n",
            row.key.as_str(),
            row.mean_multiplier,
            row.vol_multiplier,
            row.label
        ));
    }
    out.push_str("Scenarios (mean shift, vol x)\n");
    for row in &catalog.scenarios {
        out.push_str(&format!(
            "  {:<18} {:>+5.2} {:>5.2}  {}\n",
            row.key.as_str(),
            row.mean_shift,
            row.vol_multiplier,
            row.label
        ));
    }
    Ok(out)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode JSON: {e}"))
}
