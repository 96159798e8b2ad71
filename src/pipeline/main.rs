mod monte_carlo;

use anyhow::Result;
use clap::Parser;
use portfolio_game::{GameConfig, Policy};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Monte Carlo batches of scripted players over seeded markets")]
struct Args {
    /// Games per policy
    #[arg(short = 'n', long, default_value = "10000")]
    games: usize,

    /// First seed; game i uses seed + i
    #[arg(long, env = "GAME_SEED", default_value = "0")]
    seed: u64,

    /// Only run these policies (all if omitted)
    #[arg(short, long, value_enum)]
    policy: Vec<Policy>,

    /// Number of monthly rounds
    #[arg(long, env = "GAME_ROUNDS")]
    rounds: Option<usize>,

    /// Starting capital
    #[arg(long, env = "GAME_CAPITAL")]
    capital: Option<f64>,

    /// JSON file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write per-policy results to CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Per-game session events are silenced unless verbose
    let filter = if args.verbose {
        "pipeline=debug,portfolio_game=info"
    } else {
        "pipeline=info,portfolio_game=warn"
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(rounds) = args.rounds {
        config.total_rounds = rounds;
    }
    if let Some(capital) = args.capital {
        config.initial_capital = capital;
    }
    config.validate()?;

    let policies = if args.policy.is_empty() {
        Policy::ALL.to_vec()
    } else {
        args.policy.clone()
    };

    info!(
        "Simulating {} games for {} policies from seed {}",
        args.games,
        policies.len(),
        args.seed
    );

    let mut results = Vec::with_capacity(policies.len());
    for policy in policies {
        results.push(monte_carlo::run_policy(&config, policy, args.games, args.seed)?);
    }

    monte_carlo::print_results(&results, config.initial_capital);

    if let Some(path) = &args.output {
        monte_carlo::write_csv(path, &results)?;
        info!("Results written to {:?}", path);
    }

    Ok(())
}
