use anyhow::{Context, Result};
use portfolio_game::{GameConfig, GameSession, Policy};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Result of one seeded game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameOutcome {
    pub seed: u64,
    pub final_capital: f64,
    pub risk: u8,
    pub rationality: u8,
}

/// Aggregate over all games played by one policy
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResults {
    pub policy: Policy,
    pub games: usize,
    pub mean_capital: f64,
    pub median_capital: f64,
    pub p5_capital: f64,
    pub p95_capital: f64,
    /// Share of games that ended below the starting capital
    pub loss_probability: f64,
    pub mean_risk: f64,
    pub mean_rationality: f64,
}

impl SimulationResults {
    pub fn from_outcomes(
        policy: Policy,
        initial_capital: f64,
        outcomes: &[GameOutcome],
    ) -> Option<Self> {
        if outcomes.is_empty() {
            return None;
        }
        let n = outcomes.len() as f64;

        let mut capitals: Vec<f64> = outcomes.iter().map(|o| o.final_capital).collect();
        capitals.sort_by(|a, b| a.total_cmp(b));

        let losses = outcomes.iter().filter(|o| o.final_capital < initial_capital).count();

        Some(Self {
            policy,
            games: outcomes.len(),
            mean_capital: capitals.iter().sum::<f64>() / n,
            median_capital: capitals[capitals.len() / 2],
            p5_capital: percentile(&capitals, 0.05),
            p95_capital: percentile(&capitals, 0.95),
            loss_probability: losses as f64 / n,
            mean_risk: outcomes.iter().map(|o| o.risk as f64).sum::<f64>() / n,
            mean_rationality: outcomes.iter().map(|o| o.rationality as f64).sum::<f64>() / n,
        })
    }
}

/// Value at fraction `p` of an ascending, non-empty slice
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Play one full game with `policy`, seeded with `seed`
pub fn simulate_game(config: &GameConfig, policy: Policy, seed: u64) -> Result<GameOutcome> {
    let mut config = config.clone();
    config.seed = Some(seed);

    let mut session = GameSession::new(config)?;
    policy.play_out(&mut session)?;
    let report = session.score();

    Ok(GameOutcome {
        seed,
        final_capital: session.capital(),
        risk: report.risk,
        rationality: report.rationality,
    })
}

/// Play `games` seeded games per policy in parallel.
///
/// Seeds run from `base_seed` upwards, so every policy faces the same markets.
pub fn run_policy(
    config: &GameConfig,
    policy: Policy,
    games: usize,
    base_seed: u64,
) -> Result<SimulationResults> {
    let seeds: Vec<u64> = (0..games as u64).map(|i| base_seed.wrapping_add(i)).collect();

    let completed = AtomicUsize::new(0);
    let start = Instant::now();

    let outcomes: Vec<GameOutcome> = seeds
        .par_iter()
        .map(|&seed| {
            let outcome = simulate_game(config, policy, seed);

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 1000 == 0 || done == games {
                let elapsed = start.elapsed().as_secs_f64();
                let rate = done as f64 / elapsed;
                eprint!("\r[{}] {}/{} games, {:.0}/s       ", policy, done, games, rate);
            }

            outcome
        })
        .collect::<Result<_>>()?;

    eprintln!();

    SimulationResults::from_outcomes(policy, config.initial_capital, &outcomes)
        .context("No games simulated")
}

pub fn print_results(results: &[SimulationResults], initial_capital: f64) {
    println!("\n{}", "=".repeat(96));
    println!(
        "MONTE CARLO: {} games per policy, starting capital {:.0}",
        results.first().map_or(0, |r| r.games),
        initial_capital
    );
    println!("{}", "=".repeat(96));
    println!(
        "  {:14} {:>12} {:>12} {:>12} {:>12} {:>8} {:>8} {:>8}",
        "Policy", "Mean", "Median", "5th %ile", "95th %ile", "P(loss)", "Risk", "Ration."
    );
    println!("  {}", "-".repeat(92));

    for r in results {
        println!(
            "  {:14} {:>12.0} {:>12.0} {:>12.0} {:>12.0} {:>7.1}% {:>8.1} {:>8.1}",
            r.policy.name(),
            r.mean_capital,
            r.median_capital,
            r.p5_capital,
            r.p95_capital,
            r.loss_probability * 100.0,
            r.mean_risk,
            r.mean_rationality
        );
    }

    let best = results
        .iter()
        .max_by(|a, b| a.median_capital.total_cmp(&b.median_capital));
    if let Some(best) = best {
        println!("\n  Best median outcome: {} ({:.0})", best.policy, best.median_capital);
    }
}

pub fn write_csv(path: &Path, results: &[SimulationResults]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(seed: u64, final_capital: f64) -> GameOutcome {
        GameOutcome { seed, final_capital, risk: 50, rationality: 70 }
    }

    #[test]
    fn test_all_cash_never_loses() {
        let config = GameConfig::default();
        let results = run_policy(&config, Policy::AllCash, 20, 0).unwrap();
        assert_eq!(results.games, 20);
        assert_eq!(results.mean_capital, 10_000.0);
        assert_eq!(results.p5_capital, 10_000.0);
        assert_eq!(results.loss_probability, 0.0);
    }

    #[test]
    fn test_simulate_game_is_reproducible() {
        let config = GameConfig::default();
        let a = simulate_game(&config, Policy::TrendChaser, 77).unwrap();
        let b = simulate_game(&config, Policy::TrendChaser, 77).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_aggregate_statistics() {
        let outcomes: Vec<GameOutcome> = (0..20)
            .map(|i| outcome(i, 9_000.0 + 100.0 * i as f64))
            .collect();
        let r = SimulationResults::from_outcomes(Policy::HoldBtc, 10_000.0, &outcomes).unwrap();

        assert_eq!(r.games, 20);
        assert!((r.mean_capital - 9_950.0).abs() < 1e-9);
        assert_eq!(r.median_capital, 10_000.0);
        assert_eq!(r.p5_capital, 9_100.0);
        assert_eq!(r.p95_capital, 10_900.0);
        // 9000..9900 end below the start
        assert!((r.loss_probability - 0.5).abs() < 1e-12);
        assert_eq!(r.mean_risk, 50.0);
    }

    #[test]
    fn test_empty_outcomes() {
        assert!(SimulationResults::from_outcomes(Policy::AllCash, 10_000.0, &[]).is_none());
    }

    #[test]
    fn test_percentile_clamps() {
        let sorted = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 3.0);
    }
}
