//! Game session
//!
//! Owns everything one player's game needs: config, random source, market
//! paths, the player's capital track and the decision ledger. Callers drive
//! it one round at a time and score it at the end.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::instruments::Instrument;
use super::ledger::{DecisionLedger, DecisionRecord};
use super::paths::{apply_leverage, CapitalSeries, MarketPaths};
use super::sampler::sample_return;
use super::scoring::{self, ScoreReport};
use crate::config::GameConfig;

/// Final result of one capital track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResult {
    pub name: String,
    pub final_capital: f64,
    /// Simple return since the start
    pub total_return: f64,
}

impl TrackResult {
    fn from_series(name: &str, series: &CapitalSeries) -> Self {
        Self {
            name: name.to_string(),
            final_capital: series.last(),
            total_return: series.total_return(),
        }
    }
}

/// End-of-game summary: the player versus each benchmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub rounds_played: usize,
    pub player: TrackResult,
    pub benchmarks: Vec<TrackResult>,
}

/// One player's game
#[derive(Debug, Clone)]
pub struct GameSession<R: Rng = StdRng> {
    config: GameConfig,
    rng: R,
    paths: MarketPaths,
    player: CapitalSeries,
    ledger: DecisionLedger,
}

fn seeded_rng<R: SeedableRng>(seed: Option<u64>) -> R {
    match seed {
        Some(seed) => R::seed_from_u64(seed),
        None => R::from_entropy(),
    }
}

impl GameSession<StdRng> {
    /// Create a session seeded from `config.seed` (or OS entropy)
    pub fn new(config: GameConfig) -> Result<Self> {
        let rng = seeded_rng(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> GameSession<R> {
    /// Create a session drawing from an injected random source
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self> {
        config.validate()?;
        info!(
            rounds = config.total_rounds,
            capital = config.initial_capital,
            seed = ?config.seed,
            "Starting game session"
        );
        Ok(Self {
            paths: MarketPaths::new(config.initial_capital),
            player: CapitalSeries::new(config.initial_capital),
            ledger: DecisionLedger::new(),
            config,
            rng,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn paths(&self) -> &MarketPaths {
        &self.paths
    }

    /// The player's capital track
    pub fn player(&self) -> &CapitalSeries {
        &self.player
    }

    pub fn ledger(&self) -> &DecisionLedger {
        &self.ledger
    }

    /// Number of completed rounds
    pub fn current_round(&self) -> usize {
        self.ledger.len()
    }

    pub fn capital(&self) -> f64 {
        self.player.last()
    }

    pub fn is_finished(&self) -> bool {
        self.current_round() >= self.config.total_rounds
    }

    /// Whether leverage may be requested for the next round
    pub fn leverage_available(&self) -> bool {
        self.config.leverage_allowed(self.current_round() + 1)
    }

    /// Calendar label of the next round to play
    pub fn next_round_label(&self) -> String {
        self.config.round_label(self.current_round() + 1)
    }

    /// Play the next round holding `choice`, optionally leveraged (x2).
    ///
    /// Every instrument is sampled so the benchmarks keep moving. On error
    /// nothing is sampled or recorded.
    pub fn play_round(&mut self, choice: Instrument, leverage: bool) -> Result<DecisionRecord> {
        let round = self.current_round() + 1;
        if round > self.config.total_rounds {
            bail!("Game finished after {} rounds", self.config.total_rounds);
        }
        if leverage && !self.config.leverage_allowed(round) {
            bail!(
                "Leverage unlocks in round {}, current round is {}",
                self.config.leverage_unlock_round,
                round
            );
        }

        let mut returns = [0.0; 4];
        for inst in Instrument::ALL {
            let history = self.paths.history(inst).as_slice();
            returns[inst.index()] = sample_return(inst, history, &mut self.rng);
        }
        self.paths.push_round(returns);

        let raw = returns[choice.index()];
        let realized = if leverage { apply_leverage(raw, choice) } else { raw };
        let capital = self.player.advance(realized);
        let record = self.ledger.record(round, choice, leverage, realized, capital)?.clone();

        debug!(
            round,
            choice = choice.key(),
            leverage,
            raw,
            realized,
            capital,
            "Round complete"
        );

        if self.is_finished() {
            info!(
                capital = self.capital(),
                total_return = self.player.total_return(),
                "Game finished"
            );
        }

        Ok(record)
    }

    /// Score the decisions made so far
    pub fn score(&self) -> ScoreReport {
        scoring::score(&self.ledger, &self.paths)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            rounds_played: self.current_round(),
            player: TrackResult::from_series("Player", &self.player),
            benchmarks: Instrument::RISKY
                .iter()
                .filter_map(|&inst| {
                    self.paths
                        .benchmark(inst)
                        .map(|series| TrackResult::from_series(inst.label(), series))
                })
                .collect(),
        }
    }

    /// Clear all state and continue with a new random source
    pub fn reset_with_rng(&mut self, rng: R) {
        let capital = self.config.initial_capital;
        self.paths.reset(capital);
        self.player.reset(capital);
        self.ledger.clear();
        self.rng = rng;
        info!(seed = ?self.config.seed, "Session reset");
    }
}

impl<R: Rng + SeedableRng> GameSession<R> {
    /// Clear all state and re-seed from the configured seed.
    ///
    /// A seeded session replays identically after a reset.
    pub fn reset(&mut self) {
        let rng = seeded_rng(self.config.seed);
        self.reset_with_rng(rng);
    }
}
