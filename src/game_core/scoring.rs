//! Investor scoring
//!
//! Post-game analysis of the decision ledger against the realized return
//! histories. Produces two 0-100 traits:
//! - Risk appetite: allocation mix, leverage usage, concentration
//! - Rationality: penalties for chasing losses/euphoria and overtrading,
//!   bonuses for defensive and patient choices
//!
//! Deterministic: no randomness, same inputs give the same report.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::instruments::Instrument;
use super::ledger::DecisionLedger;
use super::paths::MarketPaths;

pub const EMPTY_LEDGER_NOTE: &str = "No decisions to evaluate.";

/// Rounds inspected when counting a negative streak
const STREAK_WINDOW: usize = 3;

const BASE_RATIONALITY: f64 = 84.0;
const PENALTY_WEIGHT: f64 = 6.5;
const BONUS_WEIGHT: f64 = 3.0;
const SWITCH_RATE_LIMIT: f64 = 0.55;
const CONCENTRATION_LIMIT: f64 = 0.55;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Risk appetite, 0-100
    pub risk: u8,
    /// Rationality, 0-100
    pub rationality: u8,
    pub notes: Vec<String>,
}

impl ScoreReport {
    fn empty() -> Self {
        Self {
            risk: 0,
            rationality: 0,
            notes: vec![EMPTY_LEDGER_NOTE.to_string()],
        }
    }
}

/// Session-wide allocation statistics
#[derive(Debug, Clone, PartialEq)]
struct Allocation {
    /// Fraction of rounds per instrument, indexed by `Instrument::index`
    shares: [f64; 4],
    leverage_share: f64,
    switch_rate: f64,
    /// Herfindahl index of `shares`
    concentration: f64,
}

impl Allocation {
    fn from_ledger(ledger: &DecisionLedger) -> Self {
        let n = ledger.len();
        let mut counts = [0usize; 4];
        let mut leveraged = 0usize;
        let mut switches = 0usize;
        let mut prev: Option<Instrument> = None;

        for d in ledger {
            counts[d.choice.index()] += 1;
            if d.leverage {
                leveraged += 1;
            }
            if prev.is_some_and(|p| p != d.choice) {
                switches += 1;
            }
            prev = Some(d.choice);
        }

        let shares = counts.map(|c| c as f64 / n as f64);
        Self {
            shares,
            leverage_share: leveraged as f64 / n as f64,
            switch_rate: switches as f64 / n.saturating_sub(1).max(1) as f64,
            concentration: shares.iter().map(|s| s * s).sum(),
        }
    }

    fn share(&self, instrument: Instrument) -> f64 {
        self.shares[instrument.index()]
    }

    fn risk_score(&self) -> u8 {
        let raw = 0.90 * self.share(Instrument::Btc) + 0.25 * self.share(Instrument::Gold)
            - 0.35 * self.share(Instrument::Sp500)
            + 0.90 * self.leverage_share
            + 0.25 * self.concentration
            - 0.85 * self.share(Instrument::Cash);
        to_score(50.0 + 70.0 * raw)
    }

    fn notes(&self) -> Vec<String> {
        vec![
            format!(
                "Allocation share: Bitcoin {}, Gold {}, S&P 500 {}, Cash {}.",
                pct(self.share(Instrument::Btc)),
                pct(self.share(Instrument::Gold)),
                pct(self.share(Instrument::Sp500)),
                pct(self.share(Instrument::Cash)),
            ),
            format!("Leverage used in {} of rounds.", pct(self.leverage_share)),
            format!(
                "Instrument switch rate: {} (higher means more overtrading risk).",
                pct(self.switch_rate)
            ),
            format!(
                "Portfolio concentration: {:.2} (higher means less diversification).",
                self.concentration
            ),
        ]
    }
}

fn pct(x: f64) -> String {
    format!("{:.0}%", x * 100.0)
}

/// Round half to even and clamp to 0..=100
fn to_score(x: f64) -> u8 {
    x.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Consecutive negative returns ending just before `round` (1-based),
/// looking back at most `STREAK_WINDOW` rounds. Rounds missing from the
/// history count as absent.
fn negative_streak(returns: &[f64], round: usize) -> usize {
    let end = round.saturating_sub(1).min(returns.len());
    let start = end.saturating_sub(STREAK_WINDOW);
    returns[start..end]
        .iter()
        .rev()
        .take_while(|&&r| r < 0.0)
        .count()
}

/// The two returns immediately before `round` are both present and negative
fn two_prior_losses(returns: &[f64], round: usize) -> bool {
    let end = round.saturating_sub(1).min(returns.len());
    let start = round.saturating_sub(3).min(end);
    let prior = &returns[start..end];
    prior.len() == 2 && prior.iter().all(|&r| r < 0.0)
}

/// The return of the round right before `round` reached `threshold`
fn big_up(returns: &[f64], round: usize, threshold: f64) -> bool {
    round
        .checked_sub(2)
        .and_then(|i| returns.get(i))
        .is_some_and(|&r| r >= threshold)
}

fn streak_multiplier(instrument: Instrument) -> f64 {
    match instrument {
        Instrument::Btc => 1.35,
        Instrument::Gold => 1.15,
        _ => 1.0,
    }
}

fn euphoria_threshold(instrument: Instrument) -> f64 {
    match instrument {
        Instrument::Btc => 0.10,
        _ => 0.06,
    }
}

/// Accumulated rationality adjustments
#[derive(Debug, Default)]
struct Tally {
    penalties: f64,
    bonuses: f64,
}

impl Tally {
    fn from_decisions(ledger: &DecisionLedger, paths: &MarketPaths) -> Self {
        let mut t = Self::default();
        let btc = paths.history(Instrument::Btc).as_slice();

        for d in ledger {
            let round = d.round;
            let btc_streak = negative_streak(btc, round);

            if d.choice == Instrument::Cash {
                // Stepping aside while the volatile asset bleeds
                if btc_streak >= 2 {
                    t.bonuses += 0.35;
                }
                continue;
            }

            let series = paths.history(d.choice).as_slice();
            let streak = negative_streak(series, round);

            if streak >= 2 {
                t.penalties += streak_multiplier(d.choice) * (streak - 1) as f64;
            }

            if d.leverage && two_prior_losses(series, round) {
                t.penalties += if d.choice == Instrument::Sp500 { 0.9 } else { 1.2 };
            }

            if big_up(series, round, euphoria_threshold(d.choice)) {
                t.penalties += if d.choice == Instrument::Sp500 { 0.25 } else { 0.35 };
            }

            if btc_streak >= 2 && matches!(d.choice, Instrument::Sp500 | Instrument::Gold) {
                t.bonuses += 0.25;
            }

            if !d.leverage && streak >= 2 {
                t.bonuses += 0.12;
            }
        }

        t
    }
}

/// Score a completed (or partial) game.
///
/// Each decision is judged only against returns of rounds strictly before
/// its own round.
pub fn score(ledger: &DecisionLedger, paths: &MarketPaths) -> ScoreReport {
    if ledger.is_empty() {
        return ScoreReport::empty();
    }

    let alloc = Allocation::from_ledger(ledger);
    let risk = alloc.risk_score();

    let mut tally = Tally::from_decisions(ledger, paths);

    if alloc.switch_rate > SWITCH_RATE_LIMIT {
        tally.penalties += (alloc.switch_rate - SWITCH_RATE_LIMIT) * 3.0;
    }

    if alloc.concentration > CONCENTRATION_LIMIT && alloc.share(Instrument::Btc) > 0.5 {
        tally.penalties += 1.0;
    }

    let mut rationality =
        BASE_RATIONALITY - PENALTY_WEIGHT * tally.penalties + BONUS_WEIGHT * tally.bonuses;
    if risk > 80 {
        rationality -= (risk - 80) as f64 * 0.25;
    }

    ScoreReport {
        risk,
        rationality: to_score(rationality),
        notes: alloc.notes(),
    }
}

/// Three-way band of a 0-100 trait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Low,
    Moderate,
    High,
}

impl Band {
    fn of(score: u8) -> Self {
        if score < 35 {
            Self::Low
        } else if score < 65 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// One-sentence investor profile derived from a score report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub rationality: Band,
    pub risk: Band,
}

impl InvestorProfile {
    pub fn from_report(report: &ScoreReport) -> Self {
        Self {
            rationality: Band::of(report.rationality),
            risk: Band::of(report.risk),
        }
    }

    pub fn style(&self) -> &'static str {
        match self.risk {
            Band::Low => "defensive",
            Band::Moderate => "balanced",
            Band::High => "aggressive",
        }
    }
}

impl fmt::Display for InvestorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rational = match self.rationality {
            Band::Low => "not very rational",
            Band::Moderate => "moderately rational",
            Band::High => "rational",
        };
        let appetite = match self.risk {
            Band::Low => "low",
            Band::Moderate => "moderate",
            Band::High => "high",
        };
        write!(
            f,
            "You are a {} investor with {} risk appetite. Your decisions suggest a {} style.",
            rational,
            appetite,
            self.style()
        )
    }
}
