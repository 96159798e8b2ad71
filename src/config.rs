//! Configuration for a game session

use anyhow::{bail, Context, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session-wide constants supplied at game start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of monthly rounds in a game
    pub total_rounds: usize,

    /// Starting capital for the player and every benchmark
    pub initial_capital: f64,

    /// First round (1-based) in which leverage may be used
    pub leverage_unlock_round: usize,

    /// RNG seed; `None` draws from OS entropy
    pub seed: Option<u64>,

    /// Calendar month shown for round 1
    pub start_month: NaiveDate,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: 40,
            initial_capital: 10_000.0,
            leverage_unlock_round: 21,
            seed: None,
            start_month: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap_or_default(),
        }
    }
}

impl GameConfig {
    /// Default config with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Load overrides from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_rounds == 0 {
            bail!("total_rounds must be at least 1");
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            bail!("initial_capital must be positive, got {}", self.initial_capital);
        }
        if self.leverage_unlock_round == 0 {
            bail!("leverage_unlock_round is 1-based, got 0");
        }
        Ok(())
    }

    /// Check if leverage may be used in a 1-based round
    pub fn leverage_allowed(&self, round: usize) -> bool {
        round >= self.leverage_unlock_round
    }

    /// Calendar label for a 1-based round, e.g. "Sep 22"
    pub fn round_label(&self, round: usize) -> String {
        let offset = round.saturating_sub(1) as u32;
        match self.start_month.checked_add_months(Months::new(offset)) {
            Some(date) => date.format("%b %y").to_string(),
            None => format!("R{}", round),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.total_rounds, 40);
        assert_eq!(config.initial_capital, 10_000.0);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_leverage_unlock() {
        let config = GameConfig::default();
        assert!(!config.leverage_allowed(1));
        assert!(!config.leverage_allowed(20));
        assert!(config.leverage_allowed(21));
        assert!(config.leverage_allowed(40));
    }

    #[test]
    fn test_round_labels() {
        let config = GameConfig::default();
        assert_eq!(config.round_label(1), "Sep 22");
        assert_eq!(config.round_label(5), "Jan 23");
        assert_eq!(config.round_label(40), "Dec 25");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_rounds = GameConfig {
            total_rounds: 0,
            ..Default::default()
        };
        assert!(zero_rounds.validate().is_err());

        let broke = GameConfig {
            initial_capital: 0.0,
            ..Default::default()
        };
        assert!(broke.validate().is_err());

        let unlock_zero = GameConfig {
            leverage_unlock_round: 0,
            ..Default::default()
        };
        assert!(unlock_zero.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"seed": 7, "total_rounds": 12}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.total_rounds, 12);
        assert_eq!(config.leverage_unlock_round, 21);
        assert_eq!(config.start_month, NaiveDate::from_ymd_opt(2022, 9, 1).unwrap());
    }
}
