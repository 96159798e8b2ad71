//! Scripted players
//!
//! Deterministic decision rules used for autoplay and Monte Carlo batches.

use anyhow::Result;
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::instruments::Instrument;
use super::session::GameSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Stay in cash every round
    AllCash,
    #[value(name = "hold-sp500")]
    #[serde(rename = "hold-sp500")]
    HoldSp500,
    HoldGold,
    HoldBtc,
    /// Hold Bitcoin and lever up as soon as leverage unlocks
    LeveredBtc,
    /// Cycle through every instrument in catalog order
    Rotator,
    /// Buy last round's best performer, levered after a gain
    TrendChaser,
    /// S&P 500 by default, step aside after Bitcoin losing streaks
    Defensive,
}

impl Policy {
    pub const ALL: [Policy; 8] = [
        Policy::AllCash,
        Policy::HoldSp500,
        Policy::HoldGold,
        Policy::HoldBtc,
        Policy::LeveredBtc,
        Policy::Rotator,
        Policy::TrendChaser,
        Policy::Defensive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AllCash => "all-cash",
            Self::HoldSp500 => "hold-sp500",
            Self::HoldGold => "hold-gold",
            Self::HoldBtc => "hold-btc",
            Self::LeveredBtc => "levered-btc",
            Self::Rotator => "rotator",
            Self::TrendChaser => "trend-chaser",
            Self::Defensive => "defensive",
        }
    }

    /// Choice and leverage flag for the session's next round
    pub fn decide<R: Rng>(self, session: &GameSession<R>) -> (Instrument, bool) {
        let paths = session.paths();
        let last = |inst: Instrument| paths.history(inst).as_slice().last().copied();

        match self {
            Self::AllCash => (Instrument::Cash, false),
            Self::HoldSp500 => (Instrument::Sp500, false),
            Self::HoldGold => (Instrument::Gold, false),
            Self::HoldBtc => (Instrument::Btc, false),
            Self::LeveredBtc => (Instrument::Btc, session.leverage_available()),
            Self::Rotator => {
                let idx = session.current_round() % Instrument::ALL.len();
                (Instrument::ALL[idx], false)
            }
            Self::TrendChaser => {
                let best = Instrument::RISKY
                    .into_iter()
                    .filter_map(|inst| last(inst).map(|r| (inst, r)))
                    .max_by(|a, b| a.1.total_cmp(&b.1));
                match best {
                    Some((inst, r)) => (inst, r > 0.0 && session.leverage_available()),
                    None => (Instrument::Sp500, false),
                }
            }
            Self::Defensive => {
                let btc = paths.history(Instrument::Btc).as_slice();
                let bleeding = btc.len() >= 2 && btc[btc.len() - 2..].iter().all(|&r| r < 0.0);
                if bleeding {
                    (Instrument::Cash, false)
                } else {
                    (Instrument::Sp500, false)
                }
            }
        }
    }

    /// Play every remaining round of `session`
    pub fn play_out<R: Rng>(self, session: &mut GameSession<R>) -> Result<()> {
        while !session.is_finished() {
            let (choice, leverage) = self.decide(session);
            session.play_round(choice, leverage)?;
        }
        Ok(())
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_every_policy_completes_a_game() {
        for policy in Policy::ALL {
            let mut session = GameSession::new(GameConfig::seeded(13)).unwrap();
            policy.play_out(&mut session).unwrap();
            assert!(session.is_finished(), "{}", policy);
            assert_eq!(session.ledger().len(), 40);
            // Leverage never requested before it unlocks
            assert!(session.ledger().iter().filter(|r| r.round < 21).all(|r| !r.leverage));
        }
    }

    #[test]
    fn test_all_cash_keeps_capital() {
        let mut session = GameSession::new(GameConfig::seeded(4)).unwrap();
        Policy::AllCash.play_out(&mut session).unwrap();
        assert_eq!(session.capital(), 10_000.0);
    }

    #[test]
    fn test_rotator_cycles() {
        let mut session = GameSession::new(GameConfig::seeded(4)).unwrap();
        for _ in 0..8 {
            let (choice, _) = Policy::Rotator.decide(&session);
            session.play_round(choice, false).unwrap();
        }
        let choices: Vec<Instrument> = session.ledger().iter().map(|r| r.choice).collect();
        assert_eq!(&choices[..4], &Instrument::ALL);
        assert_eq!(&choices[4..], &Instrument::ALL);
    }

    #[test]
    fn test_trend_chaser_follows_best_return() {
        let mut session = GameSession::new(GameConfig::seeded(99)).unwrap();
        assert_eq!(Policy::TrendChaser.decide(&session), (Instrument::Sp500, false));

        session.play_round(Instrument::Cash, false).unwrap();
        let (choice, leverage) = Policy::TrendChaser.decide(&session);
        let best = Instrument::RISKY
            .into_iter()
            .map(|i| session.paths().history(i).get(1).unwrap())
            .fold(f64::MIN, f64::max);
        assert_eq!(session.paths().history(choice).get(1), Some(best));
        assert!(!leverage);
    }

    #[test]
    fn test_levered_btc_after_unlock() {
        let mut session = GameSession::new(GameConfig::seeded(6)).unwrap();
        Policy::LeveredBtc.play_out(&mut session).unwrap();
        let levered = session.ledger().iter().filter(|r| r.leverage).count();
        assert_eq!(levered, 20);
    }

    #[test]
    fn test_policy_names_parse() {
        for policy in Policy::ALL {
            let parsed = Policy::from_str(policy.name(), false).unwrap();
            assert_eq!(parsed, policy);
        }
    }
}
