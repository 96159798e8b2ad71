//! Instrument catalog
//!
//! Static regime parameters for the four tradable instruments. The table is
//! built at compile time and never mutated.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regime and clamp parameters for one instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentSpec {
    pub key: &'static str,
    pub label: &'static str,
    /// Monthly drift of the normal regime
    pub mean: f64,
    /// Standard deviation of the normal regime
    pub vol: f64,
    pub crash_p: f64,
    pub crash_mu: f64,
    pub crash_sigma: f64,
    pub rally_p: f64,
    pub rally_mu: f64,
    pub rally_sigma: f64,
    /// Bias per unit of net sign score over the lookback window
    pub mom_strength: f64,
    /// Absolute cap on the momentum bias
    pub mom_cap: f64,
    pub ret_floor: f64,
    pub ret_cap: f64,
    /// Symmetric clamp applied after doubling a leveraged return
    pub lev_bound: f64,
}

const SP500: InstrumentSpec = InstrumentSpec {
    key: "SP500",
    label: "S&P 500",
    mean: 0.006,
    vol: 0.035,
    crash_p: 0.015,
    crash_mu: -0.08,
    crash_sigma: 0.03,
    rally_p: 0.012,
    rally_mu: 0.07,
    rally_sigma: 0.03,
    mom_strength: 0.03,
    mom_cap: 0.03,
    ret_floor: -0.15,
    ret_cap: 0.15,
    lev_bound: 0.25,
};

const GOLD: InstrumentSpec = InstrumentSpec {
    key: "GOLD",
    label: "Gold",
    mean: 0.0035,
    vol: 0.040,
    crash_p: 0.012,
    crash_mu: -0.07,
    crash_sigma: 0.03,
    rally_p: 0.012,
    rally_mu: 0.07,
    rally_sigma: 0.03,
    mom_strength: 0.03,
    mom_cap: 0.035,
    ret_floor: -0.12,
    ret_cap: 0.12,
    lev_bound: 0.25,
};

const BTC: InstrumentSpec = InstrumentSpec {
    key: "BTC",
    label: "Bitcoin",
    mean: 0.010,
    vol: 0.10,
    crash_p: 0.040,
    crash_mu: -0.22,
    crash_sigma: 0.08,
    rally_p: 0.035,
    rally_mu: 0.20,
    rally_sigma: 0.08,
    mom_strength: 0.035,
    mom_cap: 0.05,
    ret_floor: -0.35,
    ret_cap: 0.35,
    lev_bound: 0.55,
};

const CASH: InstrumentSpec = InstrumentSpec {
    key: "CASH",
    label: "Cash",
    mean: 0.0,
    vol: 0.0,
    crash_p: 0.0,
    crash_mu: 0.0,
    crash_sigma: 0.0,
    rally_p: 0.0,
    rally_mu: 0.0,
    rally_sigma: 0.0,
    mom_strength: 0.0,
    mom_cap: 0.0,
    ret_floor: 0.0,
    ret_cap: 0.0,
    lev_bound: 0.0,
};

/// Tradable instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    /// Broad equity index (lower/medium risk)
    #[serde(rename = "SP500")]
    Sp500,
    /// Gold (medium risk)
    Gold,
    /// Bitcoin (high volatility)
    Btc,
    /// Riskless, always returns 0%
    Cash,
}

impl Instrument {
    /// Catalog order. Returns are sampled in this order every round.
    pub const ALL: [Instrument; 4] = [
        Instrument::Sp500,
        Instrument::Gold,
        Instrument::Btc,
        Instrument::Cash,
    ];

    /// Instruments with a benchmark capital track
    pub const RISKY: [Instrument; 3] = [Instrument::Sp500, Instrument::Gold, Instrument::Btc];

    pub fn spec(self) -> &'static InstrumentSpec {
        match self {
            Self::Sp500 => &SP500,
            Self::Gold => &GOLD,
            Self::Btc => &BTC,
            Self::Cash => &CASH,
        }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn is_riskless(self) -> bool {
        self == Self::Cash
    }

    /// Position in `ALL`, used to index per-instrument arrays
    pub fn index(self) -> usize {
        match self {
            Self::Sp500 => 0,
            Self::Gold => 1,
            Self::Btc => 2,
            Self::Cash => 3,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Instrument {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Instrument::ALL
            .into_iter()
            .find(|i| i.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| anyhow!("Unknown instrument: {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!("SP500".parse::<Instrument>().unwrap(), Instrument::Sp500);
        assert_eq!("gold".parse::<Instrument>().unwrap(), Instrument::Gold);
        assert_eq!(" btc ".parse::<Instrument>().unwrap(), Instrument::Btc);
        assert_eq!("Cash".parse::<Instrument>().unwrap(), Instrument::Cash);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let err = "DOGE".parse::<Instrument>().unwrap_err();
        assert!(err.to_string().contains("Unknown instrument"));
        assert!("".parse::<Instrument>().is_err());
    }

    #[test]
    fn test_index_matches_catalog_order() {
        for (i, inst) in Instrument::ALL.iter().enumerate() {
            assert_eq!(inst.index(), i);
        }
    }

    #[test]
    fn test_cash_parameters_are_zero() {
        let c = Instrument::Cash.spec();
        assert_eq!(c.ret_floor, 0.0);
        assert_eq!(c.ret_cap, 0.0);
        assert_eq!(c.crash_p + c.rally_p, 0.0);
        assert!(Instrument::Cash.is_riskless());
    }

    #[test]
    fn test_clamp_bounds_are_ordered() {
        for inst in Instrument::RISKY {
            let s = inst.spec();
            assert!(s.ret_floor < 0.0 && s.ret_cap > 0.0, "{}", s.key);
            assert!(s.lev_bound > s.ret_cap, "{}", s.key);
            assert!(s.crash_p + s.rally_p < 1.0);
        }
    }

    #[test]
    fn test_serde_uses_catalog_keys() {
        let json = serde_json::to_string(&Instrument::Sp500).unwrap();
        assert_eq!(json, "\"SP500\"");
        let back: Instrument = serde_json::from_str("\"BTC\"").unwrap();
        assert_eq!(back, Instrument::Btc);
    }
}
