//! Return histories and compounding capital tracks

use serde::{Deserialize, Serialize};

use super::instruments::Instrument;

/// Realized simple returns for one instrument, one entry per elapsed round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReturnHistory {
    returns: Vec<f64>,
}

impl ReturnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, r: f64) {
        self.returns.push(r);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Return realized in a 1-based round
    pub fn get(&self, round: usize) -> Option<f64> {
        round.checked_sub(1).and_then(|i| self.returns.get(i).copied())
    }

    /// Returns of rounds strictly before `round` (1-based)
    pub fn before(&self, round: usize) -> &[f64] {
        let end = round.saturating_sub(1).min(self.returns.len());
        &self.returns[..end]
    }
}

/// Compounding capital levels, starting from the initial capital
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CapitalSeries {
    levels: Vec<f64>,
}

impl CapitalSeries {
    pub fn new(initial: f64) -> Self {
        Self { levels: vec![initial] }
    }

    pub fn initial(&self) -> f64 {
        self.levels[0]
    }

    pub fn last(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Compound one round and return the new level
    pub fn advance(&mut self, realized_return: f64) -> f64 {
        let next = advance_capital(self.last(), realized_return);
        self.levels.push(next);
        next
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Number of levels, including the initial one
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Total simple return since the start
    pub fn total_return(&self) -> f64 {
        self.last() / self.initial() - 1.0
    }

    /// Simple return of the most recent round (0.0 before round 1)
    pub fn last_change(&self) -> f64 {
        match self.levels.as_slice() {
            [.., prev, last] => last / prev - 1.0,
            _ => 0.0,
        }
    }

    /// Reset to a single initial level
    pub fn reset(&mut self, initial: f64) {
        self.levels.clear();
        self.levels.push(initial);
    }
}

/// `previous * (1 + r)`
pub fn advance_capital(previous: f64, realized_return: f64) -> f64 {
    previous * (1.0 + realized_return)
}

/// Double a sampled return and clamp it to the instrument's leveraged bound.
///
/// Cash is returned unchanged (it is always 0.0).
pub fn apply_leverage(raw_return: f64, instrument: Instrument) -> f64 {
    if instrument.is_riskless() {
        return raw_return;
    }
    let bound = instrument.spec().lev_bound;
    (raw_return * 2.0).clamp(-bound, bound)
}

/// Return histories for every instrument plus the benchmark capital tracks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPaths {
    histories: [ReturnHistory; 4],
    benchmarks: [CapitalSeries; 3],
}

impl MarketPaths {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            histories: Default::default(),
            benchmarks: [
                CapitalSeries::new(initial_capital),
                CapitalSeries::new(initial_capital),
                CapitalSeries::new(initial_capital),
            ],
        }
    }

    pub fn history(&self, instrument: Instrument) -> &ReturnHistory {
        &self.histories[instrument.index()]
    }

    /// Benchmark track of a risky instrument; cash has none
    pub fn benchmark(&self, instrument: Instrument) -> Option<&CapitalSeries> {
        self.benchmarks.get(instrument.index())
    }

    /// Rounds recorded so far (all histories have the same length)
    pub fn rounds(&self) -> usize {
        self.histories[0].len()
    }

    /// Append one round of returns (indexed by `Instrument::index`) and
    /// compound every benchmark track
    pub fn push_round(&mut self, returns: [f64; 4]) {
        for inst in Instrument::ALL {
            let r = returns[inst.index()];
            self.histories[inst.index()].push(r);
            if let Some(series) = self.benchmarks.get_mut(inst.index()) {
                series.advance(r);
            }
        }
    }

    pub fn reset(&mut self, initial_capital: f64) {
        *self = Self::new(initial_capital);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_capital_identity() {
        assert_eq!(advance_capital(10_000.0, 0.0), 10_000.0);
        assert_eq!(advance_capital(1234.5, 0.0), 1234.5);
    }

    #[test]
    fn test_advance_capital_monotonic() {
        let level = 10_000.0;
        let returns = [-0.35, -0.1, -0.01, 0.0, 0.01, 0.1, 0.35];
        for pair in returns.windows(2) {
            assert!(advance_capital(level, pair[0]) < advance_capital(level, pair[1]));
        }
    }

    #[test]
    fn test_leverage_doubles_inside_bounds() {
        assert_eq!(apply_leverage(0.05, Instrument::Sp500), 0.10);
        assert_eq!(apply_leverage(-0.1, Instrument::Gold), -0.2);
        assert_eq!(apply_leverage(0.2, Instrument::Btc), 0.4);
    }

    #[test]
    fn test_leverage_clamps_after_doubling() {
        // 0.15 is inside the unlevered bound, 0.30 exceeds the leveraged one
        assert_eq!(apply_leverage(0.15, Instrument::Sp500), 0.25);
        assert_eq!(apply_leverage(-0.14, Instrument::Sp500), -0.25);
        // Gold's own floor keeps a doubled return inside the leveraged bound
        assert_eq!(apply_leverage(-0.12, Instrument::Gold), -0.24);
        assert_eq!(apply_leverage(0.35, Instrument::Btc), 0.55);
        assert_eq!(apply_leverage(-0.30, Instrument::Btc), -0.55);
    }

    #[test]
    fn test_leverage_never_touches_cash() {
        assert_eq!(apply_leverage(0.0, Instrument::Cash), 0.0);
    }

    #[test]
    fn test_capital_series() {
        let mut series = CapitalSeries::new(10_000.0);
        assert_eq!(series.last_change(), 0.0);

        series.advance(0.10);
        series.advance(-0.5);
        assert_eq!(series.len(), 3);
        assert!((series.last() - 5_500.0).abs() < 1e-9);
        assert!((series.total_return() + 0.45).abs() < 1e-12);
        assert!((series.last_change() + 0.5).abs() < 1e-12);

        series.reset(10_000.0);
        assert_eq!(series.levels(), &[10_000.0]);
    }

    #[test]
    fn test_history_before_round() {
        let mut history = ReturnHistory::new();
        for r in [0.1, -0.2, 0.3] {
            history.push(r);
        }
        assert_eq!(history.before(1), &[] as &[f64]);
        assert_eq!(history.before(3), &[0.1, -0.2]);
        // Past the end is truncated
        assert_eq!(history.before(10), &[0.1, -0.2, 0.3]);
        assert_eq!(history.get(0), None);
        assert_eq!(history.get(2), Some(-0.2));
    }

    #[test]
    fn test_market_paths_push_round() {
        let mut paths = MarketPaths::new(10_000.0);
        paths.push_round([0.1, 0.0, -0.1, 0.0]);
        paths.push_round([0.1, 0.05, -0.1, 0.0]);

        assert_eq!(paths.rounds(), 2);
        for inst in Instrument::ALL {
            assert_eq!(paths.history(inst).len(), 2);
        }
        assert!(paths.benchmark(Instrument::Cash).is_none());

        let sp = paths.benchmark(Instrument::Sp500).unwrap();
        assert_eq!(sp.len(), 3);
        assert!((sp.last() - 12_100.0).abs() < 1e-9);

        paths.reset(10_000.0);
        assert_eq!(paths.rounds(), 0);
        assert_eq!(paths.benchmark(Instrument::Btc).unwrap().len(), 1);
    }
}
