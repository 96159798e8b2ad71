//! Return sampler
//!
//! One monthly return per call, drawn from a three-regime mixture:
//! - Crash: rare, strongly negative
//! - Rally: rare, strongly positive
//! - Normal: drift plus a bounded momentum bias from recent returns
//!
//! The result is always clamped to the instrument's return bounds.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::instruments::{Instrument, InstrumentSpec};

/// Number of trailing returns that feed the momentum bias
pub const MOMENTUM_LOOKBACK: usize = 4;

/// Regime selected for a single draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Crash,
    Rally,
    Normal,
}

impl Regime {
    /// Partition `u` in [0, 1) into crash, rally, normal (in that order)
    pub fn select(spec: &InstrumentSpec, u: f64) -> Self {
        if u < spec.crash_p {
            Self::Crash
        } else if u < spec.crash_p + spec.rally_p {
            Self::Rally
        } else {
            Self::Normal
        }
    }

    /// Mean and standard deviation of the regime's normal distribution
    pub fn params(self, spec: &InstrumentSpec, bias: f64) -> (f64, f64) {
        match self {
            Self::Crash => (spec.crash_mu, spec.crash_sigma),
            Self::Rally => (spec.rally_mu, spec.rally_sigma),
            Self::Normal => (spec.mean + bias, spec.vol),
        }
    }
}

/// Trend bias from the sign pattern of the last `MOMENTUM_LOOKBACK` returns.
///
/// The net sign count is always divided by the full lookback length, so a
/// short history produces a proportionally smaller bias.
pub fn momentum_bias(spec: &InstrumentSpec, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let start = history.len().saturating_sub(MOMENTUM_LOOKBACK);
    let score: i32 = history[start..]
        .iter()
        .map(|&r| {
            if r > 0.0 {
                1
            } else if r < 0.0 {
                -1
            } else {
                0
            }
        })
        .sum();

    let raw = (score as f64 / MOMENTUM_LOOKBACK as f64) * spec.mom_strength;
    raw.clamp(-spec.mom_cap, spec.mom_cap)
}

/// Draw one monthly return for `instrument` given its realized history.
///
/// Cash returns 0.0 without consuming randomness. The caller appends the
/// result to the instrument's history.
pub fn sample_return<R: Rng + ?Sized>(instrument: Instrument, history: &[f64], rng: &mut R) -> f64 {
    if instrument.is_riskless() {
        return 0.0;
    }

    let spec = instrument.spec();
    let bias = momentum_bias(spec, history);
    let u: f64 = rng.gen();
    let regime = Regime::select(spec, u);
    let (mu, sigma) = regime.params(spec, bias);

    let z: f64 = rng.sample(StandardNormal);
    let r = mu + sigma * z;

    trace!(
        instrument = spec.key,
        ?regime,
        bias,
        raw = r,
        "sampled return"
    );

    r.clamp(spec.ret_floor, spec.ret_cap)
}
