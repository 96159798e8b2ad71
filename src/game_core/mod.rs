//! Game Core - market simulation and investor scoring
//!
//! This module contains everything the front ends drive:
//! - Instrument catalog
//! - Regime-mixture return sampling with momentum
//! - Return histories and compounding capital tracks
//! - Decision ledger
//! - Post-game risk and rationality scoring
//! - Session orchestration and scripted players

pub mod instruments;
pub mod sampler;
pub mod paths;
pub mod ledger;
pub mod scoring;
pub mod session;
pub mod policy;

// Re-export commonly used types
pub use instruments::{Instrument, InstrumentSpec};
pub use sampler::{momentum_bias, sample_return, Regime, MOMENTUM_LOOKBACK};
pub use paths::{advance_capital, apply_leverage, CapitalSeries, MarketPaths, ReturnHistory};
pub use ledger::{DecisionLedger, DecisionRecord};
pub use scoring::{score, Band, InvestorProfile, ScoreReport};
pub use session::{GameSession, SessionSummary, TrackResult};
pub use policy::Policy;
