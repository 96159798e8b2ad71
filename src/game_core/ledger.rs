//! Decision ledger
//!
//! Append-only log of the player's per-round choices.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::instruments::Instrument;

/// One completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// 1-based round index
    pub round: usize,
    /// Instrument held for the round
    #[serde(rename = "instrument")]
    pub choice: Instrument,
    /// Leverage (x2) active for the round
    pub leverage: bool,
    /// Return applied to the player's capital (after leverage)
    #[serde(rename = "return")]
    pub realized_return: f64,
    /// Player capital after the round
    pub capital: f64,
}

/// Ordered decision records, rounds 1..=n without gaps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionLedger {
    records: Vec<DecisionRecord>,
}

impl DecisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the decision for `round`, which must be the next round in sequence
    pub fn record(
        &mut self,
        round: usize,
        choice: Instrument,
        leverage: bool,
        realized_return: f64,
        capital: f64,
    ) -> Result<&DecisionRecord> {
        let expected = self.records.len() + 1;
        if round != expected {
            bail!("Out-of-order decision: got round {}, expected {}", round, expected);
        }

        self.records.push(DecisionRecord {
            round,
            choice,
            leverage,
            realized_return,
            capital,
        });
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecisionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&DecisionRecord> {
        self.records.last()
    }

    /// Drop every record (session reset only)
    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Export as CSV with a `round,instrument,leverage,return,capital` header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DecisionLedger {
    type Item = &'a DecisionRecord;
    type IntoIter = std::slice::Iter<'a, DecisionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
