use super::instrument::Instrument;
use serde::{Deserialize, Serialize};

/// The whole market board as of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Number of ticks applied since the process started.
    pub tick: u64,
    /// Unix millis at which the snapshot was taken.
    pub timestamp: i64,
    pub instruments: Vec<Instrument>,
}

impl MarketSnapshot {
    pub fn new(tick: u64, timestamp: i64, instruments: Vec<Instrument>) -> Self {
        Self {
            tick,
            timestamp,
            instruments,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.name() == name)
    }
}
