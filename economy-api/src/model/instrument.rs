//! Tradable instruments of the simulated market.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional bias applied by the market simulator to every price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Moves are never negative.
    Up,
    /// Moves are never positive.
    Down,
    /// Moves keep their sign.
    Normal,
}

impl Trend {
    /// Bends a signed delta so it agrees with the trend.
    pub fn bias(self, delta: i64) -> i64 {
        match self {
            Trend::Up => delta.abs(),
            Trend::Down => -delta.abs(),
            Trend::Normal => delta,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Normal => "normal",
        };
        write!(f, "{}", s)
    }
}

/// A row of the market table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InstrumentRow")]
pub struct Instrument {
    /// Display name, also the primary key (e.g. "삼성전자").
    name: String,

    /// Current price in whole currency units. Always at least 1.
    price: u64,

    /// Fixed at creation.
    trend: Trend,
}

/// Wire shape of [`Instrument`]. Deserialized rows go through
/// [`Instrument::new`] so a stored zero price comes back as 1.
#[derive(Deserialize)]
struct InstrumentRow {
    name: String,
    price: u64,
    trend: Trend,
}

impl From<InstrumentRow> for Instrument {
    fn from(row: InstrumentRow) -> Self {
        Instrument::new(row.name, row.price, row.trend)
    }
}

impl Instrument {
    /// Creates an instrument. A zero price is raised to the floor of 1.
    pub fn new(name: impl Into<String>, price: u64, trend: Trend) -> Self {
        Self {
            name: name.into(),
            price: price.max(1),
            trend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price = price.max(1);
        self
    }
}
