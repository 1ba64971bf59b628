//! Holdings and their valuation.

use super::account::AccountId;
use serde::{Deserialize, Serialize};

/// A row of the portfolio table: how much of one instrument one account owns.
///
/// Rows are never deleted. A fully sold position stays at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub account: AccountId,
    pub instrument: String,
    pub quantity: u64,
}

impl Holding {
    pub fn new(account: AccountId, instrument: impl Into<String>, quantity: u64) -> Self {
        Self {
            account,
            instrument: instrument.into(),
            quantity,
        }
    }
}

/// A non-empty holding valued at the current market price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: String,
    pub quantity: u64,
    pub price: u64,
    pub value: u64,
}

impl Position {
    pub fn new(instrument: impl Into<String>, quantity: u64, price: u64) -> Self {
        Self {
            instrument: instrument.into(),
            quantity,
            price,
            value: quantity.saturating_mul(price),
        }
    }
}

/// Read-only view of an account for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub account: AccountId,
    pub balance: i64,
    pub positions: Vec<Position>,
}

impl PortfolioView {
    pub fn new(account: AccountId, balance: i64, positions: Vec<Position>) -> Self {
        Self {
            account,
            balance,
            positions,
        }
    }

    /// Sum of all position values.
    pub fn holdings_value(&self) -> u64 {
        self.positions
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.value))
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
