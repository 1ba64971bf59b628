use super::receipt::Receipt;
use economy::{AccountId, Instrument, PortfolioView};
use serde::{Deserialize, Serialize};

/// A request from the outward command layer, one per line of JSON.
///
/// ```json
/// {"cmd": "transfer", "from": "111", "to": "222", "amount": 300}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: i64,
    },
    Grant {
        to: AccountId,
        amount: i64,
    },
    /// Moves the whole balance of `target` to `caller`.
    Seize {
        caller: AccountId,
        target: AccountId,
    },
    Buy {
        account: AccountId,
        instrument: String,
        quantity: u64,
    },
    Sell {
        account: AccountId,
        instrument: String,
        quantity: u64,
    },
    Wager {
        account: AccountId,
        amount: i64,
    },
    Balance {
        account: AccountId,
    },
    Portfolio {
        account: AccountId,
    },
    Market,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Transfer { .. } => "transfer",
            Command::Grant { .. } => "grant",
            Command::Seize { .. } => "seize",
            Command::Buy { .. } => "buy",
            Command::Sell { .. } => "sell",
            Command::Wager { .. } => "wager",
            Command::Balance { .. } => "balance",
            Command::Portfolio { .. } => "portfolio",
            Command::Market => "market",
        }
    }
}

/// What the command layer renders back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Settled { receipt: Receipt },
    Balance { account: AccountId, balance: i64 },
    Portfolio { view: PortfolioView },
    Market { instruments: Vec<Instrument> },
    /// A business rule refused the command. Nothing changed.
    Rejected { reason: String },
    /// A store failed. `fatal` means the stores need an operator.
    Failed { reason: String, fatal: bool },
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Failed { fatal: true, .. })
    }
}
