use economy::{AccountId, StoreError};
use thiserror::Error;

/// Outcome of a transaction operation that did not settle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The named instrument is not in the market table.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// The account cannot cover the spend.
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// The account holds fewer units than it tried to sell.
    #[error("Insufficient holdings of {instrument}: held {held}, requested {requested}")]
    InsufficientHoldings {
        instrument: String,
        held: u64,
        requested: u64,
    },

    /// Non-positive, below-minimum, overflowing or self-referential amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The caller is not on the allow-list for this operation.
    #[error("Unauthorized: {0} may not perform this operation")]
    Unauthorized(AccountId),

    /// A store read or write failed. Nothing was applied.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// A write failed after a previous write of the same operation succeeded
    /// and the previous write could not be undone. Requires an operator.
    #[error("Inconsistent state on {account}: {detail}")]
    Inconsistent { account: AccountId, detail: String },
}

impl EngineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidAmount(reason.into())
    }

    /// Expected business-rule rejections. Reported to the caller as-is.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Inconsistent { .. })
    }

    /// True when the stores may disagree with every receipt issued so far.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Inconsistent { .. })
    }
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
