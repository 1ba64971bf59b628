//! Result records of settled operations.

use economy::AccountId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: Uuid,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: i64,
    /// Sender balance after settlement.
    pub from_balance: i64,
    /// Receiver balance after settlement.
    pub to_balance: i64,
    pub timestamp: i64,
}

impl TransferReceipt {
    pub fn new(from: AccountId, to: AccountId, amount: i64, from_balance: i64, to_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            amount,
            from_balance,
            to_balance,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantReceipt {
    pub id: Uuid,
    pub to: AccountId,
    pub amount: i64,
    pub balance: i64,
    pub timestamp: i64,
}

impl GrantReceipt {
    pub fn new(to: AccountId, amount: i64, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            to,
            amount,
            balance,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizureReceipt {
    pub id: Uuid,
    /// The authorized identity that ordered the seizure.
    pub by: AccountId,
    pub from: AccountId,
    pub to: AccountId,
    /// Whatever `from` held at the moment its lock was taken.
    pub amount: i64,
    pub to_balance: i64,
    pub timestamp: i64,
}

impl SeizureReceipt {
    pub fn new(by: AccountId, from: AccountId, to: AccountId, amount: i64, to_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            by,
            from,
            to,
            amount,
            to_balance,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub id: Uuid,
    pub account: AccountId,
    pub instrument: String,
    pub side: Side,
    pub quantity: u64,
    /// Unit price read under the account lock.
    pub price: u64,
    pub total: i64,
    /// Cash balance after settlement.
    pub balance: i64,
    /// Held quantity after settlement.
    pub holding: u64,
    pub timestamp: i64,
}

impl TradeReceipt {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: AccountId,
        instrument: impl Into<String>,
        side: Side,
        quantity: u64,
        price: u64,
        total: i64,
        balance: i64,
        holding: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account,
            instrument: instrument.into(),
            side,
            quantity,
            price,
            total,
            balance,
            holding,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerReceipt {
    pub id: Uuid,
    pub account: AccountId,
    pub stake: i64,
    pub won: bool,
    /// Amount paid back on a win, 0 on a loss.
    pub payout: i64,
    pub balance: i64,
    pub timestamp: i64,
}

impl WagerReceipt {
    pub fn new(account: AccountId, stake: i64, won: bool, payout: i64, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            account,
            stake,
            won,
            payout,
            balance,
            timestamp: now_millis(),
        }
    }

    /// Change of the balance caused by this wager.
    pub fn net(&self) -> i64 {
        self.payout - self.stake
    }
}

/// Any settled operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Receipt {
    Transfer(TransferReceipt),
    Grant(GrantReceipt),
    Seizure(SeizureReceipt),
    Trade(TradeReceipt),
    Wager(WagerReceipt),
}

impl Receipt {
    pub fn id(&self) -> Uuid {
        match self {
            Receipt::Transfer(r) => r.id,
            Receipt::Grant(r) => r.id,
            Receipt::Seizure(r) => r.id,
            Receipt::Trade(r) => r.id,
            Receipt::Wager(r) => r.id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Receipt::Transfer(r) => r.timestamp,
            Receipt::Grant(r) => r.timestamp,
            Receipt::Seizure(r) => r.timestamp,
            Receipt::Trade(r) => r.timestamp,
            Receipt::Wager(r) => r.timestamp,
        }
    }
}

impl From<TransferReceipt> for Receipt {
    fn from(r: TransferReceipt) -> Self {
        Receipt::Transfer(r)
    }
}

impl From<GrantReceipt> for Receipt {
    fn from(r: GrantReceipt) -> Self {
        Receipt::Grant(r)
    }
}

impl From<SeizureReceipt> for Receipt {
    fn from(r: SeizureReceipt) -> Self {
        Receipt::Seizure(r)
    }
}

impl From<TradeReceipt> for Receipt {
    fn from(r: TradeReceipt) -> Self {
        Receipt::Trade(r)
    }
}

impl From<WagerReceipt> for Receipt {
    fn from(r: WagerReceipt) -> Self {
        Receipt::Wager(r)
    }
}
