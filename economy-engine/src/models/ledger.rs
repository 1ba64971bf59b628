use super::receipt::{Receipt, Side};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Counter-account for currency created by grants.
pub const MINT_ACCOUNT: &str = "Equity:Mint";
/// Counter-account for wager stakes and payouts.
pub const HOUSE_ACCOUNT: &str = "Equity:House";

fn cash(account: impl std::fmt::Display) -> String {
    format!("Assets:{}:Cash", account)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account: String,
    pub amount: i64,
}

impl LedgerEntry {
    pub fn new(account: impl Into<String>, amount: i64) -> Self {
        Self {
            account: account.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: i64,
    pub description: String,
    pub entries: Vec<LedgerEntry>,
}

impl Transaction {
    pub fn new(id: Uuid, timestamp: i64, description: String, entries: Vec<LedgerEntry>) -> Self {
        Self {
            id,
            timestamp,
            description,
            entries,
        }
    }

    /// Verifies that the sum of all entries is zero (Double Entry Principle).
    pub fn is_balanced(&self) -> bool {
        self.entries.iter().map(|e| e.amount as i128).sum::<i128>() == 0
    }
}

impl From<&Receipt> for Transaction {
    fn from(receipt: &Receipt) -> Self {
        let (description, entries) = match receipt {
            Receipt::Transfer(r) => (
                format!("Transfer {} -> {}", r.from, r.to),
                vec![
                    LedgerEntry::new(cash(&r.from), -r.amount),
                    LedgerEntry::new(cash(&r.to), r.amount),
                ],
            ),
            Receipt::Grant(r) => (
                format!("Grant to {}", r.to),
                vec![
                    LedgerEntry::new(cash(&r.to), r.amount),
                    LedgerEntry::new(MINT_ACCOUNT, -r.amount),
                ],
            ),
            Receipt::Seizure(r) => (
                format!("Seizure {} -> {} by {}", r.from, r.to, r.by),
                vec![
                    LedgerEntry::new(cash(&r.from), -r.amount),
                    LedgerEntry::new(cash(&r.to), r.amount),
                ],
            ),
            Receipt::Trade(r) => {
                let signed = match r.side {
                    Side::Buy => -r.total,
                    Side::Sell => r.total,
                };
                (
                    format!("{:?} {} x{} @ {}", r.side, r.instrument, r.quantity, r.price),
                    vec![
                        LedgerEntry::new(cash(&r.account), signed),
                        LedgerEntry::new(format!("Assets:{}:Stock:{}", r.account, r.instrument), -signed),
                    ],
                )
            }
            Receipt::Wager(r) => (
                format!("Wager by {} ({})", r.account, if r.won { "won" } else { "lost" }),
                vec![
                    LedgerEntry::new(cash(&r.account), r.net()),
                    LedgerEntry::new(HOUSE_ACCOUNT, -r.net()),
                ],
            ),
        };
        Transaction::new(receipt.id(), receipt.timestamp(), description, entries)
    }
}

/// Appends settled transactions to a CSV journal.
pub struct TransactionLogger {
    file_path: PathBuf,
}

impl TransactionLogger {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn log(&mut self, transaction: &Transaction) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        // Format: Date, Description, Account, Amount, TxID
        let date = chrono::DateTime::from_timestamp(
            transaction.timestamp / 1000,
            (transaction.timestamp % 1000) as u32 * 1_000_000,
        )
        .unwrap_or_default()
        .to_rfc3339();

        for entry in &transaction.entries {
            writeln!(
                file,
                "{},{},{},{},{}",
                date,
                transaction.description.replace(',', ";"),
                entry.account.replace(',', ";"),
                entry.amount,
                transaction.id
            )?;
        }

        Ok(())
    }
}
