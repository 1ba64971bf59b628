use crate::error::StoreError;
use crate::model::account::AccountId;

/// Durable table of `account -> balance`.
///
/// Every method is a single atomic statement. Callers serialize
/// read-modify-write sequences for an account through the account lock.
pub trait LedgerStore: Send + Sync {
    /// Returns the balance of `account`, or 0 if it has no row yet.
    fn balance(&self, account: &AccountId) -> Result<i64, StoreError>;

    /// Atomically adds `delta` to the balance of `account`, creating the row
    /// at 0 first if it is absent.
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - The balance after the adjustment.
    fn adjust_balance(&self, account: &AccountId, delta: i64) -> Result<i64, StoreError>;

    /// Lists every known account with its balance.
    fn accounts(&self) -> Result<Vec<(AccountId, i64)>, StoreError>;
}
