use crate::error::StoreError;
use crate::model::account::AccountId;
use crate::model::holding::Holding;

/// Durable table of `(account, instrument) -> quantity`.
pub trait PortfolioStore: Send + Sync {
    /// Returns the held quantity, or 0 if there is no row.
    fn holding(&self, account: &AccountId, instrument: &str) -> Result<u64, StoreError>;

    /// Overwrites the held quantity, creating the row if needed.
    fn set_holding(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<(), StoreError>;

    /// All rows of `account`, including zero-quantity ones.
    fn holdings(&self, account: &AccountId) -> Result<Vec<Holding>, StoreError>;
}
