use crate::error::StoreError;
use crate::model::instrument::Instrument;

/// Durable table of `instrument -> (price, trend)`.
pub trait MarketStore: Send + Sync {
    /// All instruments, in catalog order.
    fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError>;

    fn instrument(&self, name: &str) -> Result<Option<Instrument>, StoreError>;

    /// Overwrites the price of an existing instrument.
    ///
    /// Fails with [`StoreError::MissingInstrument`] if there is no such row.
    fn set_price(&self, name: &str, price: u64) -> Result<(), StoreError>;

    /// Inserts each instrument unless a row with the same name already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - The number of rows actually inserted.
    fn seed(&self, catalog: &[Instrument]) -> Result<usize, StoreError>;
}
