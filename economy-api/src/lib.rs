pub mod error;
pub mod model;
pub mod traits;

pub use error::StoreError;
pub use model::account::AccountId;
pub use model::holding::{Holding, PortfolioView, Position};
pub use model::instrument::{Instrument, Trend};
pub use model::market::MarketSnapshot;
pub use traits::ledger::LedgerStore;
pub use traits::market::MarketStore;
pub use traits::portfolio::PortfolioStore;

pub mod prelude {
    pub use crate::error::StoreError;
    pub use crate::model::account::AccountId;
    pub use crate::model::instrument::{Instrument, Trend};
    pub use crate::traits::ledger::LedgerStore;
    pub use crate::traits::market::MarketStore;
    pub use crate::traits::portfolio::PortfolioStore;
}
