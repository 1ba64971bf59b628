pub mod engine;
pub mod error;
pub mod events;
pub mod io;
pub mod lock;
pub mod market;
pub mod models;
pub mod store;
pub mod wager;

// Re-export the pieces a host needs to wire an engine together
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use events::{EconomyEvent, EventBus};
pub use lock::AccountLocks;
pub use market::MarketSimulator;
pub use store::MemoryStore;
