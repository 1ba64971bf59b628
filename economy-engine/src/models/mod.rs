pub mod command;
pub mod config;
pub mod ledger;
pub mod receipt;

pub use command::*;
pub use config::*;
pub use ledger::*;
pub use receipt::*;
