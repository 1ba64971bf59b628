pub mod account;
pub mod holding;
pub mod instrument;
pub mod market;
