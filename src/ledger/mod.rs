//! Ledger module containing account management and transaction processing

pub mod account;
pub mod core;
pub mod transaction;

pub use account::*;
pub use self::core::*;
pub use transaction::*;
