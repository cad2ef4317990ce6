//! # Ledger Core
//!
//! A double-entry ledger engine for small-business finance, with a bulk
//! CSV import/export pipeline and a bank statement reconciliation
//! workspace.
//!
//! ## Features
//!
//! - **Double-entry bookkeeping**: balanced multi-entry transactions,
//!   validated and committed atomically against materialized balances
//! - **Account management**: Assets, Liabilities, Equity, Income, and
//!   Expense accounts scoped per organization
//! - **Bulk import/export**: flattened CSV transaction files driven
//!   through the engine group by group, with per-row error isolation
//! - **Reconciliation**: bank statement workflow with heuristic match
//!   candidates and a certified close-out balance
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_core::utils::MemoryStore;
//! use ledger_core::{Account, AccountType, Ledger, NewTransaction};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # async fn demo() -> ledger_core::LedgerResult<()> {
//! let mut ledger = Ledger::new(MemoryStore::new());
//!
//! let cash = ledger
//!     .create_account(Account::new(
//!         "org-1".into(),
//!         "1000".into(),
//!         "Cash".into(),
//!         AccountType::Asset,
//!     ))
//!     .await?;
//! let revenue = ledger
//!     .create_account(Account::new(
//!         "org-1".into(),
//!         "4000".into(),
//!         "Sales Revenue".into(),
//!         AccountType::Income,
//!     ))
//!     .await?;
//!
//! let sale = NewTransaction::new(
//!     "org-1".into(),
//!     NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
//!     "Cash sale".into(),
//! )
//! .entry(cash.id.clone(), BigDecimal::from(250), None)
//! .entry(revenue.id.clone(), BigDecimal::from(-250), None);
//!
//! ledger.create_transaction(sale).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use bulk::{BulkManager, ImportOutcome};
pub use ledger::*;
pub use reconciliation::{
    LedgerCandidate, ReconciliationWorkspace, RuleBasedMatcher, TransactionMatcher,
};
pub use traits::*;
pub use types::*;
