//! Bulk CSV import/export pipeline
//!
//! Parses tabular account and transaction files, drives the transaction
//! engine per logical group, and serializes data back out. Failures are
//! isolated per row or per group: a malformed row never aborts the
//! batch, and one group's failure never blocks or rolls back another.

pub mod accounts;
pub mod rows;
pub mod transactions;

pub use rows::*;

use serde::Serialize;

use crate::ledger::{AccountManager, TransactionEngine};
use crate::traits::LedgerStore;
use crate::types::LedgerError;

/// Result of a batch import: created entities alongside per-item errors
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome<T> {
    pub success: Vec<T>,
    pub errors: Vec<String>,
}

impl<T> ImportOutcome<T> {
    fn new() -> Self {
        Self {
            success: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> Default for ImportOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bulk import/export manager driving the ledger per file
pub struct BulkManager<S: LedgerStore> {
    pub(crate) accounts: AccountManager<S>,
    pub(crate) engine: TransactionEngine<S>,
}

impl<S: LedgerStore + Clone> BulkManager<S> {
    /// Create a new bulk manager over the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            accounts: AccountManager::new(storage.clone()),
            engine: TransactionEngine::new(storage),
        }
    }
}

pub(crate) fn csv_error(err: csv::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

pub(crate) fn io_error(err: std::io::Error) -> LedgerError {
    LedgerError::Storage(err.to_string())
}
