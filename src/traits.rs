//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the ledger system
///
/// This trait allows the ledger core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Implementations must provide two atomicity guarantees:
/// `commit_transaction` is a single all-or-nothing unit, and balance
/// increments serialize inside the store rather than through a
/// read-modify-write in the caller.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a new account
    ///
    /// Fails with `Conflict` when the organization already has an account
    /// with the same account number.
    async fn insert_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// Get an account by its number within an organization
    async fn get_account_by_number(
        &self,
        organization_id: &str,
        account_number: &str,
    ) -> LedgerResult<Option<Account>>;

    /// List an organization's accounts ordered by account number,
    /// optionally filtered by type
    async fn list_accounts(
        &self,
        organization_id: &str,
        account_type: Option<AccountType>,
    ) -> LedgerResult<Vec<Account>>;

    /// Delete an account
    ///
    /// Fails with `Conflict` while any ledger entry references it.
    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()>;

    /// Atomically persist a transaction, its entries, and the balance
    /// increments of every referenced account
    ///
    /// Either all three effects become visible or none does. A storage
    /// failure must leave no partial entries or balance deltas behind.
    async fn commit_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()>;

    /// Get a transaction by ID, entries included
    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>>;

    /// List an organization's transactions, newest first, with pagination
    ///
    /// Every filter criterion (dates, status, account) applies before
    /// pagination so pages are never under-filled.
    async fn list_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
        page: Page,
    ) -> LedgerResult<Paginated<Transaction>>;

    /// Fetch an organization's transactions, newest first, without
    /// pagination (exports, matching, audits)
    async fn find_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<Transaction>>;

    /// Update a transaction's lifecycle status
    ///
    /// The financial content of a committed transaction is immutable;
    /// only the status flag moves, driven by reconciliation.
    async fn set_transaction_status(
        &mut self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> LedgerResult<()>;

    /// Insert a new reconciliation statement
    async fn insert_statement(&mut self, statement: &ReconciliationStatement) -> LedgerResult<()>;

    /// Get a statement by ID
    async fn get_statement(
        &self,
        statement_id: &str,
    ) -> LedgerResult<Option<ReconciliationStatement>>;

    /// Find the statement owning a given statement transaction
    async fn find_statement_with_transaction(
        &self,
        statement_transaction_id: &str,
    ) -> LedgerResult<Option<ReconciliationStatement>>;

    /// List the statements covering an account, newest period first
    async fn list_statements(&self, account_id: &str) -> LedgerResult<Vec<ReconciliationStatement>>;

    /// Replace a statement wholesale
    ///
    /// Statement workflow transitions go through this single swap so the
    /// store can serialize them per statement.
    async fn update_statement(&mut self, statement: &ReconciliationStatement) -> LedgerResult<()>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom transaction validation rules
pub trait TransactionValidator: Send + Sync {
    /// Validate a transaction draft before it reaches storage
    fn validate_draft(&self, draft: &NewTransaction) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        crate::utils::validation::validate_account_number(&account.account_number)?;
        crate::utils::validation::validate_account_name(&account.name)?;

        if account.organization_id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Organization ID cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default transaction validator enforcing the double-entry rules
pub struct DefaultTransactionValidator;

impl TransactionValidator for DefaultTransactionValidator {
    fn validate_draft(&self, draft: &NewTransaction) -> LedgerResult<()> {
        if draft.entries.len() < 2 {
            return Err(LedgerError::Validation(
                "Transaction must have at least two entries for double-entry bookkeeping"
                    .to_string(),
            ));
        }

        if !draft.is_balanced() {
            return Err(LedgerError::Unbalanced {
                sum: draft.entry_sum(),
            });
        }

        crate::utils::validation::validate_transaction_description(&draft.description)?;

        Ok(())
    }
}
