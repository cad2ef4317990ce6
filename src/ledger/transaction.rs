//! Transaction validation and atomic commit

use tracing::debug;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Engine that validates and atomically commits balanced transactions
pub struct TransactionEngine<S: LedgerStore> {
    storage: S,
    validator: Box<dyn TransactionValidator>,
}

impl<S: LedgerStore> TransactionEngine<S> {
    /// Create a new transaction engine
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultTransactionValidator),
        }
    }

    /// Create a new transaction engine with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn TransactionValidator>) -> Self {
        Self { storage, validator }
    }

    /// Validate a draft and commit it as one immutable transaction
    ///
    /// The transaction row, its entries, and the balance increment of
    /// every referenced account land in storage as a single atomic unit;
    /// a failure at any point leaves prior state untouched.
    pub async fn create_transaction(&mut self, draft: NewTransaction) -> LedgerResult<Transaction> {
        // Shape checks first: entry count and the zero-sum invariant
        self.validator.validate_draft(&draft)?;

        // Every referenced account must exist and belong to the draft's
        // organization
        for entry in &draft.entries {
            let account = self
                .storage
                .get_account(&entry.account_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(entry.account_id.clone()))?;
            if account.organization_id != draft.organization_id {
                return Err(LedgerError::AccountNotFound(entry.account_id.clone()));
            }
        }

        let transaction_id = Uuid::new_v4().to_string();
        let entries = draft
            .entries
            .into_iter()
            .map(|e| LedgerEntry {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.clone(),
                account_id: e.account_id,
                amount: e.amount,
                description: e.description,
            })
            .collect();

        let transaction = Transaction {
            id: transaction_id,
            organization_id: draft.organization_id,
            date: draft.date,
            description: draft.description,
            reference: draft.reference,
            status: TransactionStatus::Posted,
            entries,
            created_at: chrono::Utc::now().naive_utc(),
        };

        self.storage.commit_transaction(&transaction).await?;

        debug!(
            transaction_id = %transaction.id,
            entries = transaction.entries.len(),
            "committed transaction"
        );

        Ok(transaction)
    }

    /// Get a transaction by ID
    pub async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        self.storage.get_transaction(transaction_id).await
    }

    /// Get a transaction by ID, returning an error if not found
    pub async fn get_transaction_required(
        &self,
        transaction_id: &str,
    ) -> LedgerResult<Transaction> {
        self.storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))
    }

    /// List an organization's transactions, newest first
    ///
    /// The filter (dates, status, account) is applied by the store before
    /// the page is cut, so a page is short only on the last page.
    pub async fn list_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
        page: Page,
    ) -> LedgerResult<Paginated<Transaction>> {
        self.storage
            .list_transactions(organization_id, filter, page)
            .await
    }

    /// Fetch an organization's transactions without pagination
    pub async fn find_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<Transaction>> {
        self.storage.find_transactions(organization_id, filter).await
    }
}
