//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::LedgerStore;
use crate::types::*;

#[derive(Debug, Default)]
struct StoreInner {
    accounts: HashMap<String, Account>,
    transactions: HashMap<String, Transaction>,
    statements: HashMap<String, ReconciliationStatement>,
}

/// In-memory ledger store
///
/// All writes go through a single lock, which is what makes
/// `commit_transaction` an all-or-nothing unit and serializes balance
/// increments against concurrent commits on the same account. Clones
/// share the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.accounts.clear();
        inner.transactions.clear();
        inner.statements.clear();
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();

        let duplicate = inner.accounts.values().any(|a| {
            a.organization_id == account.organization_id
                && a.account_number == account.account_number
        });
        if duplicate {
            return Err(LedgerError::Conflict(format!(
                "Account number '{}' already exists in organization '{}'",
                account.account_number, account.organization_id
            )));
        }

        inner.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.inner.read().unwrap().accounts.get(account_id).cloned())
    }

    async fn get_account_by_number(
        &self,
        organization_id: &str,
        account_number: &str,
    ) -> LedgerResult<Option<Account>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .accounts
            .values()
            .find(|a| a.organization_id == organization_id && a.account_number == account_number)
            .cloned())
    }

    async fn list_accounts(
        &self,
        organization_id: &str,
        account_type: Option<AccountType>,
    ) -> LedgerResult<Vec<Account>> {
        let inner = self.inner.read().unwrap();
        let mut accounts: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| account_type.is_none_or(|t| a.account_type == t))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(accounts)
    }

    async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();

        if !inner.accounts.contains_key(account_id) {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }

        let referenced = inner
            .transactions
            .values()
            .any(|t| t.entries.iter().any(|e| e.account_id == account_id));
        if referenced {
            return Err(LedgerError::Conflict(format!(
                "Account '{}' still has ledger entries",
                account_id
            )));
        }

        inner.accounts.remove(account_id);
        Ok(())
    }

    async fn commit_transaction(&mut self, transaction: &Transaction) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();

        if inner.transactions.contains_key(&transaction.id) {
            return Err(LedgerError::Conflict(format!(
                "Transaction '{}' already committed",
                transaction.id
            )));
        }

        // Resolve every account before touching anything so a failure
        // leaves no partial state behind.
        for entry in &transaction.entries {
            let account = inner.accounts.get(&entry.account_id).ok_or_else(|| {
                LedgerError::AccountNotFound(entry.account_id.clone())
            })?;
            if account.organization_id != transaction.organization_id {
                return Err(LedgerError::AccountNotFound(entry.account_id.clone()));
            }
        }

        let now = chrono::Utc::now().naive_utc();
        for entry in &transaction.entries {
            if let Some(account) = inner.accounts.get_mut(&entry.account_id) {
                account.current_balance += &entry.amount;
                account.updated_at = now;
            }
        }
        inner
            .transactions
            .insert(transaction.id.clone(), transaction.clone());

        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .transactions
            .get(transaction_id)
            .cloned())
    }

    async fn list_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
        page: Page,
    ) -> LedgerResult<Paginated<Transaction>> {
        // The filter runs over the full result set before the page is
        // sliced; filtering an already-sliced page would under-fill it.
        let matching = self.find_transactions(organization_id, filter).await?;
        let total = matching.len() as u64;
        let data: Vec<Transaction> = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit as usize)
            .collect();
        Ok(Paginated::new(data, page, total))
    }

    async fn find_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        let mut transactions: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.organization_id == organization_id)
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        // Newest first; id as a tiebreak keeps the order stable.
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(transactions)
    }

    async fn set_transaction_status(
        &mut self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        match inner.transactions.get_mut(transaction_id) {
            Some(transaction) => {
                transaction.status = status;
                Ok(())
            }
            None => Err(LedgerError::TransactionNotFound(transaction_id.to_string())),
        }
    }

    async fn insert_statement(&mut self, statement: &ReconciliationStatement) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .statements
            .insert(statement.id.clone(), statement.clone());
        Ok(())
    }

    async fn get_statement(
        &self,
        statement_id: &str,
    ) -> LedgerResult<Option<ReconciliationStatement>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .statements
            .get(statement_id)
            .cloned())
    }

    async fn find_statement_with_transaction(
        &self,
        statement_transaction_id: &str,
    ) -> LedgerResult<Option<ReconciliationStatement>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .statements
            .values()
            .find(|s| s.transactions.iter().any(|t| t.id == statement_transaction_id))
            .cloned())
    }

    async fn list_statements(
        &self,
        account_id: &str,
    ) -> LedgerResult<Vec<ReconciliationStatement>> {
        let inner = self.inner.read().unwrap();
        let mut statements: Vec<ReconciliationStatement> = inner
            .statements
            .values()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect();
        statements.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        Ok(statements)
    }

    async fn update_statement(&mut self, statement: &ReconciliationStatement) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.statements.contains_key(&statement.id) {
            return Err(LedgerError::StatementNotFound(statement.id.clone()));
        }
        inner
            .statements
            .insert(statement.id.clone(), statement.clone());
        Ok(())
    }
}
