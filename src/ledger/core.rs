//! Main ledger orchestrator that coordinates accounts and transactions

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{AccountManager, TransactionEngine};
use crate::traits::*;
use crate::types::*;

/// Main ledger system that orchestrates all accounting operations
pub struct Ledger<S: LedgerStore> {
    account_manager: AccountManager<S>,
    transaction_engine: TransactionEngine<S>,
}

impl<S: LedgerStore + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            transaction_engine: TransactionEngine::new(storage),
        }
    }

    /// Create a new ledger with custom validators
    pub fn with_validators(
        storage: S,
        account_validator: Box<dyn AccountValidator>,
        transaction_validator: Box<dyn TransactionValidator>,
    ) -> Self {
        Self {
            account_manager: AccountManager::with_validator(storage.clone(), account_validator),
            transaction_engine: TransactionEngine::with_validator(storage, transaction_validator),
        }
    }

    // Account operations
    /// Create a new account
    pub async fn create_account(&mut self, account: Account) -> LedgerResult<Account> {
        self.account_manager.create_account(account).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(account_id).await
    }

    /// Get an account by its number within an organization
    pub async fn get_account_by_number(
        &self,
        organization_id: &str,
        account_number: &str,
    ) -> LedgerResult<Option<Account>> {
        self.account_manager
            .get_account_by_number(organization_id, account_number)
            .await
    }

    /// List an organization's accounts
    pub async fn list_accounts(&self, organization_id: &str) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts(organization_id).await
    }

    /// List an organization's accounts of one type
    pub async fn list_accounts_by_type(
        &self,
        organization_id: &str,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.account_manager
            .list_accounts_by_type(organization_id, account_type)
            .await
    }

    /// Delete an account; refused while ledger entries reference it
    pub async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        self.account_manager.delete_account(account_id).await
    }

    /// Get an account's materialized balance
    pub async fn get_account_balance(&self, account_id: &str) -> LedgerResult<BigDecimal> {
        self.account_manager.balance(account_id).await
    }

    // Transaction operations
    /// Validate and atomically commit a transaction draft
    pub async fn create_transaction(&mut self, draft: NewTransaction) -> LedgerResult<Transaction> {
        self.transaction_engine.create_transaction(draft).await
    }

    /// Get a transaction by ID
    pub async fn get_transaction(&self, transaction_id: &str) -> LedgerResult<Option<Transaction>> {
        self.transaction_engine.get_transaction(transaction_id).await
    }

    /// List an organization's transactions, newest first, paginated
    pub async fn list_transactions(
        &self,
        organization_id: &str,
        filter: &TransactionFilter,
        page: Page,
    ) -> LedgerResult<Paginated<Transaction>> {
        self.transaction_engine
            .list_transactions(organization_id, filter, page)
            .await
    }

    /// Recompute every account balance from the full entry history and
    /// compare against the materialized value
    ///
    /// This is an audit of the denormalized aggregate, not a repair
    /// mechanism; the write path maintains balances inside the same
    /// atomic commit that creates the entries.
    pub async fn audit_balances(&self, organization_id: &str) -> LedgerResult<BalanceAuditReport> {
        let accounts = self.account_manager.list_accounts(organization_id).await?;
        let transactions = self
            .transaction_engine
            .find_transactions(organization_id, &TransactionFilter::default())
            .await?;

        let mut discrepancies = Vec::new();
        for account in accounts {
            let entry_sum: BigDecimal = transactions
                .iter()
                .flat_map(|t| &t.entries)
                .filter(|e| e.account_id == account.id)
                .map(|e| &e.amount)
                .sum();
            let recomputed = &account.opening_balance + entry_sum;

            if recomputed != account.current_balance {
                discrepancies.push(BalanceDiscrepancy {
                    account_id: account.id.clone(),
                    account_number: account.account_number.clone(),
                    stored_balance: account.current_balance.clone(),
                    recomputed_balance: recomputed,
                });
            }
        }

        Ok(BalanceAuditReport {
            organization_id: organization_id.to_string(),
            is_consistent: discrepancies.is_empty(),
            discrepancies,
        })
    }
}

/// Report comparing materialized balances against recomputed ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAuditReport {
    pub organization_id: String,
    pub is_consistent: bool,
    pub discrepancies: Vec<BalanceDiscrepancy>,
}

/// One account whose materialized balance disagrees with its entry history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDiscrepancy {
    pub account_id: String,
    pub account_number: String,
    pub stored_balance: BigDecimal,
    pub recomputed_balance: BigDecimal,
}
