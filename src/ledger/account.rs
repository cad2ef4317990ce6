//! Account management functionality

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Account manager for handling chart of accounts operations
pub struct AccountManager<S: LedgerStore> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStore> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account
    pub async fn create_account(&mut self, account: Account) -> LedgerResult<Account> {
        // Validate the account
        self.validator.validate_account(&account)?;

        // Account numbers are unique per organization
        if self
            .storage
            .get_account_by_number(&account.organization_id, &account.account_number)
            .await?
            .is_some()
        {
            return Err(LedgerError::Conflict(format!(
                "Account number '{}' already exists in organization '{}'",
                account.account_number, account.organization_id
            )));
        }

        self.storage.insert_account(&account).await?;

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Get an account by its number within an organization
    pub async fn get_account_by_number(
        &self,
        organization_id: &str,
        account_number: &str,
    ) -> LedgerResult<Option<Account>> {
        self.storage
            .get_account_by_number(organization_id, account_number)
            .await
    }

    /// List an organization's accounts, ordered by account number
    pub async fn list_accounts(&self, organization_id: &str) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(organization_id, None).await
    }

    /// List an organization's accounts of one type
    pub async fn list_accounts_by_type(
        &self,
        organization_id: &str,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.storage
            .list_accounts(organization_id, Some(account_type))
            .await
    }

    /// Delete an account; refused while ledger entries reference it
    pub async fn delete_account(&mut self, account_id: &str) -> LedgerResult<()> {
        self.storage.delete_account(account_id).await
    }

    /// Get an account's materialized balance
    pub async fn balance(&self, account_id: &str) -> LedgerResult<BigDecimal> {
        Ok(self.get_account_required(account_id).await?.current_balance)
    }
}
