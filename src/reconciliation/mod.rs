//! Bank statement reconciliation workspace
//!
//! Manages statements through their workflow (pending -> in_progress ->
//! matched -> completed), drives matching between statement lines and
//! committed ledger transactions, and certifies the close-out balance.
//! Transitions on one statement are serialized through whole-statement
//! swaps at the storage layer.

pub mod matching;

pub use matching::*;

use std::io::Read;

use serde::Deserialize;
use tracing::debug;

use crate::bulk::rows::{parse_amount, parse_date};
use crate::bulk::ImportOutcome;
use crate::traits::LedgerStore;
use crate::types::*;

/// Raw bank statement row as deserialized from an import file
#[derive(Debug, Clone, Deserialize)]
struct StatementRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Amount", default)]
    amount: Option<String>,
}

impl StatementRow {
    fn validate(self, line: usize) -> Result<StatementTransaction, String> {
        let date_cell = self
            .date
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("row {line}: missing Date"))?;
        let date = parse_date(&date_cell)
            .ok_or_else(|| format!("row {line}: invalid Date '{}'", date_cell.trim()))?;

        let description = self
            .description
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("row {line}: missing Description"))?;

        let amount_cell = self
            .amount
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| format!("row {line}: missing Amount"))?;
        let amount = parse_amount(&amount_cell)
            .ok_or_else(|| format!("row {line}: invalid Amount '{}'", amount_cell.trim()))?;

        Ok(StatementTransaction::new(date, description, amount))
    }
}

/// Workspace managing bank statements and their reconciliation workflow
pub struct ReconciliationWorkspace<S: LedgerStore> {
    storage: S,
    matcher: Box<dyn TransactionMatcher>,
}

impl<S: LedgerStore> ReconciliationWorkspace<S> {
    /// Create a workspace with the default rule-based matcher
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            matcher: Box::new(RuleBasedMatcher::default()),
        }
    }

    /// Create a workspace with a custom matcher
    pub fn with_matcher(storage: S, matcher: Box<dyn TransactionMatcher>) -> Self {
        Self { storage, matcher }
    }

    /// Create a new statement in the pending state
    pub async fn create_statement(
        &mut self,
        account_id: &str,
        period_start: chrono::NaiveDate,
        period_end: chrono::NaiveDate,
        opening_balance: bigdecimal::BigDecimal,
        closing_balance: bigdecimal::BigDecimal,
    ) -> LedgerResult<ReconciliationStatement> {
        if period_end < period_start {
            return Err(LedgerError::Validation(
                "Statement period end cannot precede its start".to_string(),
            ));
        }

        // The covered account must exist
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let statement = ReconciliationStatement::new(
            account_id.to_string(),
            period_start,
            period_end,
            opening_balance,
            closing_balance,
        );
        self.storage.insert_statement(&statement).await?;

        Ok(statement)
    }

    /// Get a statement by ID
    pub async fn get_statement(
        &self,
        statement_id: &str,
    ) -> LedgerResult<Option<ReconciliationStatement>> {
        self.storage.get_statement(statement_id).await
    }

    /// List the statements covering an account
    pub async fn list_statements(
        &self,
        account_id: &str,
    ) -> LedgerResult<Vec<ReconciliationStatement>> {
        self.storage.list_statements(account_id).await
    }

    /// Import bank-format statement lines into a statement
    ///
    /// Rows are validated independently and bad rows accumulate as
    /// errors. The first successful import moves a pending statement to
    /// in_progress.
    pub async fn import_statement_transactions<R: Read>(
        &mut self,
        statement_id: &str,
        reader: R,
    ) -> LedgerResult<ImportOutcome<StatementTransaction>> {
        let mut statement = self.statement_required(statement_id).await?;
        if statement.status.is_terminal() {
            return Err(LedgerError::Conflict(format!(
                "Statement '{statement_id}' is completed and immutable"
            )));
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut outcome = ImportOutcome::default();
        for (index, record) in csv_reader.deserialize::<StatementRow>().enumerate() {
            let line = index + 2;
            match record {
                Ok(row) => match row.validate(line) {
                    Ok(transaction) => outcome.success.push(transaction),
                    Err(err) => outcome.errors.push(err),
                },
                Err(err) => outcome.errors.push(format!("row {line}: {err}")),
            }
        }

        if !outcome.success.is_empty() {
            statement
                .transactions
                .extend(outcome.success.iter().cloned());
            if statement.status == StatementStatus::Pending {
                statement.status = StatementStatus::InProgress;
                debug!(statement_id, "statement moved to in_progress");
            }
            self.storage.update_statement(&statement).await?;
        }

        Ok(outcome)
    }

    /// Propose pairings between unreconciled statement lines and
    /// unreconciled ledger transactions in the statement's period
    ///
    /// Candidates only; nothing is reconciled until confirmed.
    pub async fn match_transactions(
        &self,
        statement_id: &str,
    ) -> LedgerResult<Vec<TransactionMatch>> {
        let statement = self.statement_required(statement_id).await?;
        if statement.status.is_terminal() {
            return Err(LedgerError::Conflict(format!(
                "Statement '{statement_id}' is completed and immutable"
            )));
        }

        let account = self
            .storage
            .get_account(&statement.account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(statement.account_id.clone()))?;

        let filter = TransactionFilter {
            start_date: Some(statement.period_start),
            end_date: Some(statement.period_end),
            account_id: Some(statement.account_id.clone()),
            status: Some(TransactionStatus::Posted),
        };
        let transactions = self
            .storage
            .find_transactions(&account.organization_id, &filter)
            .await?;

        let candidates: Vec<LedgerCandidate> = transactions
            .iter()
            .map(|t| LedgerCandidate {
                transaction_id: t.id.clone(),
                date: t.date,
                description: t.description.clone(),
                amount: t.amount_for_account(&statement.account_id),
            })
            .collect();

        Ok(self
            .matcher
            .find_matches(&statement.transactions, &candidates))
    }

    /// Confirm a pairing, marking both sides reconciled
    ///
    /// Idempotent: confirming the same pair again is a no-op. Pairing a
    /// line or a ledger transaction that is already reconciled elsewhere
    /// is a conflict.
    pub async fn reconcile_transaction(
        &mut self,
        statement_transaction_id: &str,
        transaction_id: &str,
    ) -> LedgerResult<()> {
        let mut statement = self
            .storage
            .find_statement_with_transaction(statement_transaction_id)
            .await?
            .ok_or_else(|| {
                LedgerError::StatementNotFound(format!(
                    "No statement contains transaction '{statement_transaction_id}'"
                ))
            })?;
        if statement.status.is_terminal() {
            return Err(LedgerError::Conflict(format!(
                "Statement '{}' is completed and immutable",
                statement.id
            )));
        }

        let line = statement
            .transaction(statement_transaction_id)
            .ok_or_else(|| {
                LedgerError::StatementNotFound(format!(
                    "No statement contains transaction '{statement_transaction_id}'"
                ))
            })?;

        if line.reconciled {
            return if line.matched_transaction_id.as_deref() == Some(transaction_id) {
                // Confirming the same pair twice is a no-op
                Ok(())
            } else {
                Err(LedgerError::Conflict(format!(
                    "Statement transaction '{statement_transaction_id}' is already reconciled \
                     to a different transaction"
                )))
            };
        }

        let transaction = self
            .storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if transaction.status == TransactionStatus::Reconciled {
            return Err(LedgerError::Conflict(format!(
                "Transaction '{transaction_id}' is already reconciled"
            )));
        }

        if let Some(line) = statement.transaction_mut(statement_transaction_id) {
            line.reconciled = true;
            line.matched_transaction_id = Some(transaction_id.to_string());
        }

        self.storage
            .set_transaction_status(transaction_id, TransactionStatus::Reconciled)
            .await?;

        // Once every line is confirmed and the close-out sum agrees, the
        // statement advances to matched on its own
        if statement.status == StatementStatus::InProgress
            && statement.all_reconciled()
            && amounts_equal(
                &statement.implied_closing_balance(),
                &statement.closing_balance,
            )
        {
            statement.status = StatementStatus::Matched;
            debug!(statement_id = %statement.id, "statement moved to matched");
        }

        self.storage.update_statement(&statement).await
    }

    /// Reverse a confirmed pairing, clearing both sides
    ///
    /// Permitted any time before the statement completes.
    pub async fn unmatch_transaction(
        &mut self,
        statement_transaction_id: &str,
    ) -> LedgerResult<()> {
        let mut statement = self
            .storage
            .find_statement_with_transaction(statement_transaction_id)
            .await?
            .ok_or_else(|| {
                LedgerError::StatementNotFound(format!(
                    "No statement contains transaction '{statement_transaction_id}'"
                ))
            })?;
        if statement.status.is_terminal() {
            return Err(LedgerError::Conflict(format!(
                "Statement '{}' is completed and immutable",
                statement.id
            )));
        }

        let matched_transaction_id = match statement.transaction_mut(statement_transaction_id) {
            Some(line) if line.reconciled => {
                line.reconciled = false;
                line.matched_transaction_id.take()
            }
            // Unmatching an unmatched line changes nothing
            Some(_) => return Ok(()),
            None => {
                return Err(LedgerError::StatementNotFound(format!(
                    "No statement contains transaction '{statement_transaction_id}'"
                )))
            }
        };

        if let Some(transaction_id) = matched_transaction_id {
            self.storage
                .set_transaction_status(&transaction_id, TransactionStatus::Posted)
                .await?;
        }

        // A fully-matched statement drops back once a pairing is undone
        if statement.status == StatementStatus::Matched {
            statement.status = StatementStatus::InProgress;
        }

        self.storage.update_statement(&statement).await
    }

    /// Certify the statement: every line reconciled and the close-out
    /// balance in agreement, after which the statement is immutable
    pub async fn complete_reconciliation(
        &mut self,
        statement_id: &str,
    ) -> LedgerResult<ReconciliationStatement> {
        let mut statement = self.statement_required(statement_id).await?;

        match statement.status {
            StatementStatus::Completed => {
                return Err(LedgerError::Conflict(format!(
                    "Statement '{statement_id}' is already completed"
                )))
            }
            StatementStatus::Pending => {
                return Err(LedgerError::Conflict(format!(
                    "Statement '{statement_id}' has no imported transactions"
                )))
            }
            StatementStatus::InProgress | StatementStatus::Matched => {}
        }

        if !statement.all_reconciled() {
            let unreconciled = statement
                .transactions
                .iter()
                .filter(|t| !t.reconciled)
                .count();
            return Err(LedgerError::Validation(format!(
                "Statement '{statement_id}' still has {unreconciled} unreconciled transactions"
            )));
        }

        let implied = statement.implied_closing_balance();
        if !amounts_equal(&implied, &statement.closing_balance) {
            return Err(LedgerError::BalanceMismatch {
                expected: statement.closing_balance.clone(),
                actual: implied,
            });
        }

        statement.status = StatementStatus::Completed;
        self.storage.update_statement(&statement).await?;
        debug!(statement_id, "statement completed");

        Ok(statement)
    }

    async fn statement_required(
        &self,
        statement_id: &str,
    ) -> LedgerResult<ReconciliationStatement> {
        self.storage
            .get_statement(statement_id)
            .await?
            .ok_or_else(|| LedgerError::StatementNotFound(statement_id.to_string()))
    }
}
