//! Core types and data structures for the ledger system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Inventory, Equipment, etc.)
    Asset,
    /// Liabilities - what the business owes (Loans, Accounts Payable, etc.)
    Liability,
    /// Equity - owner's interest in the business (Capital, Retained Earnings, etc.)
    Equity,
    /// Income/Revenue - money earned by the business
    Income,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Parse an account type from a tabular cell, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Some(AccountType::Asset),
            "LIABILITY" => Some(AccountType::Liability),
            "EQUITY" => Some(AccountType::Equity),
            "INCOME" => Some(AccountType::Income),
            "EXPENSE" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Canonical uppercase label used in tabular exchange
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
        }
    }
}

/// Core account structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Organization that owns the account
    pub organization_id: String,
    /// Account number, unique within the organization
    pub account_number: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Optional finer-grained classification (e.g. "current", "fixed")
    pub subtype: Option<String>,
    /// Optional free-form description
    pub description: Option<String>,
    /// Balance the account started with, fixed at creation
    pub opening_balance: BigDecimal,
    /// Materialized balance, maintained by committed transactions only
    pub current_balance: BigDecimal,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(
        organization_id: String,
        account_number: String,
        name: String,
        account_type: AccountType,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            organization_id,
            account_number,
            name,
            account_type,
            subtype: None,
            description: None,
            opening_balance: BigDecimal::from(0),
            current_balance: BigDecimal::from(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the subtype
    pub fn with_subtype(mut self, subtype: String) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the opening balance; the current balance starts there too
    pub fn with_opening_balance(mut self, balance: BigDecimal) -> Self {
        self.opening_balance = balance.clone();
        self.current_balance = balance;
        self
    }
}

/// Lifecycle status of a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Committed to the ledger
    Posted,
    /// Confirmed against a bank statement line
    Reconciled,
}

/// One signed line item of a transaction, posted against exactly one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Transaction that owns this entry
    pub transaction_id: String,
    /// Account the entry is posted against (lookup reference, not ownership)
    pub account_id: String,
    /// Signed amount; debits and credits carry opposite signs
    pub amount: BigDecimal,
    /// Optional description for this specific entry
    pub description: Option<String>,
}

/// Committed transaction with its owned entries
///
/// Transactions are append-only: once committed the financial content
/// (date, description, entries) never changes. The status flag is the
/// only mutable field and is driven by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: String,
    /// Organization that owns the transaction
    pub organization_id: String,
    /// Date when the transaction occurred
    pub date: NaiveDate,
    /// Description of the transaction
    pub description: String,
    /// Optional reference number (invoice number, check number, etc.)
    pub reference: Option<String>,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// Entries that make up this transaction; they cannot outlive it
    pub entries: Vec<LedgerEntry>,
    /// When the transaction was created
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Sum of all entry amounts; zero (within tolerance) for a valid transaction
    pub fn entry_sum(&self) -> BigDecimal {
        self.entries.iter().map(|e| &e.amount).sum()
    }

    /// Check the double-entry invariant
    pub fn is_balanced(&self) -> bool {
        is_within_tolerance(&self.entry_sum())
    }

    /// Net amount this transaction posts against one account
    pub fn amount_for_account(&self, account_id: &str) -> BigDecimal {
        self.entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(|e| &e.amount)
            .sum()
    }
}

/// One entry of a transaction draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Account the entry will be posted against
    pub account_id: String,
    /// Signed amount
    pub amount: BigDecimal,
    /// Optional description for this specific entry
    pub description: Option<String>,
}

/// Transaction draft as received at the request boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Organization the transaction belongs to
    pub organization_id: String,
    /// Date when the transaction occurred
    pub date: NaiveDate,
    /// Description of the transaction
    pub description: String,
    /// Optional reference number
    pub reference: Option<String>,
    /// Entries to post; at least two are required
    pub entries: Vec<NewEntry>,
}

impl NewTransaction {
    /// Start a draft with no entries
    pub fn new(organization_id: String, date: NaiveDate, description: String) -> Self {
        Self {
            organization_id,
            date,
            description,
            reference: None,
            entries: Vec::new(),
        }
    }

    /// Set the reference
    pub fn reference(mut self, reference: String) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Add an entry
    pub fn entry(
        mut self,
        account_id: String,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        self.entries.push(NewEntry {
            account_id,
            amount,
            description,
        });
        self
    }

    /// Sum of all draft entry amounts
    pub fn entry_sum(&self) -> BigDecimal {
        self.entries.iter().map(|e| &e.amount).sum()
    }

    /// Check the double-entry invariant
    pub fn is_balanced(&self) -> bool {
        is_within_tolerance(&self.entry_sum())
    }
}

/// Filters for transaction listings and exports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Keep transactions dated on or after this date
    pub start_date: Option<NaiveDate>,
    /// Keep transactions dated on or before this date
    pub end_date: Option<NaiveDate>,
    /// Keep transactions posting at least one entry against this account
    pub account_id: Option<String>,
    /// Keep transactions in this status
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Whether a transaction satisfies every set criterion
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(start) = self.start_date {
            if transaction.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if transaction.date > end {
                return false;
            }
        }
        if let Some(status) = self.status {
            if transaction.status != status {
                return false;
            }
        }
        if let Some(ref account_id) = self.account_id {
            if !transaction
                .entries
                .iter()
                .any(|e| &e.account_id == account_id)
            {
                return false;
            }
        }
        true
    }
}

/// Page request for transaction listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub page: u32,
    /// Maximum number of items per page
    pub limit: u32,
}

impl Page {
    /// Create a page request; page numbers below 1 are treated as 1
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit,
        }
    }

    /// Number of items to skip before this page starts
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

/// Pagination metadata returned with a page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of results plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    /// Assemble a page from its slice and the unpaginated total
    pub fn new(data: Vec<T>, page: Page, total: u64) -> Self {
        let total_pages = if page.limit == 0 {
            0
        } else {
            total.div_ceil(page.limit as u64)
        };
        Self {
            data,
            pagination: PageInfo {
                page: page.page,
                limit: page.limit,
                total,
                total_pages,
            },
        }
    }
}

/// Status of a reconciliation statement
///
/// Transitions are monotonic: pending -> in_progress -> matched ->
/// completed, and completed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    Pending,
    InProgress,
    Matched,
    Completed,
}

impl StatementStatus {
    /// Completed statements are immutable
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatementStatus::Completed)
    }
}

/// One line of an imported bank statement
///
/// Every imported row gets a fresh id so duplicate rows with identical
/// amount and date remain distinguishable during matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    /// Stable row identity
    pub id: String,
    /// Date reported by the bank
    pub date: NaiveDate,
    /// Description reported by the bank
    pub description: String,
    /// Signed amount reported by the bank
    pub amount: BigDecimal,
    /// Whether this row has been confirmed against a ledger transaction
    pub reconciled: bool,
    /// Ledger transaction this row is reconciled to, if any
    pub matched_transaction_id: Option<String>,
}

impl StatementTransaction {
    /// Create an unreconciled statement line
    pub fn new(date: NaiveDate, description: String, amount: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            description,
            amount,
            reconciled: false,
            matched_transaction_id: None,
        }
    }
}

/// Bank statement being reconciled against the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStatement {
    /// Unique identifier for the statement
    pub id: String,
    /// Account the statement covers
    pub account_id: String,
    /// First day of the statement period
    pub period_start: NaiveDate,
    /// Last day of the statement period
    pub period_end: NaiveDate,
    /// Balance reported at the start of the period
    pub opening_balance: BigDecimal,
    /// Balance reported at the end of the period
    pub closing_balance: BigDecimal,
    /// Imported statement lines
    pub transactions: Vec<StatementTransaction>,
    /// Workflow status
    pub status: StatementStatus,
    /// When the statement was created
    pub created_at: NaiveDateTime,
}

impl ReconciliationStatement {
    /// Create a new statement in the pending state
    pub fn new(
        account_id: String,
        period_start: NaiveDate,
        period_end: NaiveDate,
        opening_balance: BigDecimal,
        closing_balance: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            period_start,
            period_end,
            opening_balance,
            closing_balance,
            transactions: Vec::new(),
            status: StatementStatus::Pending,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Sum of the amounts of reconciled statement lines
    pub fn reconciled_sum(&self) -> BigDecimal {
        self.transactions
            .iter()
            .filter(|t| t.reconciled)
            .map(|t| &t.amount)
            .sum()
    }

    /// Whether every statement line has been reconciled
    pub fn all_reconciled(&self) -> bool {
        !self.transactions.is_empty() && self.transactions.iter().all(|t| t.reconciled)
    }

    /// Balance the reconciled lines imply at the end of the period
    pub fn implied_closing_balance(&self) -> BigDecimal {
        &self.opening_balance + self.reconciled_sum()
    }

    /// Find a statement line by id
    pub fn transaction(&self, statement_transaction_id: &str) -> Option<&StatementTransaction> {
        self.transactions
            .iter()
            .find(|t| t.id == statement_transaction_id)
    }

    /// Find a statement line by id, mutably
    pub fn transaction_mut(
        &mut self,
        statement_transaction_id: &str,
    ) -> Option<&mut StatementTransaction> {
        self.transactions
            .iter_mut()
            .find(|t| t.id == statement_transaction_id)
    }
}

/// Candidate pairing of a statement line and a ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMatch {
    /// Statement line being matched
    pub statement_transaction_id: String,
    /// Ledger transaction proposed as its counterpart
    pub transaction_id: String,
    /// Heuristic confidence that the two describe the same event, in [0, 1]
    pub confidence: f64,
}

/// Tolerance used when comparing sums to zero or balances to expected
/// values, absorbing rounding noise from tabular input
pub fn amount_tolerance() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(1000)
}

/// Whether a value is zero within the shared tolerance
pub fn is_within_tolerance(value: &BigDecimal) -> bool {
    value.abs() <= amount_tolerance()
}

/// Whether two amounts are equal within the shared tolerance
pub fn amounts_equal(a: &BigDecimal, b: &BigDecimal) -> bool {
    is_within_tolerance(&(a - b))
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Input failed shape validation before reaching storage
    #[error("Validation error: {0}")]
    Validation(String),
    /// Transaction entries do not sum to zero within tolerance
    #[error("Unbalanced transaction: entries sum to {sum}")]
    Unbalanced { sum: BigDecimal },
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Statement not found: {0}")]
    StatementNotFound(String),
    /// Operation conflicts with existing state (duplicate account number,
    /// mutating a completed statement, re-pairing a reconciled line)
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Reconciliation close-out check failed
    #[error("Balance mismatch: statement closes at {expected}, reconciled lines imply {actual}")]
    BalanceMismatch {
        expected: BigDecimal,
        actual: BigDecimal,
    },
    /// Storage failure; the current atomic unit was rolled back
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tolerance_absorbs_sub_millis() {
        assert!(is_within_tolerance(&BigDecimal::from_str("0.0009").unwrap()));
        assert!(is_within_tolerance(&BigDecimal::from_str("-0.001").unwrap()));
        assert!(!is_within_tolerance(&BigDecimal::from_str("0.002").unwrap()));
    }

    #[test]
    fn account_type_parses_case_insensitively() {
        assert_eq!(AccountType::parse("asset"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse(" EXPENSE "), Some(AccountType::Expense));
        assert_eq!(AccountType::parse("bogus"), None);
    }

    #[test]
    fn draft_balance_check_uses_tolerance() {
        let draft = NewTransaction::new(
            "org".to_string(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            "Rounding noise".to_string(),
        )
        .entry(
            "a".to_string(),
            BigDecimal::from_str("10.0005").unwrap(),
            None,
        )
        .entry(
            "b".to_string(),
            BigDecimal::from_str("-10.00").unwrap(),
            None,
        );

        assert!(draft.is_balanced());
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let page = Page::new(1, 10);
        let result: Paginated<u8> = Paginated::new(vec![], page, 21);
        assert_eq!(result.pagination.total_pages, 3);
    }

    #[test]
    fn statement_lines_keep_distinct_identity() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let a = StatementTransaction::new(date, "Coffee".to_string(), BigDecimal::from(-4));
        let b = StatementTransaction::new(date, "Coffee".to_string(), BigDecimal::from(-4));
        assert_ne!(a.id, b.id);
    }
}
