//! Tabular row shapes and boundary validation for the bulk pipeline
//!
//! Raw rows deserialize loosely (every cell optional) and are converted
//! into validated variants before anything reaches the engine, so the
//! engine never branches on ad hoc shape checks.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{Account, AccountType};

/// Raw account row as deserialized from an import file
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRow {
    #[serde(rename = "accountNumber", default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "openingBalance", default)]
    pub opening_balance: Option<String>,
}

/// Account row that passed boundary validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAccountRow {
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: Option<String>,
    pub description: Option<String>,
    pub opening_balance: BigDecimal,
}

impl AccountRow {
    /// Convert the raw row into its validated variant or a row error
    pub fn validate(self, line: usize) -> Result<ValidatedAccountRow, String> {
        let account_number = non_empty(self.account_number)
            .ok_or_else(|| format!("row {line}: missing accountNumber"))?;
        let name = non_empty(self.name).ok_or_else(|| format!("row {line}: missing name"))?;
        let type_cell =
            non_empty(self.account_type).ok_or_else(|| format!("row {line}: missing type"))?;
        let account_type = AccountType::parse(&type_cell)
            .ok_or_else(|| format!("row {line}: unknown account type '{type_cell}'"))?;

        let opening_balance = match non_empty(self.opening_balance) {
            Some(cell) => parse_amount(&cell)
                .ok_or_else(|| format!("row {line}: invalid openingBalance '{cell}'"))?,
            None => BigDecimal::from(0),
        };

        Ok(ValidatedAccountRow {
            account_number,
            name,
            account_type,
            subtype: non_empty(self.subtype),
            description: non_empty(self.description),
            opening_balance,
        })
    }
}

/// Account row written by the export path
#[derive(Debug, Clone, Serialize)]
pub struct AccountExportRow {
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub subtype: String,
    pub description: String,
    #[serde(rename = "currentBalance")]
    pub current_balance: BigDecimal,
}

impl From<&Account> for AccountExportRow {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number.clone(),
            name: account.name.clone(),
            account_type: account.account_type.as_str().to_string(),
            subtype: account.subtype.clone().unwrap_or_default(),
            description: account.description.clone().unwrap_or_default(),
            current_balance: account.current_balance.clone(),
        }
    }
}

/// Raw flattened entry row as deserialized from an import file
///
/// Each logical transaction appears as N consecutive rows sharing a
/// grouping key: the TransactionID column, falling back to Reference.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryRow {
    #[serde(rename = "TransactionID", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "Reference", default)]
    pub reference: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "AccountNumber", default)]
    pub account_number: Option<String>,
    #[serde(rename = "Amount", default)]
    pub amount: Option<String>,
    #[serde(rename = "EntryDescription", default)]
    pub entry_description: Option<String>,
}

/// Entry row that passed boundary validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEntryRow {
    /// Explicit grouping key; rows sharing it form one transaction
    pub group_key: String,
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub account_number: String,
    pub amount: BigDecimal,
    pub entry_description: Option<String>,
    /// 1-based source line, for error messages
    pub line: usize,
}

impl EntryRow {
    /// Convert the raw row into its validated variant or a row error
    ///
    /// An explicit, non-empty grouping key is a hard requirement;
    /// transaction boundaries are never inferred from row adjacency.
    pub fn validate(self, line: usize) -> Result<ValidatedEntryRow, String> {
        let reference = non_empty(self.reference);
        let group_key = non_empty(self.transaction_id)
            .or_else(|| reference.clone())
            .ok_or_else(|| format!("row {line}: missing TransactionID or Reference grouping key"))?;

        let date_cell = non_empty(self.date).ok_or_else(|| format!("row {line}: missing Date"))?;
        let date = parse_date(&date_cell)
            .ok_or_else(|| format!("row {line}: invalid Date '{date_cell}'"))?;

        let description =
            non_empty(self.description).ok_or_else(|| format!("row {line}: missing Description"))?;
        let account_number = non_empty(self.account_number)
            .ok_or_else(|| format!("row {line}: missing AccountNumber"))?;

        let amount_cell =
            non_empty(self.amount).ok_or_else(|| format!("row {line}: missing Amount"))?;
        let amount = parse_amount(&amount_cell)
            .ok_or_else(|| format!("row {line}: invalid Amount '{amount_cell}'"))?;

        Ok(ValidatedEntryRow {
            group_key,
            reference,
            date,
            description,
            account_number,
            amount,
            entry_description: non_empty(self.entry_description),
            line,
        })
    }
}

/// Entry row written by the transaction export path; rows of one
/// transaction share the TransactionID
#[derive(Debug, Clone, Serialize)]
pub struct TransactionExportRow {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "Reference")]
    pub reference: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "AccountNumber")]
    pub account_number: String,
    #[serde(rename = "Amount")]
    pub amount: BigDecimal,
    #[serde(rename = "EntryDescription")]
    pub entry_description: String,
}

fn non_empty(cell: Option<String>) -> Option<String> {
    cell.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a signed decimal amount cell
pub fn parse_amount(cell: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(cell.trim()).ok()
}

/// Parse a date cell; ISO first, then the day-first form banks favor
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entry(txn_id: Option<&str>, reference: Option<&str>) -> EntryRow {
        EntryRow {
            transaction_id: txn_id.map(String::from),
            reference: reference.map(String::from),
            date: Some("2025-01-15".to_string()),
            description: Some("Invoice payment".to_string()),
            account_number: Some("1000".to_string()),
            amount: Some("125.50".to_string()),
            entry_description: None,
        }
    }

    #[test]
    fn grouping_key_falls_back_to_reference() {
        let validated = raw_entry(None, Some("INV-7")).validate(2).unwrap();
        assert_eq!(validated.group_key, "INV-7");

        let validated = raw_entry(Some("T1"), Some("INV-7")).validate(2).unwrap();
        assert_eq!(validated.group_key, "T1");
    }

    #[test]
    fn missing_grouping_key_is_a_row_error() {
        let err = raw_entry(None, None).validate(4).unwrap_err();
        assert!(err.contains("row 4"));
        assert!(err.contains("grouping key"));
    }

    #[test]
    fn blank_cells_count_as_missing() {
        let mut row = raw_entry(Some("T1"), None);
        row.amount = Some("   ".to_string());
        let err = row.validate(3).unwrap_err();
        assert!(err.contains("missing Amount"));
    }

    #[test]
    fn account_row_defaults_opening_balance_to_zero() {
        let row = AccountRow {
            account_number: Some("1000".to_string()),
            name: Some("Cash".to_string()),
            account_type: Some("asset".to_string()),
            subtype: None,
            description: None,
            opening_balance: None,
        };
        let validated = row.validate(2).unwrap();
        assert_eq!(validated.opening_balance, BigDecimal::from(0));
        assert_eq!(validated.account_type, AccountType::Asset);
    }

    #[test]
    fn dates_accept_iso_and_day_first() {
        assert_eq!(
            parse_date("2025-03-09"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(
            parse_date("09/03/2025"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(parse_date("March 9"), None);
    }
}
