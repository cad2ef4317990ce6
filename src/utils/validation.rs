//! Validation utilities

use crate::types::*;

/// Validate that an account number is usable as an organization-scoped key
pub fn validate_account_number(account_number: &str) -> LedgerResult<()> {
    if account_number.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account number cannot be empty".to_string(),
        ));
    }

    if account_number.len() > 50 {
        return Err(LedgerError::Validation(
            "Account number cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !account_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Account number can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a transaction description is valid
pub fn validate_transaction_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Transaction description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Transaction description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_number_rejects_punctuation() {
        assert!(validate_account_number("1000").is_ok());
        assert!(validate_account_number("AR-2024_01").is_ok());
        assert!(validate_account_number("10 00").is_err());
        assert!(validate_account_number("").is_err());
    }

    #[test]
    fn name_and_description_bounds() {
        assert!(validate_account_name("Cash").is_ok());
        assert!(validate_account_name(&"x".repeat(101)).is_err());
        assert!(validate_transaction_description("   ").is_err());
    }
}
