//! Account import and export

use std::io::{Read, Write};

use tracing::debug;

use crate::bulk::rows::{AccountExportRow, AccountRow};
use crate::bulk::{csv_error, io_error, BulkManager, ImportOutcome};
use crate::traits::LedgerStore;
use crate::types::*;

impl<S: LedgerStore + Clone> BulkManager<S> {
    /// Import accounts from a tabular file
    ///
    /// Header: `accountNumber,name,type,subtype?,description?,openingBalance?`.
    /// Rows are validated independently; a bad row contributes an error
    /// and the batch keeps going.
    pub async fn import_accounts<R: Read>(
        &mut self,
        reader: R,
        organization_id: &str,
    ) -> LedgerResult<ImportOutcome<Account>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut outcome = ImportOutcome::new();

        for (index, record) in csv_reader.deserialize::<AccountRow>().enumerate() {
            // Header occupies line 1
            let line = index + 2;

            let row = match record {
                Ok(row) => row,
                Err(err) => {
                    outcome.errors.push(format!("row {line}: {err}"));
                    continue;
                }
            };

            let validated = match row.validate(line) {
                Ok(validated) => validated,
                Err(err) => {
                    outcome.errors.push(err);
                    continue;
                }
            };

            let mut account = Account::new(
                organization_id.to_string(),
                validated.account_number,
                validated.name,
                validated.account_type,
            )
            .with_opening_balance(validated.opening_balance);
            if let Some(subtype) = validated.subtype {
                account = account.with_subtype(subtype);
            }
            if let Some(description) = validated.description {
                account = account.with_description(description);
            }

            // Duplicate account numbers (preexisting or earlier in this
            // same file) surface as a Conflict from the manager
            match self.accounts.create_account(account).await {
                Ok(created) => outcome.success.push(created),
                Err(err) => outcome.errors.push(format!("row {line}: {err}")),
            }
        }

        debug!(
            organization_id,
            created = outcome.success.len(),
            failed = outcome.errors.len(),
            "account import finished"
        );

        Ok(outcome)
    }

    /// Export an organization's accounts, ordered by account number
    pub async fn export_accounts<W: Write>(
        &self,
        writer: W,
        organization_id: &str,
    ) -> LedgerResult<()> {
        let accounts = self.accounts.list_accounts(organization_id).await?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        for account in &accounts {
            csv_writer
                .serialize(AccountExportRow::from(account))
                .map_err(csv_error)?;
        }
        csv_writer.flush().map_err(io_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const ORG: &str = "org-1";

    #[tokio::test]
    async fn import_isolates_bad_rows() {
        let mut bulk = BulkManager::new(MemoryStore::new());

        let file = "\
accountNumber,name,type,subtype,description,openingBalance
1000,Cash,ASSET,current,Till and bank,2500.00
,Missing Number,ASSET,,,
2000,Accounts Payable,LIABILITY,,,
3000,Weird,SOMETYPE,,,
1000,Cash Again,ASSET,,,
";
        let outcome = bulk.import_accounts(file.as_bytes(), ORG).await.unwrap();

        assert_eq!(outcome.success.len(), 2);
        assert_eq!(outcome.errors.len(), 3);
        assert!(outcome.errors[0].contains("missing accountNumber"));
        assert!(outcome.errors[1].contains("unknown account type"));
        assert!(outcome.errors[2].contains("already exists"));

        let cash = &outcome.success[0];
        assert_eq!(cash.account_number, "1000");
        assert_eq!(
            cash.current_balance,
            BigDecimal::from_str("2500.00").unwrap()
        );
        assert_eq!(cash.subtype.as_deref(), Some("current"));
    }

    #[tokio::test]
    async fn export_round_trips_accounts() {
        let store = MemoryStore::new();
        let mut bulk = BulkManager::new(store.clone());

        let file = "\
accountNumber,name,type,subtype,description,openingBalance
2000,Accounts Payable,LIABILITY,,,-150.25
1000,Cash,ASSET,current,,980
";
        let outcome = bulk.import_accounts(file.as_bytes(), ORG).await.unwrap();
        assert!(outcome.errors.is_empty());

        let mut exported = Vec::new();
        bulk.export_accounts(&mut exported, ORG).await.unwrap();
        let exported = String::from_utf8(exported).unwrap();

        // Ordered by account number, balances carried out
        let lines: Vec<&str> = exported.lines().collect();
        assert_eq!(
            lines[0],
            "accountNumber,name,type,subtype,description,currentBalance"
        );
        assert!(lines[1].starts_with("1000,Cash,ASSET,current,,980"));
        assert!(lines[2].starts_with("2000,Accounts Payable,LIABILITY,,,-150.25"));

        // Re-importing the export into a fresh organization reproduces
        // the account set, balances becoming opening balances
        let reimport = bulk
            .import_accounts(exported.as_bytes(), "org-2")
            .await
            .unwrap();
        assert_eq!(reimport.success.len(), 2);
        assert!(reimport.errors.is_empty());
        assert_eq!(
            reimport.success[0].opening_balance,
            BigDecimal::from_str("980").unwrap()
        );
    }
}
