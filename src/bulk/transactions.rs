//! Transaction import and export
//!
//! Import files are flattened: one row per ledger entry, N consecutive
//! rows per logical transaction, tied together by an explicit grouping
//! key. A full group is materialized before its balance is checked.

use std::collections::HashMap;
use std::io::{Read, Write};

use tracing::debug;

use crate::bulk::rows::{EntryRow, TransactionExportRow, ValidatedEntryRow};
use crate::bulk::{csv_error, io_error, BulkManager, ImportOutcome};
use crate::traits::LedgerStore;
use crate::types::*;

/// Collect rows into groups by their explicit key, preserving the order
/// in which keys first appear
///
/// Interleaved rows of different transactions are fine; what is not
/// accepted (upstream, at row validation) is a row with no key at all.
pub(crate) fn group_entry_rows(
    rows: Vec<ValidatedEntryRow>,
) -> Vec<(String, Vec<ValidatedEntryRow>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ValidatedEntryRow>> = HashMap::new();

    for row in rows {
        if !groups.contains_key(&row.group_key) {
            order.push(row.group_key.clone());
        }
        groups.entry(row.group_key.clone()).or_default().push(row);
    }

    order
        .into_iter()
        .map(|key| {
            let rows = groups.remove(&key).unwrap_or_default();
            (key, rows)
        })
        .collect()
}

impl<S: LedgerStore + Clone> BulkManager<S> {
    /// Import transactions from a flattened tabular file
    ///
    /// Header: `TransactionID|Reference, Date, Description, AccountNumber,
    /// Amount, EntryDescription?`. Each group commits atomically through
    /// the engine; groups are independent and one group's failure never
    /// rolls back another.
    pub async fn import_transactions<R: Read>(
        &mut self,
        reader: R,
        organization_id: &str,
    ) -> LedgerResult<ImportOutcome<Transaction>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut outcome = ImportOutcome::new();
        let mut validated_rows = Vec::new();

        for (index, record) in csv_reader.deserialize::<EntryRow>().enumerate() {
            let line = index + 2;
            match record {
                Ok(row) => match row.validate(line) {
                    Ok(validated) => validated_rows.push(validated),
                    Err(err) => outcome.errors.push(err),
                },
                Err(err) => outcome.errors.push(format!("row {line}: {err}")),
            }
        }

        for (key, rows) in group_entry_rows(validated_rows) {
            match self.commit_group(organization_id, &key, rows).await {
                Ok(transaction) => outcome.success.push(transaction),
                Err(reason) => outcome.errors.push(reason),
            }
        }

        debug!(
            organization_id,
            committed = outcome.success.len(),
            failed = outcome.errors.len(),
            "transaction import finished"
        );

        Ok(outcome)
    }

    /// Validate one materialized group and commit it as one transaction
    async fn commit_group(
        &mut self,
        organization_id: &str,
        key: &str,
        rows: Vec<ValidatedEntryRow>,
    ) -> Result<Transaction, String> {
        if rows.len() < 2 {
            return Err(format!(
                "transaction '{key}': needs at least two entry rows"
            ));
        }

        let mut draft = NewTransaction::new(
            organization_id.to_string(),
            rows[0].date,
            rows[0].description.clone(),
        );
        if let Some(reference) = rows[0].reference.clone() {
            draft = draft.reference(reference);
        }

        for row in rows {
            let account = self
                .accounts
                .get_account_by_number(organization_id, &row.account_number)
                .await
                .map_err(|err| format!("transaction '{key}': {err}"))?
                .ok_or_else(|| {
                    format!(
                        "transaction '{key}': unknown account number '{}' (row {})",
                        row.account_number, row.line
                    )
                })?;
            draft = draft.entry(account.id, row.amount, row.entry_description);
        }

        let sum = draft.entry_sum();
        if !is_within_tolerance(&sum) {
            return Err(format!("transaction '{key}': entries sum to {sum}"));
        }

        // The engine re-validates and commits the group atomically
        self.engine
            .create_transaction(draft)
            .await
            .map_err(|err| format!("transaction '{key}': {err}"))
    }

    /// Export transactions as flattened rows, one per entry, newest first
    pub async fn export_transactions<W: Write>(
        &self,
        writer: W,
        organization_id: &str,
        filter: &TransactionFilter,
    ) -> LedgerResult<()> {
        // Dates and status go into the query. The account filter runs over
        // the materialized set instead, which is safe here only because
        // export has no pagination; paginated reads push it into the query.
        let mut query = filter.clone();
        let account_filter = query.account_id.take();
        let transactions = self
            .engine
            .find_transactions(organization_id, &query)
            .await?;

        let accounts = self.accounts.list_accounts(organization_id).await?;
        let numbers: HashMap<&str, &str> = accounts
            .iter()
            .map(|a| (a.id.as_str(), a.account_number.as_str()))
            .collect();

        let mut csv_writer = csv::Writer::from_writer(writer);
        let selected = transactions.iter().filter(|t| match &account_filter {
            Some(account_id) => t.entries.iter().any(|e| &e.account_id == account_id),
            None => true,
        });

        for transaction in selected {
            for entry in &transaction.entries {
                csv_writer
                    .serialize(TransactionExportRow {
                        transaction_id: transaction.id.clone(),
                        reference: transaction.reference.clone().unwrap_or_default(),
                        date: transaction.date,
                        description: transaction.description.clone(),
                        account_number: numbers
                            .get(entry.account_id.as_str())
                            .copied()
                            .unwrap_or_default()
                            .to_string(),
                        amount: entry.amount.clone(),
                        entry_description: entry.description.clone().unwrap_or_default(),
                    })
                    .map_err(csv_error)?;
            }
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
    use chrono::NaiveDate;
    use std::str::FromStr;

    const ORG: &str = "org-1";

    fn row(key: &str, account: &str, amount: &str) -> ValidatedEntryRow {
        ValidatedEntryRow {
            group_key: key.to_string(),
            reference: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            description: "Test".to_string(),
            account_number: account.to_string(),
            amount: BigDecimal::from_str(amount).unwrap(),
            entry_description: None,
            line: 2,
        }
    }

    #[test]
    fn grouping_preserves_first_seen_order_and_tolerates_interleaving() {
        let rows = vec![
            row("B", "1000", "10"),
            row("A", "1000", "5"),
            row("B", "2000", "-10"),
            row("A", "2000", "-5"),
        ];
        let groups = group_entry_rows(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "B");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "A");
    }

    async fn seed_accounts(bulk: &mut BulkManager<MemoryStore>) {
        let file = "\
accountNumber,name,type
1000,Cash,ASSET
4000,Sales Revenue,INCOME
5000,Office Expenses,EXPENSE
";
        let outcome = bulk.import_accounts(file.as_bytes(), ORG).await.unwrap();
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn groups_fail_independently() {
        let mut bulk = BulkManager::new(MemoryStore::new());
        seed_accounts(&mut bulk).await;

        let file = "\
TransactionID,Reference,Date,Description,AccountNumber,Amount,EntryDescription
T1,,2025-01-10,Cash sale,1000,100.00,
T1,,2025-01-10,Cash sale,4000,-100.00,
T2,,2025-01-11,Mystery,9999,50.00,
T2,,2025-01-11,Mystery,1000,-50.00,
T3,,2025-01-12,Lonely,1000,25.00,
";
        let outcome = bulk
            .import_transactions(file.as_bytes(), ORG)
            .await
            .unwrap();

        assert_eq!(outcome.success.len(), 1);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].contains("unknown account number '9999'"));
        assert!(outcome.errors[1].contains("at least two entry rows"));

        // Only the committed group moved balances
        let cash = bulk
            .accounts
            .get_account_by_number(ORG, "1000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cash.current_balance, BigDecimal::from(100));
    }

    #[tokio::test]
    async fn export_flattens_entries_sharing_transaction_id() {
        let mut bulk = BulkManager::new(MemoryStore::new());
        seed_accounts(&mut bulk).await;

        let file = "\
TransactionID,Reference,Date,Description,AccountNumber,Amount,EntryDescription
T1,INV-1,2025-01-10,Cash sale,1000,100.00,till
T1,INV-1,2025-01-10,Cash sale,4000,-100.00,
";
        let outcome = bulk
            .import_transactions(file.as_bytes(), ORG)
            .await
            .unwrap();
        assert_eq!(outcome.success.len(), 1);

        let mut exported = Vec::new();
        bulk.export_transactions(&mut exported, ORG, &TransactionFilter::default())
            .await
            .unwrap();
        let exported = String::from_utf8(exported).unwrap();
        let lines: Vec<&str> = exported.lines().collect();

        assert_eq!(lines.len(), 3);
        let id = &outcome.success[0].id;
        assert!(lines[1].starts_with(&format!("{id},INV-1,2025-01-10,Cash sale,1000,100.00")));
        assert!(lines[2].starts_with(&format!("{id},INV-1,2025-01-10,Cash sale,4000,-100.00")));
    }
}
