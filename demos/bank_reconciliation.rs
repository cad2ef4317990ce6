//! Bank statement reconciliation walkthrough

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use ledger_core::utils::MemoryStore;
use ledger_core::{Account, AccountType, Ledger, NewTransaction, ReconciliationWorkspace};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Ledger Core - Bank Reconciliation Example\n");

    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let org = "demo-org";

    let bank = ledger
        .create_account(Account::new(
            org.to_string(),
            "1000".to_string(),
            "Business Checking".to_string(),
            AccountType::Asset,
        ))
        .await?;
    let revenue = ledger
        .create_account(Account::new(
            org.to_string(),
            "4000".to_string(),
            "Sales Revenue".to_string(),
            AccountType::Income,
        ))
        .await?;
    let expenses = ledger
        .create_account(Account::new(
            org.to_string(),
            "5000".to_string(),
            "Office Expenses".to_string(),
            AccountType::Expense,
        ))
        .await?;

    // Ledger-side activity for March
    for (day, description, bank_amount) in [
        (3, "Customer deposit", "500.00"),
        (10, "Rent", "-150.00"),
        (18, "Utilities", "-100.00"),
    ] {
        let amount = BigDecimal::from_str(bank_amount)?;
        let counterpart = if amount > BigDecimal::from(0) {
            revenue.id.clone()
        } else {
            expenses.id.clone()
        };
        let draft = NewTransaction::new(
            org.to_string(),
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            description.to_string(),
        )
        .entry(bank.id.clone(), amount.clone(), None)
        .entry(counterpart, -amount, None);
        ledger.create_transaction(draft).await?;
    }
    println!("  ✓ Committed 3 ledger transactions for March\n");

    // 1. Open the statement the bank sent
    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            BigDecimal::from_str("1000.00")?,
            BigDecimal::from_str("1250.00")?,
        )
        .await?;
    println!("📄 Statement opened, status {:?}", statement.status);

    // 2. Import the bank's lines
    let statement_csv = "\
Date,Description,Amount
2025-03-03,Customer deposit,500.00
2025-03-10,Rent,-150.00
2025-03-18,Utilities,-100.00
";
    let imported = workspace
        .import_statement_transactions(&statement.id, statement_csv.as_bytes())
        .await?;
    println!(
        "📥 Imported {} statement lines ({} errors)",
        imported.success.len(),
        imported.errors.len()
    );

    // 3. Ask for match candidates and confirm them
    let matches = workspace.match_transactions(&statement.id).await?;
    println!("🤝 {} match candidates:", matches.len());
    for candidate in &matches {
        println!(
            "   line {} -> transaction {} (confidence {:.2})",
            candidate.statement_transaction_id, candidate.transaction_id, candidate.confidence
        );
        workspace
            .reconcile_transaction(&candidate.statement_transaction_id, &candidate.transaction_id)
            .await?;
    }

    // 4. Certify the close-out
    let completed = workspace.complete_reconciliation(&statement.id).await?;
    println!(
        "\n✅ Statement completed: opening {} + reconciled {} = closing {}",
        completed.opening_balance,
        completed.reconciled_sum(),
        completed.closing_balance
    );

    Ok(())
}
