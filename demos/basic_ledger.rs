//! Basic ledger usage example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use ledger_core::utils::MemoryStore;
use ledger_core::{BulkManager, Ledger, NewTransaction, Page, TransactionFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Ledger Core - Basic Ledger Example\n");

    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let org = "demo-org";

    // 1. Import a small chart of accounts from CSV
    println!("📊 Importing Chart of Accounts...");
    let accounts_csv = "\
accountNumber,name,type,subtype,description,openingBalance
1000,Business Checking,ASSET,current,Primary bank account,5000.00
2000,Accounts Payable,LIABILITY,,,
4000,Sales Revenue,INCOME,,,
5000,Office Expenses,EXPENSE,,,
";
    let mut bulk = BulkManager::new(store.clone());
    let outcome = bulk.import_accounts(accounts_csv.as_bytes(), org).await?;
    for account in &outcome.success {
        println!(
            "  ✓ Created account: {} - {} ({:?})",
            account.account_number, account.name, account.account_type
        );
    }
    println!();

    // 2. Record some business transactions
    println!("💰 Recording Business Transactions...\n");

    let checking = ledger
        .get_account_by_number(org, "1000")
        .await?
        .expect("checking account");
    let revenue = ledger
        .get_account_by_number(org, "4000")
        .await?
        .expect("revenue account");
    let expenses = ledger
        .get_account_by_number(org, "5000")
        .await?
        .expect("expense account");

    let sale = NewTransaction::new(
        org.to_string(),
        NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        "Consulting invoice".to_string(),
    )
    .reference("INV-001".to_string())
    .entry(checking.id.clone(), BigDecimal::from(2400), None)
    .entry(revenue.id.clone(), BigDecimal::from(-2400), None);
    ledger.create_transaction(sale).await?;
    println!("  ✓ Recorded: consulting invoice of 2,400");

    let rent = NewTransaction::new(
        org.to_string(),
        NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        "January rent".to_string(),
    )
    .entry(expenses.id.clone(), BigDecimal::from(900), None)
    .entry(checking.id.clone(), BigDecimal::from(-900), None);
    ledger.create_transaction(rent).await?;
    println!("  ✓ Recorded: rent payment of 900\n");

    // 3. List recent activity on the checking account
    println!("📜 Checking Account Activity...");
    let filter = TransactionFilter {
        account_id: Some(checking.id.clone()),
        ..Default::default()
    };
    let page = ledger.list_transactions(org, &filter, Page::new(1, 10)).await?;
    for transaction in &page.data {
        println!(
            "  {} | {} | net {}",
            transaction.date,
            transaction.description,
            transaction.amount_for_account(&checking.id)
        );
    }
    println!();

    // 4. Balances and the audit check
    let balance = ledger.get_account_balance(&checking.id).await?;
    println!("🏦 Checking balance: {balance}");
    assert_eq!(balance, BigDecimal::from_str("6500.00")?);

    let audit = ledger.audit_balances(org).await?;
    println!(
        "🔍 Balance audit: {}",
        if audit.is_consistent { "consistent" } else { "INCONSISTENT" }
    );

    // 5. Export everything back out
    let mut exported = Vec::new();
    bulk.export_transactions(&mut exported, org, &TransactionFilter::default())
        .await?;
    println!("\n📤 Exported transaction rows:\n{}", String::from_utf8(exported)?);

    Ok(())
}
