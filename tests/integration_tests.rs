//! Integration tests for ledger-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use ledger_core::utils::MemoryStore;
use ledger_core::{
    Account, AccountType, BulkManager, Ledger, LedgerError, NewTransaction, Page,
    ReconciliationWorkspace, StatementStatus, TransactionFilter, TransactionStatus,
};

const ORG: &str = "org-1";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn amount(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

async fn setup_accounts(ledger: &mut Ledger<MemoryStore>) -> (Account, Account, Account) {
    let bank = ledger
        .create_account(Account::new(
            ORG.to_string(),
            "1000".to_string(),
            "Business Checking".to_string(),
            AccountType::Asset,
        ))
        .await
        .unwrap();
    let revenue = ledger
        .create_account(Account::new(
            ORG.to_string(),
            "4000".to_string(),
            "Sales Revenue".to_string(),
            AccountType::Income,
        ))
        .await
        .unwrap();
    let expenses = ledger
        .create_account(Account::new(
            ORG.to_string(),
            "5000".to_string(),
            "Office Expenses".to_string(),
            AccountType::Expense,
        ))
        .await
        .unwrap();
    (bank, revenue, expenses)
}

#[tokio::test]
async fn test_complete_ledger_workflow() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;

    let sale = NewTransaction::new(ORG.to_string(), date(2025, 1, 5), "Invoice 1".to_string())
        .reference("INV-1".to_string())
        .entry(bank.id.clone(), amount("1200.00"), None)
        .entry(revenue.id.clone(), amount("-1200.00"), None);
    let committed = ledger.create_transaction(sale).await.unwrap();
    assert!(committed.is_balanced());
    assert_eq!(committed.status, TransactionStatus::Posted);

    let rent = NewTransaction::new(ORG.to_string(), date(2025, 1, 7), "Rent".to_string())
        .entry(expenses.id.clone(), amount("800.00"), None)
        .entry(bank.id.clone(), amount("-800.00"), None);
    ledger.create_transaction(rent).await.unwrap();

    assert_eq!(
        ledger.get_account_balance(&bank.id).await.unwrap(),
        amount("400.00")
    );

    let listed = ledger
        .list_transactions(ORG, &TransactionFilter::default(), Page::new(1, 10))
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 2);
    // Newest first
    assert_eq!(listed.data[0].description, "Rent");

    let audit = ledger.audit_balances(ORG).await.unwrap();
    assert!(audit.is_consistent, "audit found {:?}", audit.discrepancies);
}

#[tokio::test]
async fn test_unbalanced_transaction_rejected_without_side_effects() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, _) = setup_accounts(&mut ledger).await;

    // Entries sum to 0.02, outside the 0.001 tolerance
    let draft = NewTransaction::new(ORG.to_string(), date(2025, 1, 5), "Slip".to_string())
        .entry(bank.id.clone(), amount("10.01"), None)
        .entry(revenue.id.clone(), amount("-9.99"), None);

    let err = ledger.create_transaction(draft).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unbalanced { .. }));

    assert_eq!(
        ledger.get_account_balance(&bank.id).await.unwrap(),
        BigDecimal::from(0)
    );
    assert_eq!(
        ledger.get_account_balance(&revenue.id).await.unwrap(),
        BigDecimal::from(0)
    );

    let listed = ledger
        .list_transactions(ORG, &TransactionFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 0);
}

#[tokio::test]
async fn test_import_isolates_unbalanced_group() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;

    // Ten rows: group T1 (rows 1-4) balances, group T2 (rows 5-10) sums
    // to 5.00 and must fail as a unit
    let file = "\
TransactionID,Reference,Date,Description,AccountNumber,Amount,EntryDescription
T1,,2025-02-01,Mixed sale,1000,150.00,card
T1,,2025-02-01,Mixed sale,1000,50.00,cash
T1,,2025-02-01,Mixed sale,4000,-120.00,
T1,,2025-02-01,Mixed sale,4000,-80.00,
T2,,2025-02-02,Supplies,5000,40.00,
T2,,2025-02-02,Supplies,5000,25.00,
T2,,2025-02-02,Supplies,1000,-30.00,
T2,,2025-02-02,Supplies,1000,-20.00,
T2,,2025-02-02,Supplies,1000,-5.00,
T2,,2025-02-02,Supplies,1000,-5.00,
";
    let mut bulk = BulkManager::new(store.clone());
    let outcome = bulk.import_transactions(file.as_bytes(), ORG).await.unwrap();

    assert_eq!(outcome.success.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("T2"));
    assert!(outcome.errors[0].contains("5.00"));

    // Only the balanced group's accounts moved
    assert_eq!(
        ledger.get_account_balance(&bank.id).await.unwrap(),
        amount("200.00")
    );
    assert_eq!(
        ledger.get_account_balance(&revenue.id).await.unwrap(),
        amount("-200.00")
    );
    assert_eq!(
        ledger.get_account_balance(&expenses.id).await.unwrap(),
        BigDecimal::from(0)
    );

    let audit = ledger.audit_balances(ORG).await.unwrap();
    assert!(audit.is_consistent);
}

#[tokio::test]
async fn test_account_import_export_round_trip() {
    let store = MemoryStore::new();
    let mut bulk = BulkManager::new(store.clone());

    let file = "\
accountNumber,name,type,subtype,description,openingBalance
1000,Business Checking,ASSET,current,Primary bank account,5000.00
2000,Accounts Payable,LIABILITY,,,-320.50
4000,Sales Revenue,INCOME,,,
";
    let first = bulk.import_accounts(file.as_bytes(), ORG).await.unwrap();
    assert_eq!(first.success.len(), 3);
    assert!(first.errors.is_empty());

    let mut exported = Vec::new();
    bulk.export_accounts(&mut exported, ORG).await.unwrap();

    let second = bulk
        .import_accounts(exported.as_slice(), "org-2")
        .await
        .unwrap();
    assert_eq!(second.success.len(), 3);
    assert!(second.errors.is_empty());

    for (a, b) in first.success.iter().zip(second.success.iter()) {
        assert_eq!(a.account_number, b.account_number);
        assert_eq!(a.name, b.name);
        assert_eq!(a.account_type, b.account_type);
        // Exported balances come back as opening balances
        assert_eq!(a.current_balance, b.opening_balance);
    }
}

/// Seed three bank-side ledger transactions worth +500, -150, -100
async fn seed_reconcilable_ledger(
    ledger: &mut Ledger<MemoryStore>,
    bank: &Account,
    revenue: &Account,
    expenses: &Account,
) -> Vec<String> {
    let mut ids = Vec::new();
    let deposit = NewTransaction::new(
        ORG.to_string(),
        date(2025, 3, 3),
        "Customer deposit".to_string(),
    )
    .entry(bank.id.clone(), amount("500.00"), None)
    .entry(revenue.id.clone(), amount("-500.00"), None);
    ids.push(ledger.create_transaction(deposit).await.unwrap().id);

    let rent = NewTransaction::new(ORG.to_string(), date(2025, 3, 10), "Rent".to_string())
        .entry(expenses.id.clone(), amount("150.00"), None)
        .entry(bank.id.clone(), amount("-150.00"), None);
    ids.push(ledger.create_transaction(rent).await.unwrap().id);

    let utilities = NewTransaction::new(ORG.to_string(), date(2025, 3, 18), "Utilities".to_string())
        .entry(expenses.id.clone(), amount("100.00"), None)
        .entry(bank.id.clone(), amount("-100.00"), None);
    ids.push(ledger.create_transaction(utilities).await.unwrap().id);
    ids
}

const STATEMENT_FILE: &str = "\
Date,Description,Amount
2025-03-03,Customer deposit,500.00
2025-03-10,Rent,-150.00
2025-03-18,Utilities,-100.00
";

#[tokio::test]
async fn test_reconciliation_completes_when_balances_agree() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;
    seed_reconcilable_ledger(&mut ledger, &bank, &revenue, &expenses).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("1000.00"),
            amount("1250.00"),
        )
        .await
        .unwrap();
    assert_eq!(statement.status, StatementStatus::Pending);

    let imported = workspace
        .import_statement_transactions(&statement.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap();
    assert_eq!(imported.success.len(), 3);
    assert!(imported.errors.is_empty());

    // First import moves the statement out of pending
    let statement = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(statement.status, StatementStatus::InProgress);

    // Exact amount+date pairs come back with full confidence
    let matches = workspace.match_transactions(&statement.id).await.unwrap();
    assert_eq!(matches.len(), 3);
    assert!(matches.iter().all(|m| m.confidence == 1.0));

    for m in &matches {
        workspace
            .reconcile_transaction(&m.statement_transaction_id, &m.transaction_id)
            .await
            .unwrap();
    }

    // All lines confirmed and the sums agree: matched
    let statement = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(statement.status, StatementStatus::Matched);

    let completed = workspace
        .complete_reconciliation(&statement.id)
        .await
        .unwrap();
    assert_eq!(completed.status, StatementStatus::Completed);

    // Both sides carry the reconciled flag
    for line in &completed.transactions {
        assert!(line.reconciled);
        let transaction_id = line.matched_transaction_id.as_ref().unwrap();
        let transaction = ledger
            .get_transaction(transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(transaction.status, TransactionStatus::Reconciled);
    }
}

#[tokio::test]
async fn test_reconciliation_balance_mismatch() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;
    seed_reconcilable_ledger(&mut ledger, &bank, &revenue, &expenses).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    // Closing balance off by 50: reconciled lines imply 1250
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("1000.00"),
            amount("1300.00"),
        )
        .await
        .unwrap();
    workspace
        .import_statement_transactions(&statement.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap();

    let matches = workspace.match_transactions(&statement.id).await.unwrap();
    for m in &matches {
        workspace
            .reconcile_transaction(&m.statement_transaction_id, &m.transaction_id)
            .await
            .unwrap();
    }

    let err = workspace
        .complete_reconciliation(&statement.id)
        .await
        .unwrap_err();
    match err {
        LedgerError::BalanceMismatch { expected, actual } => {
            assert_eq!(expected, amount("1300.00"));
            assert_eq!(actual, amount("1250.00"));
        }
        other => panic!("expected BalanceMismatch, got {other:?}"),
    }

    // The failed close-out left the statement mutable
    let statement = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(statement.status, StatementStatus::Completed);
}

#[tokio::test]
async fn test_reconcile_is_idempotent_and_guards_conflicts() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;
    let ids = seed_reconcilable_ledger(&mut ledger, &bank, &revenue, &expenses).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("1000.00"),
            amount("1250.00"),
        )
        .await
        .unwrap();
    workspace
        .import_statement_transactions(&statement.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap();

    let statement = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    let deposit_line = &statement.transactions[0];

    workspace
        .reconcile_transaction(&deposit_line.id, &ids[0])
        .await
        .unwrap();
    // Confirming the same pair again is a no-op
    workspace
        .reconcile_transaction(&deposit_line.id, &ids[0])
        .await
        .unwrap();

    let reloaded = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        reloaded.transactions.iter().filter(|t| t.reconciled).count(),
        1
    );

    // Re-pairing the line with a different transaction is a conflict
    let err = workspace
        .reconcile_transaction(&deposit_line.id, &ids[1])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    // As is pairing another line with the already-reconciled transaction
    let rent_line = &reloaded.transactions[1];
    let err = workspace
        .reconcile_transaction(&rent_line.id, &ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[tokio::test]
async fn test_completed_statement_is_immutable() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;
    seed_reconcilable_ledger(&mut ledger, &bank, &revenue, &expenses).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("1000.00"),
            amount("1250.00"),
        )
        .await
        .unwrap();
    workspace
        .import_statement_transactions(&statement.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap();
    let matches = workspace.match_transactions(&statement.id).await.unwrap();
    for m in &matches {
        workspace
            .reconcile_transaction(&m.statement_transaction_id, &m.transaction_id)
            .await
            .unwrap();
    }
    workspace
        .complete_reconciliation(&statement.id)
        .await
        .unwrap();

    let completed = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    let line = &completed.transactions[0];

    // No unmatch, no re-pair, no re-complete, no further imports
    let err = workspace.unmatch_transaction(&line.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    let err = workspace
        .reconcile_transaction(&line.id, line.matched_transaction_id.as_ref().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    let err = workspace
        .complete_reconciliation(&completed.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    let err = workspace
        .import_statement_transactions(&completed.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[tokio::test]
async fn test_unmatch_reverses_both_sides() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, expenses) = setup_accounts(&mut ledger).await;
    let ids = seed_reconcilable_ledger(&mut ledger, &bank, &revenue, &expenses).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("1000.00"),
            amount("1250.00"),
        )
        .await
        .unwrap();
    workspace
        .import_statement_transactions(&statement.id, STATEMENT_FILE.as_bytes())
        .await
        .unwrap();

    let statement = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    let line_id = statement.transactions[0].id.clone();

    workspace
        .reconcile_transaction(&line_id, &ids[0])
        .await
        .unwrap();
    workspace.unmatch_transaction(&line_id).await.unwrap();

    let reloaded = workspace
        .get_statement(&statement.id)
        .await
        .unwrap()
        .unwrap();
    let line = reloaded.transaction(&line_id).unwrap();
    assert!(!line.reconciled);
    assert!(line.matched_transaction_id.is_none());

    let transaction = ledger.get_transaction(&ids[0]).await.unwrap().unwrap();
    assert_eq!(transaction.status, TransactionStatus::Posted);

    // The freed pair can be confirmed again
    workspace
        .reconcile_transaction(&line_id, &ids[0])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_duplicate_statement_rows_reconcile_independently() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, revenue, _) = setup_accounts(&mut ledger).await;

    // Two identical ledger-side card settlements on the same day
    let mut ids = Vec::new();
    for _ in 0..2 {
        let settlement = NewTransaction::new(
            ORG.to_string(),
            date(2025, 4, 7),
            "Card settlement".to_string(),
        )
        .entry(bank.id.clone(), amount("75.00"), None)
        .entry(revenue.id.clone(), amount("-75.00"), None);
        ids.push(ledger.create_transaction(settlement).await.unwrap().id);
    }

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 4, 1),
            date(2025, 4, 30),
            amount("0.00"),
            amount("150.00"),
        )
        .await
        .unwrap();

    // The bank reports the same value twice; the rows keep distinct ids
    let file = "\
Date,Description,Amount
2025-04-07,Card settlement,75.00
2025-04-07,Card settlement,75.00
";
    let imported = workspace
        .import_statement_transactions(&statement.id, file.as_bytes())
        .await
        .unwrap();
    assert_eq!(imported.success.len(), 2);
    assert_ne!(imported.success[0].id, imported.success[1].id);

    let matches = workspace.match_transactions(&statement.id).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_ne!(matches[0].statement_transaction_id, matches[1].statement_transaction_id);
    assert_ne!(matches[0].transaction_id, matches[1].transaction_id);

    for m in &matches {
        workspace
            .reconcile_transaction(&m.statement_transaction_id, &m.transaction_id)
            .await
            .unwrap();
    }
    workspace
        .complete_reconciliation(&statement.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_statement_import_accumulates_row_errors() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::new(store.clone());
    let (bank, _, _) = setup_accounts(&mut ledger).await;

    let mut workspace = ReconciliationWorkspace::new(store.clone());
    let statement = workspace
        .create_statement(
            &bank.id,
            date(2025, 3, 1),
            date(2025, 3, 31),
            amount("0"),
            amount("500"),
        )
        .await
        .unwrap();

    let file = "\
Date,Description,Amount
2025-03-03,Deposit,500.00
not-a-date,Broken,10.00
2025-03-09,,25.00
";
    let outcome = workspace
        .import_statement_transactions(&statement.id, file.as_bytes())
        .await
        .unwrap();

    assert_eq!(outcome.success.len(), 1);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].contains("invalid Date"));
    assert!(outcome.errors[1].contains("missing Description"));
}
