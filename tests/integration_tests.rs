//! Integration tests for invoicing-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use invoicing_core::{
    compliance::{ComplianceAggregator, EInvoiceSigner, IrnReceipt},
    utils::MemoryStorage,
    Account, AccountType, CoreError, CoreResult, DocumentKind, EInvoiceStatus, EntryBuilder,
    Invoice, InvoiceDraft, InvoiceStatus, InvoiceType, Invoicing, ItemDraft, JournalEngine,
    JournalStatus, LedgerProjector, PaymentMode, PaymentStatus, PurchaseDraft, Reconciler,
    ReportPeriod, SequenceStore, SettlementStatus, Storage,
};

fn test_org() -> invoicing_core::Organization {
    invoicing_core::Organization::new(
        "Acme Traders".to_string(),
        "29ABCDE1234F1Z5".to_string(),
        "ABCDE1234F".to_string(),
        "29".to_string(),
        "INV-".to_string(),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_account(
    storage: &mut MemoryStorage,
    org_id: Uuid,
    code: &str,
    name: &str,
    account_type: AccountType,
) -> Account {
    let account = Account::new(
        org_id,
        code.to_string(),
        name.to_string(),
        account_type,
        BigDecimal::from(0),
    );
    storage.save_account(&account).await.unwrap();
    account
}

fn invoice_draft(customer_id: Uuid, items: Vec<ItemDraft>) -> InvoiceDraft {
    InvoiceDraft {
        customer_id,
        invoice_date: date(2024, 4, 5),
        due_date: Some(date(2024, 4, 30)),
        invoice_type: InvoiceType::B2B,
        place_of_supply: "29".to_string(),
        items,
    }
}

fn item(quantity: i64, rate: i64, gst_rate: i64) -> ItemDraft {
    ItemDraft {
        description: "Widget".to_string(),
        hsn_sac: Some("8471".to_string()),
        quantity: BigDecimal::from(quantity),
        rate: BigDecimal::from(rate),
        discount: None,
        gst_rate: BigDecimal::from(gst_rate),
    }
}

#[tokio::test]
async fn journal_posting_projects_ledger_and_balances() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let revenue =
        seed_account(&mut storage, org.id, "4000", "Sales Revenue", AccountType::Revenue).await;

    let mut engine = JournalEngine::new(storage.clone());
    let draft = EntryBuilder::new(date(2024, 4, 1), "Cash sale".to_string())
        .debit(cash.id, BigDecimal::from(1000))
        .credit(revenue.id, BigDecimal::from(1000))
        .build()
        .unwrap();
    let entry = engine.create_entry(org.id, draft).await.unwrap();
    assert_eq!(entry.status, JournalStatus::Draft);
    assert_eq!(entry.entry_number, "JE-00001");
    assert_eq!(entry.total_debit, entry.total_credit);

    let posted = engine.post(entry.id).await.unwrap();
    assert_eq!(posted.status, JournalStatus::Posted);

    // The ledger reflects exactly the posted deltas
    let projector = LedgerProjector::new(storage.clone());
    assert_eq!(projector.balance(cash.id, None).await.unwrap(), BigDecimal::from(1000));
    assert_eq!(
        projector.balance(revenue.id, None).await.unwrap(),
        BigDecimal::from(-1000)
    );

    // Posting is guarded against repetition
    let err = engine.post(entry.id).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyPosted(id) if id == entry.id));
}

#[tokio::test]
async fn unbalanced_entries_are_rejected() {
    let result = EntryBuilder::new(date(2024, 4, 1), "Unbalanced".to_string())
        .debit(Uuid::new_v4(), BigDecimal::from(1000))
        .credit(Uuid::new_v4(), BigDecimal::from(500))
        .build();
    assert!(matches!(result, Err(CoreError::UnbalancedEntry { .. })));

    // A single line is not double entry
    let result = EntryBuilder::new(date(2024, 4, 1), "One-legged".to_string())
        .debit(Uuid::new_v4(), BigDecimal::from(1000))
        .build();
    assert!(matches!(result, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn cross_tenant_account_references_are_rejected() {
    let mut storage = MemoryStorage::new();
    let org_a = test_org();
    let org_b = test_org();
    storage.save_organization(&org_a).await.unwrap();
    storage.save_organization(&org_b).await.unwrap();
    let own = seed_account(&mut storage, org_a.id, "1000", "Cash", AccountType::Asset).await;
    let foreign =
        seed_account(&mut storage, org_b.id, "4000", "Revenue", AccountType::Revenue).await;

    let mut engine = JournalEngine::new(storage.clone());
    let draft = EntryBuilder::new(date(2024, 4, 1), "Cross-tenant".to_string())
        .debit(own.id, BigDecimal::from(100))
        .credit(foreign.id, BigDecimal::from(100))
        .build()
        .unwrap();
    let err = engine.create_entry(org_a.id, draft).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidAccount(_)));

    let missing = EntryBuilder::new(date(2024, 4, 1), "Dangling".to_string())
        .debit(own.id, BigDecimal::from(100))
        .credit(Uuid::new_v4(), BigDecimal::from(100))
        .build()
        .unwrap();
    let err = engine.create_entry(org_a.id, missing).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidAccount(_)));
}

#[tokio::test]
async fn trial_balance_debits_equal_credits() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let receivables =
        seed_account(&mut storage, org.id, "1200", "Receivables", AccountType::Asset).await;
    let revenue =
        seed_account(&mut storage, org.id, "4000", "Revenue", AccountType::Revenue).await;
    let gst_payable =
        seed_account(&mut storage, org.id, "2200", "GST Payable", AccountType::Liability).await;

    let mut engine = JournalEngine::new(storage.clone());
    let sale = invoicing_core::journal::postings::sales_invoice(
        date(2024, 4, 2),
        "INV-00001",
        receivables.id,
        revenue.id,
        gst_payable.id,
        BigDecimal::from(10000),
        BigDecimal::from(1800),
    )
    .unwrap();
    let entry = engine.create_entry(org.id, sale).await.unwrap();
    engine.post(entry.id).await.unwrap();

    let payment = invoicing_core::journal::postings::payment_received(
        date(2024, 4, 10),
        "UTR42",
        cash.id,
        receivables.id,
        BigDecimal::from(11800),
    )
    .unwrap();
    let entry = engine.create_entry(org.id, payment).await.unwrap();
    engine.post(entry.id).await.unwrap();

    let projector = LedgerProjector::new(storage.clone());
    let tb = projector.trial_balance(org.id).await.unwrap();
    assert!(tb.is_balanced);
    assert_eq!(tb.total_debits, tb.total_credits);
    assert_eq!(tb.total_debits, BigDecimal::from(23600));
    // Debits and credits are summed independently, not netted
    let receivable_row = tb
        .rows
        .iter()
        .find(|r| r.account.id == receivables.id)
        .unwrap();
    assert_eq!(receivable_row.total_debit, BigDecimal::from(11800));
    assert_eq!(receivable_row.total_credit, BigDecimal::from(11800));
}

#[tokio::test]
async fn reversing_entry_restores_balances() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let revenue =
        seed_account(&mut storage, org.id, "4000", "Revenue", AccountType::Revenue).await;

    let mut engine = JournalEngine::new(storage.clone());
    let draft = EntryBuilder::new(date(2024, 4, 1), "Mistaken sale".to_string())
        .debit(cash.id, BigDecimal::from(500))
        .credit(revenue.id, BigDecimal::from(500))
        .build()
        .unwrap();
    let entry = engine.create_entry(org.id, draft).await.unwrap();
    engine.post(entry.id).await.unwrap();

    let reversal = engine.reverse(entry.id, date(2024, 4, 2), None).await.unwrap();
    assert_eq!(reversal.status, JournalStatus::Posted);

    let projector = LedgerProjector::new(storage.clone());
    assert_eq!(projector.balance(cash.id, None).await.unwrap(), BigDecimal::from(0));
    assert_eq!(projector.balance(revenue.id, None).await.unwrap(), BigDecimal::from(0));
    let tb = projector.trial_balance(org.id).await.unwrap();
    assert!(tb.is_balanced);

    // Drafts cannot be reversed
    let draft = EntryBuilder::new(date(2024, 4, 3), "Still a draft".to_string())
        .debit(cash.id, BigDecimal::from(10))
        .credit(revenue.id, BigDecimal::from(10))
        .build()
        .unwrap();
    let unposted = engine.create_entry(org.id, draft).await.unwrap();
    assert!(engine.reverse(unposted.id, date(2024, 4, 3), None).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_posts_project_ledger_once() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let revenue =
        seed_account(&mut storage, org.id, "4000", "Revenue", AccountType::Revenue).await;

    for _ in 0..100 {
        let mut engine = JournalEngine::new(storage.clone());
        let draft = EntryBuilder::new(date(2024, 4, 1), "Racy sale".to_string())
            .debit(cash.id, BigDecimal::from(100))
            .credit(revenue.id, BigDecimal::from(100))
            .build()
            .unwrap();
        let entry = engine.create_entry(org.id, draft).await.unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut tasks = Vec::new();
        for _ in 0..2 {
            let mut engine = JournalEngine::new(storage.clone());
            let barrier = barrier.clone();
            let entry_id = entry.id;
            tasks.push(tokio::spawn(async move {
                barrier.wait().await;
                engine.post(entry_id).await
            }));
        }

        let mut posted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => posted += 1,
                Err(err) => {
                    assert!(matches!(err, CoreError::AlreadyPosted(id) if id == entry.id))
                }
            }
        }
        assert_eq!(posted, 1, "exactly one of the racing posts may succeed");
    }

    // Each of the 100 entries was projected exactly once
    let projector = LedgerProjector::new(storage.clone());
    assert_eq!(
        projector.balance(cash.id, None).await.unwrap(),
        BigDecimal::from(10000)
    );
}

#[tokio::test]
async fn opening_and_purchase_postings_keep_trial_balance_closed() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let gst_receivable =
        seed_account(&mut storage, org.id, "1300", "GST Receivable", AccountType::Asset).await;
    let payables =
        seed_account(&mut storage, org.id, "2000", "Payables", AccountType::Liability).await;
    let equity =
        seed_account(&mut storage, org.id, "3000", "Opening Equity", AccountType::Equity).await;
    let expense =
        seed_account(&mut storage, org.id, "5000", "Office Supplies", AccountType::Expense).await;

    let mut engine = JournalEngine::new(storage.clone());
    let seed = invoicing_core::journal::postings::opening_balance(
        date(2024, 4, 1),
        cash.id,
        equity.id,
        cash.account_type.normal_side(),
        BigDecimal::from(5000),
    )
    .unwrap();
    let entry = engine.create_entry(org.id, seed).await.unwrap();
    engine.post(entry.id).await.unwrap();

    let bought = invoicing_core::journal::postings::purchase(
        date(2024, 4, 3),
        "PUR-00001",
        expense.id,
        gst_receivable.id,
        payables.id,
        BigDecimal::from(1000),
        BigDecimal::from(180),
    )
    .unwrap();
    let entry = engine.create_entry(org.id, bought).await.unwrap();
    engine.post(entry.id).await.unwrap();

    let projector = LedgerProjector::new(storage.clone());
    assert_eq!(
        projector.balance(cash.id, None).await.unwrap(),
        BigDecimal::from(5000)
    );
    assert_eq!(
        projector.balance(gst_receivable.id, None).await.unwrap(),
        BigDecimal::from(180)
    );
    assert_eq!(
        projector.balance(payables.id, None).await.unwrap(),
        BigDecimal::from(-1180)
    );

    let tb = projector.trial_balance(org.id).await.unwrap();
    assert!(tb.is_balanced);
    assert_eq!(tb.total_debits, BigDecimal::from(6180));
    assert_eq!(tb.total_credits, BigDecimal::from(6180));
}

#[tokio::test]
async fn balance_respects_cutoff_date() {
    let mut storage = MemoryStorage::new();
    let org = test_org();
    storage.save_organization(&org).await.unwrap();
    let cash = seed_account(&mut storage, org.id, "1000", "Cash", AccountType::Asset).await;
    let revenue =
        seed_account(&mut storage, org.id, "4000", "Revenue", AccountType::Revenue).await;

    let mut engine = JournalEngine::new(storage.clone());
    for (day, amount) in [(1, 1000), (15, 2000)] {
        let draft = EntryBuilder::new(date(2024, 4, day), format!("Sale on day {day}"))
            .debit(cash.id, BigDecimal::from(amount))
            .credit(revenue.id, BigDecimal::from(amount))
            .build()
            .unwrap();
        let entry = engine.create_entry(org.id, draft).await.unwrap();
        engine.post(entry.id).await.unwrap();
    }

    let projector = LedgerProjector::new(storage.clone());
    assert_eq!(
        projector.balance(cash.id, Some(date(2024, 4, 10))).await.unwrap(),
        BigDecimal::from(1000)
    );
    assert_eq!(
        projector.balance(cash.id, Some(date(2024, 4, 30))).await.unwrap(),
        BigDecimal::from(3000)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sequence_allocations_are_distinct() {
    let storage = MemoryStorage::new();
    let org_id = Uuid::new_v4();

    let mut handles = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let mut store = storage.clone();
        handles.push(tokio::spawn(async move {
            store.allocate(org_id, DocumentKind::Invoice).await.unwrap()
        }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        let value = handle.await.unwrap();
        assert!(seen.insert(value), "duplicate sequence value {value}");
    }
    assert_eq!(seen.len(), 1000);
}

#[tokio::test]
async fn invoice_creation_numbers_and_taxes_items() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();

    let customer = Uuid::new_v4();
    let first = invoicing
        .create_invoice(&org, invoice_draft(customer, vec![item(1, 10000, 18)]))
        .await
        .unwrap();
    assert_eq!(first.invoice_number, "INV-00001");
    assert_eq!(first.subtotal, BigDecimal::from(10000));
    assert_eq!(first.tax_amount, BigDecimal::from(1800));
    assert_eq!(first.total_amount, BigDecimal::from(11800));
    assert_eq!(first.status, InvoiceStatus::Draft);

    let second = invoicing
        .create_invoice(&org, invoice_draft(customer, vec![item(2, 500, 5)]))
        .await
        .unwrap();
    assert_eq!(second.invoice_number, "INV-00002");
    assert_eq!(second.subtotal, BigDecimal::from(1000));
    assert_eq!(second.tax_amount, BigDecimal::from(50));

    // An invalid draft consumes no number
    let bad = invoicing
        .create_invoice(&org, invoice_draft(customer, vec![]))
        .await;
    assert!(matches!(bad, Err(CoreError::Validation(_))));
    let third = invoicing
        .create_invoice(&org, invoice_draft(customer, vec![item(1, 100, 0)]))
        .await
        .unwrap();
    assert_eq!(third.invoice_number, "INV-00003");
}

#[tokio::test]
async fn invoice_status_moves_forward_only() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();

    let invoice = invoicing
        .create_invoice(&org, invoice_draft(Uuid::new_v4(), vec![item(1, 1000, 18)]))
        .await
        .unwrap();

    let sent = invoicing.mark_sent(invoice.id).await.unwrap();
    assert_eq!(sent.status, InvoiceStatus::Sent);

    // No regression to draft, and no cancelling a paid invoice
    let paid = invoicing.mark_paid(invoice.id).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(invoicing.cancel_invoice(invoice.id).await.is_err());
    assert!(invoicing.mark_sent(invoice.id).await.is_err());
}

#[tokio::test]
async fn settlement_and_outstanding_summary() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();
    let customer = Uuid::new_v4();

    // Overdue invoice: due five days before the summary date, unpaid
    let mut overdue_draft = invoice_draft(customer, vec![item(1, 1000, 18)]);
    overdue_draft.due_date = Some(date(2024, 4, 10));
    let overdue = invoicing.create_invoice(&org, overdue_draft).await.unwrap();
    invoicing.mark_sent(overdue.id).await.unwrap();

    // Upcoming invoice: due five days after the summary date, partly paid
    let mut upcoming_draft = invoice_draft(customer, vec![item(1, 1000, 18)]);
    upcoming_draft.due_date = Some(date(2024, 4, 20));
    let upcoming = invoicing.create_invoice(&org, upcoming_draft).await.unwrap();
    invoicing.mark_sent(upcoming.id).await.unwrap();
    invoicing
        .record_payment(
            org.id,
            Some(upcoming.id),
            Some(customer),
            BigDecimal::from(1000),
            date(2024, 4, 12),
            PaymentMode::Upi,
            PaymentStatus::Completed,
            Some("UTR1".to_string()),
        )
        .await
        .unwrap();

    let reconciler = Reconciler::new(storage.clone());
    let position = reconciler.settlement_for(upcoming.id).await.unwrap();
    assert_eq!(position.status, SettlementStatus::Partial);
    assert_eq!(position.pending_amount, BigDecimal::from(180));

    let summary = reconciler
        .outstanding_summary(org.id, date(2024, 4, 15))
        .await
        .unwrap();
    assert_eq!(summary.overdue_amount, BigDecimal::from(1180));
    assert_eq!(summary.upcoming_amount, BigDecimal::from(180));
    assert_eq!(summary.total_outstanding, BigDecimal::from(1360));
}

#[tokio::test]
async fn advance_payment_without_invoice() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();

    let advance = invoicing
        .record_payment(
            org.id,
            None,
            Some(Uuid::new_v4()),
            BigDecimal::from(5000),
            date(2024, 4, 1),
            PaymentMode::BankTransfer,
            PaymentStatus::Completed,
            None,
        )
        .await
        .unwrap();
    assert!(advance.invoice_id.is_none());

    // But a payment tied to nothing at all is rejected
    let orphan = invoicing
        .record_payment(
            org.id,
            None,
            None,
            BigDecimal::from(5000),
            date(2024, 4, 1),
            PaymentMode::Cash,
            PaymentStatus::Completed,
            None,
        )
        .await;
    assert!(matches!(orphan, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn gstr1_partitions_and_overwrites() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();
    let customer = Uuid::new_v4();

    // Intra-state B2B invoice: 10000 @ 18% -> CGST 900 + SGST 900
    let b2b = invoicing
        .create_invoice(&org, invoice_draft(customer, vec![item(1, 10000, 18)]))
        .await
        .unwrap();
    invoicing.mark_sent(b2b.id).await.unwrap();

    // Inter-state B2C invoice: 2000 @ 5% -> IGST 100
    let mut b2c_draft = invoice_draft(customer, vec![item(4, 500, 5)]);
    b2c_draft.invoice_type = InvoiceType::B2C;
    b2c_draft.place_of_supply = "27".to_string();
    let b2c = invoicing.create_invoice(&org, b2c_draft).await.unwrap();
    invoicing.mark_sent(b2c.id).await.unwrap();

    // Draft invoices stay out of the report
    invoicing
        .create_invoice(&org, invoice_draft(customer, vec![item(1, 99999, 28)]))
        .await
        .unwrap();

    let period = ReportPeriod::new(4, 2024).unwrap();
    let mut aggregator = ComplianceAggregator::new(storage.clone());
    let first = aggregator.generate_gstr1(org.id, period).await.unwrap();
    assert!(first.failures.is_empty());
    assert_eq!(first.report.invoice_count, 2);
    assert_eq!(first.report.b2b.taxable_value, BigDecimal::from(10000));
    assert_eq!(first.report.b2b.cgst, BigDecimal::from(900));
    assert_eq!(first.report.b2b.sgst, BigDecimal::from(900));
    assert_eq!(first.report.b2b.igst, BigDecimal::from(0));
    assert_eq!(first.report.b2c.taxable_value, BigDecimal::from(2000));
    assert_eq!(first.report.b2c.igst, BigDecimal::from(100));

    // Regeneration overwrites the period row and yields identical totals
    let second = aggregator.generate_gstr1(org.id, period).await.unwrap();
    assert_eq!(second.report.b2b, first.report.b2b);
    assert_eq!(second.report.b2c, first.report.b2c);
    assert_eq!(second.report.invoice_count, first.report.invoice_count);
    let stored = storage.get_gstr1(org.id, period).await.unwrap().unwrap();
    assert_eq!(stored.b2b, second.report.b2b);
}

#[tokio::test]
async fn gstr3b_combines_outward_and_inward() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();

    let sale = invoicing
        .create_invoice(&org, invoice_draft(Uuid::new_v4(), vec![item(1, 10000, 18)]))
        .await
        .unwrap();
    invoicing.mark_sent(sale.id).await.unwrap();

    let purchase = invoicing
        .create_purchase(
            &org,
            PurchaseDraft {
                vendor_id: Uuid::new_v4(),
                purchase_date: date(2024, 4, 8),
                due_date: None,
                supply_state: "29".to_string(),
                items: vec![item(1, 5000, 18)],
            },
        )
        .await
        .unwrap();
    // Purchases count once received, mirroring the invoice lifecycle
    let mut recorded = storage.get_purchase(purchase.id).await.unwrap().unwrap();
    recorded.status = InvoiceStatus::Sent;
    let mut store = storage.clone();
    store.save_purchase(&recorded).await.unwrap();

    let period = ReportPeriod::new(4, 2024).unwrap();
    let mut aggregator = ComplianceAggregator::new(storage.clone());
    let outcome = aggregator.generate_gstr3b(org.id, period).await.unwrap();

    assert_eq!(outcome.report.outward_tax, BigDecimal::from(1800));
    assert_eq!(outcome.report.inward_tax, BigDecimal::from(900));
    assert_eq!(outcome.report.itc_available, BigDecimal::from(900));
    assert_eq!(outcome.report.tax_payable, BigDecimal::from(900));
}

struct FakeSigner {
    fail: bool,
}

#[async_trait::async_trait]
impl EInvoiceSigner for FakeSigner {
    async fn sign(&self, invoice: &Invoice) -> CoreResult<IrnReceipt> {
        if self.fail {
            return Err(CoreError::Storage("portal unreachable".to_string()));
        }
        Ok(IrnReceipt {
            irn: format!("IRN-{}", invoice.invoice_number),
            qr_code: "QR-DATA".to_string(),
        })
    }
}

#[tokio::test]
async fn einvoice_lifecycle() {
    let storage = MemoryStorage::new();
    let org = test_org();
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await.unwrap();
    let invoice = invoicing
        .create_invoice(&org, invoice_draft(Uuid::new_v4(), vec![item(1, 1000, 18)]))
        .await
        .unwrap();

    let mut aggregator = ComplianceAggregator::new(storage.clone());
    let signed = aggregator
        .generate_einvoice(invoice.id, &FakeSigner { fail: false })
        .await
        .unwrap();
    assert_eq!(signed.status, EInvoiceStatus::Generated);
    assert_eq!(signed.irn, "IRN-INV-00001");

    let acked = aggregator.acknowledge_einvoice(invoice.id).await.unwrap();
    assert_eq!(acked.status, EInvoiceStatus::Acknowledged);

    // A signer failure is recorded against the invoice
    let other = invoicing
        .create_invoice(&org, invoice_draft(Uuid::new_v4(), vec![item(1, 2000, 18)]))
        .await
        .unwrap();
    let err = aggregator
        .generate_einvoice(other.id, &FakeSigner { fail: true })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));
    let record = storage.get_einvoice(other.id).await.unwrap().unwrap();
    assert_eq!(record.status, EInvoiceStatus::Failed);
}
