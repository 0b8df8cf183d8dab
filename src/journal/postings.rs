//! Canned double-entry postings for the common document flows

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::journal::engine::{DraftEntry, EntryBuilder};
use crate::types::{CoreResult, Side};

/// Posting for a sales invoice: debit receivables for the gross total,
/// credit revenue for the taxable value and GST payable for the tax.
/// The GST line is omitted for zero-tax invoices; a zero-amount line is
/// not a valid journal line.
pub fn sales_invoice(
    date: NaiveDate,
    invoice_number: &str,
    receivables_account: Uuid,
    revenue_account: Uuid,
    gst_payable_account: Uuid,
    subtotal: BigDecimal,
    tax_amount: BigDecimal,
) -> CoreResult<DraftEntry> {
    let total = &subtotal + &tax_amount;
    let mut builder = EntryBuilder::new(date, format!("Invoice {invoice_number}"))
        .debit(receivables_account, total)
        .credit(revenue_account, subtotal);
    if tax_amount != BigDecimal::from(0) {
        builder = builder.credit(gst_payable_account, tax_amount);
    }
    builder.build()
}

/// Posting for a purchase: debit expense for the taxable value and GST
/// receivable for the recoverable tax, credit payables for the gross total
pub fn purchase(
    date: NaiveDate,
    purchase_number: &str,
    expense_account: Uuid,
    gst_receivable_account: Uuid,
    payables_account: Uuid,
    subtotal: BigDecimal,
    tax_amount: BigDecimal,
) -> CoreResult<DraftEntry> {
    let total = &subtotal + &tax_amount;
    let mut builder = EntryBuilder::new(date, format!("Purchase {purchase_number}"))
        .debit(expense_account, subtotal)
        .credit(payables_account, total);
    if tax_amount != BigDecimal::from(0) {
        builder = builder.debit(gst_receivable_account, tax_amount);
    }
    builder.build()
}

/// Posting for a customer payment: debit cash/bank, credit receivables
pub fn payment_received(
    date: NaiveDate,
    reference: &str,
    cash_account: Uuid,
    receivables_account: Uuid,
    amount: BigDecimal,
) -> CoreResult<DraftEntry> {
    EntryBuilder::new(date, format!("Payment received {reference}"))
        .debit(cash_account, amount.clone())
        .credit(receivables_account, amount)
        .build()
}

/// Posting for seeding an account's opening balance against opening equity.
/// `side` is the account's normal balance side, from
/// [`crate::types::AccountType::normal_side`].
pub fn opening_balance(
    date: NaiveDate,
    account: Uuid,
    opening_equity_account: Uuid,
    side: Side,
    amount: BigDecimal,
) -> CoreResult<DraftEntry> {
    let builder = EntryBuilder::new(date, "Opening balance".to_string());
    match side {
        Side::Debit => builder
            .debit(account, amount.clone())
            .credit(opening_equity_account, amount)
            .build(),
        Side::Credit => builder
            .credit(account, amount.clone())
            .debit(opening_equity_account, amount)
            .build(),
    }
}
