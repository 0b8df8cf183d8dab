//! Invoice/payment reconciliation and outstanding summaries
//!
//! Settlement is always derived from COMPLETED payments at read time.
//! Overdue is likewise a derived state: a stale persisted status after a
//! late payment is exactly the bug this module exists to avoid.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::Storage;
use crate::types::*;

/// Derived settlement position of one invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Paid,
    Partial,
    Unpaid,
}

/// Paid/pending amounts for an invoice, derived from its completed payments.
/// `pending_amount` goes negative on overpayment and is reported unclamped
/// so downstream reconciliation can flag it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub paid_amount: BigDecimal,
    pub pending_amount: BigDecimal,
    pub status: SettlementStatus,
}

/// Aggregate receivables position as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingSummary {
    pub total_outstanding: BigDecimal,
    /// Pending amounts on invoices whose due date has passed
    pub overdue_amount: BigDecimal,
    /// total_outstanding - overdue_amount
    pub upcoming_amount: BigDecimal,
}

/// Half a paisa: settlement comparisons use an epsilon rather than exact
/// zero so a rounding residue never strands an invoice in PARTIAL.
fn epsilon() -> BigDecimal {
    BigDecimal::new(bigdecimal::num_bigint::BigInt::from(5), 3)
}

/// Derive the settlement of an invoice from its payments.
///
/// Only COMPLETED payments tied to this invoice count; pending and failed
/// ones are ignored.
pub fn settlement(invoice: &Invoice, payments: &[Payment]) -> Settlement {
    let paid_amount: BigDecimal = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed && p.invoice_id == Some(invoice.id))
        .map(|p| &p.amount)
        .sum();

    let pending_amount = &invoice.total_amount - &paid_amount;
    let status = if pending_amount <= epsilon() {
        SettlementStatus::Paid
    } else if paid_amount == BigDecimal::from(0) {
        SettlementStatus::Unpaid
    } else {
        SettlementStatus::Partial
    };

    Settlement {
        paid_amount,
        pending_amount,
        status,
    }
}

/// The status to display for an invoice as of `today`.
///
/// Terminal stored states win; otherwise a fully settled invoice reads PAID
/// and a past-due invoice with a pending amount reads OVERDUE. Nothing here
/// is written back.
pub fn display_status(invoice: &Invoice, settlement: &Settlement, today: NaiveDate) -> InvoiceStatus {
    if invoice.status.is_terminal() {
        return invoice.status;
    }
    if settlement.status == SettlementStatus::Paid {
        return InvoiceStatus::Paid;
    }
    if let Some(due) = invoice.due_date {
        if due < today && settlement.pending_amount > BigDecimal::from(0) {
            return InvoiceStatus::Overdue;
        }
    }
    invoice.status
}

/// Outcome of matching bank statement lines against recorded payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankMatchResult {
    /// (bank transaction, payment) pairs matched by amount and reference
    pub matched: Vec<(Uuid, Uuid)>,
    /// Statement lines with no matching payment
    pub unmatched: Vec<Uuid>,
}

/// Match bank statement lines against completed payments by amount, and by
/// reference when both sides carry one. Each payment is consumed at most
/// once.
pub fn match_bank_transactions(
    transactions: &[BankTransaction],
    payments: &[Payment],
) -> BankMatchResult {
    let mut available: Vec<&Payment> = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .collect();
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for txn in transactions {
        let position = available.iter().position(|p| {
            if p.amount != txn.amount {
                return false;
            }
            match (&txn.reference, &p.reference_no) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        });
        match position {
            Some(idx) => {
                let payment = available.remove(idx);
                matched.push((txn.id, payment.id));
            }
            None => unmatched.push(txn.id),
        }
    }

    BankMatchResult { matched, unmatched }
}

/// Storage-backed reconciliation queries
pub struct Reconciler<S: Storage> {
    storage: S,
}

impl<S: Storage> Reconciler<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Settlement of one invoice, loading its completed payments
    pub async fn settlement_for(&self, invoice_id: Uuid) -> CoreResult<Settlement> {
        let invoice = self
            .storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("invoice {invoice_id}")))?;
        let payments = self.storage.payments_for_invoice(invoice_id).await?;
        Ok(settlement(&invoice, &payments))
    }

    /// Sum pending amounts across all open invoices, split into overdue
    /// (due date before `as_of`) and upcoming. Draft and cancelled invoices
    /// are not receivables and are excluded.
    pub async fn outstanding_summary(
        &self,
        org_id: Uuid,
        as_of: NaiveDate,
    ) -> CoreResult<OutstandingSummary> {
        let zero = BigDecimal::from(0);
        let mut total_outstanding = BigDecimal::from(0);
        let mut overdue_amount = BigDecimal::from(0);

        for invoice in self.storage.list_invoices(org_id).await? {
            if matches!(
                invoice.status,
                InvoiceStatus::Draft | InvoiceStatus::Cancelled
            ) {
                continue;
            }
            let payments = self.storage.payments_for_invoice(invoice.id).await?;
            let position = settlement(&invoice, &payments);
            if position.pending_amount <= zero {
                continue;
            }
            total_outstanding += &position.pending_amount;
            if matches!(invoice.due_date, Some(due) if due < as_of) {
                overdue_amount += &position.pending_amount;
            }
        }

        let upcoming_amount = &total_outstanding - &overdue_amount;
        Ok(OutstandingSummary {
            total_outstanding,
            overdue_amount,
            upcoming_amount,
        })
    }
}
