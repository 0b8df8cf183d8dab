//! Invoice, purchase, and payment lifecycle
//!
//! Documents are created DRAFT with their tax computed per item and their
//! number allocated from the sequencer. Status moves forward only; the only
//! backward-looking state, OVERDUE, is derived at read time by the
//! reconciler.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::sequence::{DocumentKind, Sequencer};
use crate::tax::{compute_line, SupplyType};
use crate::traits::{SequenceStore, Storage};
use crate::types::*;
use crate::utils::validation;

/// One not-yet-priced document line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub description: String,
    pub hsn_sac: Option<String>,
    pub quantity: BigDecimal,
    pub rate: BigDecimal,
    pub discount: Option<BigDecimal>,
    pub gst_rate: BigDecimal,
}

/// Input for creating a sales invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub invoice_type: InvoiceType,
    pub place_of_supply: String,
    pub items: Vec<ItemDraft>,
}

/// Input for creating a purchase document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDraft {
    pub vendor_id: Uuid,
    pub purchase_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub supply_state: String,
    pub items: Vec<ItemDraft>,
}

/// Document lifecycle operations for invoices, purchases, and payments
pub struct Invoicing<S: Storage + SequenceStore> {
    storage: S,
    sequencer: Sequencer<S>,
}

impl<S: Storage + SequenceStore + Clone> Invoicing<S> {
    pub fn new(storage: S) -> Self {
        Self {
            sequencer: Sequencer::new(storage.clone()),
            storage,
        }
    }

    /// Validate an organization's tax identity and persist it
    pub async fn register_organization(&mut self, org: &Organization) -> CoreResult<()> {
        validation::validate_gstin(&org.gstin)?;
        validation::validate_state_code(&org.state_code)?;
        self.storage.save_organization(org).await
    }

    /// Create a DRAFT invoice.
    ///
    /// Per-item tax is computed from the organization's state against the
    /// place of supply; the invoice tax total is the sum of the rounded
    /// item-level amounts. The invoice number is allocated only after item
    /// validation passes, so a rejected draft never consumes a number.
    pub async fn create_invoice(
        &mut self,
        org: &Organization,
        draft: InvoiceDraft,
    ) -> CoreResult<Invoice> {
        validation::validate_state_code(&draft.place_of_supply)?;
        let supply = SupplyType::from_states(&org.state_code, &draft.place_of_supply);
        let items = Self::price_items(&draft.items, supply)?;
        let (subtotal, tax_amount) = Self::document_totals(&items);

        let invoice_number = self
            .sequencer
            .next_number(org, DocumentKind::Invoice)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            organization_id: org.id,
            invoice_number,
            customer_id: draft.customer_id,
            invoice_date: draft.invoice_date,
            due_date: draft.due_date,
            invoice_type: draft.invoice_type,
            place_of_supply: draft.place_of_supply,
            items,
            total_amount: &subtotal + &tax_amount,
            subtotal,
            tax_amount,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_invoice(&invoice).await?;
        info!(invoice = %invoice.invoice_number, org = %org.id, "created invoice");
        Ok(invoice)
    }

    /// Create a DRAFT purchase, the buy-side mirror of an invoice. The
    /// vendor's state is the supply origin.
    pub async fn create_purchase(
        &mut self,
        org: &Organization,
        draft: PurchaseDraft,
    ) -> CoreResult<Purchase> {
        validation::validate_state_code(&draft.supply_state)?;
        let supply = SupplyType::from_states(&draft.supply_state, &org.state_code);
        let items = Self::price_items(&draft.items, supply)?;
        let (subtotal, tax_amount) = Self::document_totals(&items);

        let purchase_number = self
            .sequencer
            .next_number(org, DocumentKind::Purchase)
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            organization_id: org.id,
            purchase_number,
            vendor_id: draft.vendor_id,
            purchase_date: draft.purchase_date,
            due_date: draft.due_date,
            supply_state: draft.supply_state,
            items,
            total_amount: &subtotal + &tax_amount,
            subtotal,
            tax_amount,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_purchase(&purchase).await?;
        info!(purchase = %purchase.purchase_number, org = %org.id, "created purchase");
        Ok(purchase)
    }

    /// DRAFT -> SENT
    pub async fn mark_sent(&mut self, invoice_id: Uuid) -> CoreResult<Invoice> {
        self.transition_invoice(invoice_id, InvoiceStatus::Sent).await
    }

    /// SENT -> PAID, used when the reconciler reports full settlement
    pub async fn mark_paid(&mut self, invoice_id: Uuid) -> CoreResult<Invoice> {
        self.transition_invoice(invoice_id, InvoiceStatus::Paid).await
    }

    /// Cancel an invoice; allowed from any non-paid state
    pub async fn cancel_invoice(&mut self, invoice_id: Uuid) -> CoreResult<Invoice> {
        self.transition_invoice(invoice_id, InvoiceStatus::Cancelled)
            .await
    }

    async fn transition_invoice(
        &mut self,
        invoice_id: Uuid,
        to: InvoiceStatus,
    ) -> CoreResult<Invoice> {
        let mut invoice = self
            .storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("invoice {invoice_id}")))?;
        if !invoice.status.can_transition(to) {
            return Err(CoreError::Validation(format!(
                "invoice {} cannot move from {:?} to {to:?}",
                invoice.invoice_number, invoice.status
            )));
        }
        invoice.status = to;
        invoice.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_invoice(&invoice).await?;
        info!(invoice = %invoice.invoice_number, status = ?to, "invoice transitioned");
        Ok(invoice)
    }

    /// Record a payment. A payment references an invoice, a customer (for a
    /// free-standing advance), or both; at least one is required, and a
    /// referenced invoice must belong to the organization.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_payment(
        &mut self,
        org_id: Uuid,
        invoice_id: Option<Uuid>,
        customer_id: Option<Uuid>,
        amount: BigDecimal,
        payment_date: NaiveDate,
        mode: PaymentMode,
        status: PaymentStatus,
        reference_no: Option<String>,
    ) -> CoreResult<Payment> {
        if invoice_id.is_none() && customer_id.is_none() {
            return Err(CoreError::Validation(
                "payment needs an invoice or a customer".to_string(),
            ));
        }
        if amount <= BigDecimal::from(0) {
            return Err(CoreError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }
        if let Some(id) = invoice_id {
            let invoice = self
                .storage
                .get_invoice(id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("invoice {id}")))?;
            if invoice.organization_id != org_id {
                return Err(CoreError::NotFound(format!("invoice {id}")));
            }
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            organization_id: org_id,
            invoice_id,
            customer_id,
            amount,
            payment_date,
            mode,
            status,
            reference_no,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.save_payment(&payment).await?;
        Ok(payment)
    }

    fn price_items(drafts: &[ItemDraft], supply: SupplyType) -> CoreResult<Vec<InvoiceItem>> {
        if drafts.is_empty() {
            return Err(CoreError::Validation(
                "document needs at least one item".to_string(),
            ));
        }
        let mut items = Vec::with_capacity(drafts.len());
        for draft in drafts {
            validation::validate_item(&draft.quantity, &draft.rate, &draft.gst_rate)?;
            let line = compute_line(
                &draft.quantity,
                &draft.rate,
                draft.discount.as_ref(),
                &draft.gst_rate,
                supply,
            )?;
            items.push(InvoiceItem {
                description: draft.description.clone(),
                hsn_sac: draft.hsn_sac.clone(),
                quantity: draft.quantity.clone(),
                rate: draft.rate.clone(),
                discount: draft.discount.clone(),
                gst_rate: draft.gst_rate.clone(),
                amount: line.taxable_amount,
                gst_amount: line.breakup.total(),
            });
        }
        Ok(items)
    }

    /// Subtotal and tax as sums of the already-rounded item amounts
    fn document_totals(items: &[InvoiceItem]) -> (BigDecimal, BigDecimal) {
        let subtotal = items.iter().map(|i| &i.amount).sum();
        let tax_amount = items.iter().map(|i| &i.gst_amount).sum();
        (subtotal, tax_amount)
    }
}
