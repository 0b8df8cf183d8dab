//! Periodic statutory report aggregation: GSTR-1, GSTR-2, GSTR-3B, and
//! e-invoice records
//!
//! Report rows are keyed (organization, month, year) and upserted, so
//! regenerating a period overwrites rather than duplicates. Tax figures are
//! recomputed from document items through the tax calculator on every run;
//! stored tax fields are never trusted, so a report always reflects the
//! current calculation rules.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::tax::{split_tax, SupplyType};
use crate::traits::Storage;
use crate::types::*;

/// IRN and QR payload returned by the external e-invoice portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrnReceipt {
    pub irn: String,
    pub qr_code: String,
}

/// External e-invoice signer. The portal integration itself lives outside
/// the core; this seam only yields the issued IRN/QR reference.
#[async_trait]
pub trait EInvoiceSigner: Send + Sync {
    async fn sign(&self, invoice: &Invoice) -> CoreResult<IrnReceipt>;
}

/// A generated report plus the sub-computations that failed.
///
/// A malformed invoice does not abort the whole period; it is skipped and
/// reported here so the period can be fixed and regenerated.
#[derive(Debug, Clone)]
pub struct ReportOutcome<R> {
    pub report: R,
    pub failures: Vec<String>,
}

fn clamped_payable(outward_tax: &BigDecimal, itc_available: &BigDecimal) -> BigDecimal {
    let payable = outward_tax - itc_available;
    if payable < BigDecimal::from(0) {
        BigDecimal::from(0)
    } else {
        payable
    }
}

/// Rolls up invoices and purchases into period-bucketed statutory reports
pub struct ComplianceAggregator<S: Storage> {
    storage: S,
}

impl<S: Storage> ComplianceAggregator<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Generate the GSTR-1 (outward supplies) report for a period.
    ///
    /// Scans non-draft, non-cancelled invoices dated in the period,
    /// partitions them B2B/B2C, and re-runs the tax calculator per item.
    /// The row for (org, month, year) is overwritten.
    pub async fn generate_gstr1(
        &mut self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<ReportOutcome<Gstr1Report>> {
        let org = self
            .storage
            .get_organization(org_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("organization {org_id}")))?;

        let invoices = self.storage.invoices_in_period(org_id, period).await?;
        let mut b2b = TaxTotals::default();
        let mut b2c = TaxTotals::default();
        let mut invoice_count = 0usize;
        let mut failures = Vec::new();

        for invoice in &invoices {
            if matches!(
                invoice.status,
                InvoiceStatus::Draft | InvoiceStatus::Cancelled
            ) {
                continue;
            }
            let supply = SupplyType::from_states(&org.state_code, &invoice.place_of_supply);
            match Self::accumulate_items(&invoice.items, supply) {
                Ok(totals) => {
                    let bucket = match invoice.invoice_type {
                        InvoiceType::B2B => &mut b2b,
                        InvoiceType::B2C => &mut b2c,
                    };
                    bucket.taxable_value += totals.taxable_value;
                    bucket.cgst += totals.cgst;
                    bucket.sgst += totals.sgst;
                    bucket.igst += totals.igst;
                    invoice_count += 1;
                }
                Err(err) => {
                    warn!(invoice = %invoice.invoice_number, %err, "skipping invoice in GSTR-1");
                    failures.push(format!("{}: {err}", invoice.invoice_number));
                }
            }
        }

        let report = Gstr1Report {
            organization_id: org_id,
            period,
            b2b,
            b2c,
            invoice_count,
            generated_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.upsert_gstr1(&report).await?;
        info!(%org_id, month = period.month, year = period.year, invoice_count, "generated GSTR-1");
        Ok(ReportOutcome { report, failures })
    }

    /// Generate the GSTR-2 (inward supplies) report for a period, symmetric
    /// to GSTR-1 over purchases
    pub async fn generate_gstr2(
        &mut self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<ReportOutcome<Gstr2Report>> {
        let org = self
            .storage
            .get_organization(org_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("organization {org_id}")))?;

        let purchases = self.storage.purchases_in_period(org_id, period).await?;
        let mut inward = TaxTotals::default();
        let mut purchase_count = 0usize;
        let mut failures = Vec::new();

        for purchase in &purchases {
            if matches!(
                purchase.status,
                InvoiceStatus::Draft | InvoiceStatus::Cancelled
            ) {
                continue;
            }
            // For an inward supply the vendor is the seller
            let supply = SupplyType::from_states(&purchase.supply_state, &org.state_code);
            match Self::accumulate_items(&purchase.items, supply) {
                Ok(totals) => {
                    inward.taxable_value += totals.taxable_value;
                    inward.cgst += totals.cgst;
                    inward.sgst += totals.sgst;
                    inward.igst += totals.igst;
                    purchase_count += 1;
                }
                Err(err) => {
                    warn!(purchase = %purchase.purchase_number, %err, "skipping purchase in GSTR-2");
                    failures.push(format!("{}: {err}", purchase.purchase_number));
                }
            }
        }

        let report = Gstr2Report {
            organization_id: org_id,
            period,
            inward,
            purchase_count,
            generated_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.upsert_gstr2(&report).await?;
        info!(%org_id, month = period.month, year = period.year, purchase_count, "generated GSTR-2");
        Ok(ReportOutcome { report, failures })
    }

    /// Generate the GSTR-3B summary for a period.
    ///
    /// Regenerates GSTR-1 and GSTR-2 first so the summary always combines
    /// current period totals: outward tax, inward tax, input tax credit
    /// (simplified to the full inward tax), and the net tax payable.
    pub async fn generate_gstr3b(
        &mut self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<ReportOutcome<Gstr3bReport>> {
        let outward = self.generate_gstr1(org_id, period).await?;
        let inward = self.generate_gstr2(org_id, period).await?;

        let outward_taxable_value =
            &outward.report.b2b.taxable_value + &outward.report.b2c.taxable_value;
        let outward_tax = outward.report.b2b.total_tax() + outward.report.b2c.total_tax();
        let inward_tax = inward.report.inward.total_tax();
        let itc_available = inward_tax.clone();
        let tax_payable = clamped_payable(&outward_tax, &itc_available);

        let report = Gstr3bReport {
            organization_id: org_id,
            period,
            outward_taxable_value,
            outward_tax,
            inward_tax,
            itc_available,
            tax_payable,
            generated_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.upsert_gstr3b(&report).await?;
        info!(%org_id, month = period.month, year = period.year, "generated GSTR-3B");

        let mut failures = outward.failures;
        failures.extend(inward.failures);
        Ok(ReportOutcome { report, failures })
    }

    /// Obtain an IRN for an invoice from the external signer and persist the
    /// e-invoice record 1:1 with the invoice. A signer failure is persisted
    /// as a FAILED record before the error propagates.
    pub async fn generate_einvoice(
        &mut self,
        invoice_id: Uuid,
        signer: &dyn EInvoiceSigner,
    ) -> CoreResult<EInvoice> {
        let invoice = self
            .storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("invoice {invoice_id}")))?;

        match signer.sign(&invoice).await {
            Ok(receipt) => {
                let einvoice = EInvoice {
                    invoice_id,
                    organization_id: invoice.organization_id,
                    irn: receipt.irn,
                    qr_code: receipt.qr_code,
                    status: EInvoiceStatus::Generated,
                    generated_at: chrono::Utc::now().naive_utc(),
                };
                self.storage.upsert_einvoice(&einvoice).await?;
                info!(invoice = %invoice.invoice_number, "e-invoice generated");
                Ok(einvoice)
            }
            Err(err) => {
                let einvoice = EInvoice {
                    invoice_id,
                    organization_id: invoice.organization_id,
                    irn: String::new(),
                    qr_code: String::new(),
                    status: EInvoiceStatus::Failed,
                    generated_at: chrono::Utc::now().naive_utc(),
                };
                self.storage.upsert_einvoice(&einvoice).await?;
                warn!(invoice = %invoice.invoice_number, %err, "e-invoice signing failed");
                Err(err)
            }
        }
    }

    /// Flip a GENERATED e-invoice to ACKNOWLEDGED once the portal confirms
    pub async fn acknowledge_einvoice(&mut self, invoice_id: Uuid) -> CoreResult<EInvoice> {
        let mut einvoice = self
            .storage
            .get_einvoice(invoice_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("e-invoice for invoice {invoice_id}")))?;
        if einvoice.status != EInvoiceStatus::Generated {
            return Err(CoreError::Validation(format!(
                "e-invoice for invoice {invoice_id} is not awaiting acknowledgement"
            )));
        }
        einvoice.status = EInvoiceStatus::Acknowledged;
        self.storage.upsert_einvoice(&einvoice).await?;
        Ok(einvoice)
    }

    fn accumulate_items(items: &[InvoiceItem], supply: SupplyType) -> CoreResult<TaxTotals> {
        let mut totals = TaxTotals::default();
        for item in items {
            let breakup = split_tax(&item.amount, &item.gst_rate, supply)?;
            totals.taxable_value += &item.amount;
            totals.cgst += breakup.cgst;
            totals.sgst += breakup.sgst;
            totals.igst += breakup.igst;
        }
        Ok(totals)
    }
}
