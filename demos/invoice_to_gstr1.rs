//! End-to-end walkthrough: register an organization, raise a GST invoice,
//! record a payment, and file the month's GSTR-1.
//!
//! Run with: cargo run --example invoice_to_gstr1

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use invoicing_core::{
    compliance::ComplianceAggregator, utils::MemoryStorage, CoreResult, InvoiceDraft, InvoiceType,
    Invoicing, ItemDraft, Organization, PaymentMode, PaymentStatus, Reconciler, ReportPeriod,
};

#[tokio::main]
async fn main() -> CoreResult<()> {
    let storage = MemoryStorage::new();

    let org = Organization::new(
        "Acme Traders".to_string(),
        "29ABCDE1234F1Z5".to_string(),
        "ABCDE1234F".to_string(),
        "29".to_string(),
        "INV-".to_string(),
    );
    let mut invoicing = Invoicing::new(storage.clone());
    invoicing.register_organization(&org).await?;

    let customer_id = Uuid::new_v4();
    let invoice = invoicing
        .create_invoice(
            &org,
            InvoiceDraft {
                customer_id,
                invoice_date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2024, 4, 30),
                invoice_type: InvoiceType::B2B,
                place_of_supply: "29".to_string(),
                items: vec![ItemDraft {
                    description: "Consulting services".to_string(),
                    hsn_sac: Some("9983".to_string()),
                    quantity: BigDecimal::from(10),
                    rate: BigDecimal::from(1500),
                    discount: None,
                    gst_rate: BigDecimal::from(18),
                }],
            },
        )
        .await?;
    println!(
        "{}: subtotal {} + GST {} = {}",
        invoice.invoice_number, invoice.subtotal, invoice.tax_amount, invoice.total_amount
    );

    let sent = invoicing.mark_sent(invoice.id).await?;
    invoicing
        .record_payment(
            org.id,
            Some(sent.id),
            Some(customer_id),
            BigDecimal::from(10000),
            NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
            PaymentMode::Upi,
            PaymentStatus::Completed,
            Some("UTR-20240412".to_string()),
        )
        .await?;

    let reconciler = Reconciler::new(storage.clone());
    let position = reconciler.settlement_for(sent.id).await?;
    println!(
        "settlement: {:?}, paid {}, pending {}",
        position.status, position.paid_amount, position.pending_amount
    );

    let mut aggregator = ComplianceAggregator::new(storage.clone());
    let period = ReportPeriod::new(4, 2024)?;
    let outcome = aggregator.generate_gstr1(org.id, period).await?;
    println!(
        "GSTR-1 {:02}/{}: {} invoices, B2B taxable {} (CGST {} SGST {} IGST {})",
        period.month,
        period.year,
        outcome.report.invoice_count,
        outcome.report.b2b.taxable_value,
        outcome.report.b2b.cgst,
        outcome.report.b2b.sgst,
        outcome.report.b2b.igst,
    );

    Ok(())
}
