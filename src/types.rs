//! Core types and data structures for the invoicing and bookkeeping engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Receivables, Inventory, etc.)
    Asset,
    /// Liabilities - what the business owes (GST Payable, Accounts Payable, etc.)
    Liability,
    /// Equity - owner's interest in the business
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses normally carry debit balances;
    /// Liabilities, Equity, and Revenue carry credit balances.
    pub fn normal_side(&self) -> Side {
        match self {
            AccountType::Asset | AccountType::Expense => Side::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => Side::Credit,
        }
    }
}

/// The two sides of double-entry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Debit,
    Credit,
}

/// Tax identity and numbering configuration for a tenant.
///
/// Every other entity in the system belongs to exactly one organization;
/// cross-organization references are rejected as [`CoreError::InvalidAccount`]
/// or [`CoreError::NotFound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// 15-character GSTIN, format-checked at the boundary
    pub gstin: String,
    pub pan: String,
    /// Two-digit GST state code, e.g. "29" for Karnataka
    pub state_code: String,
    /// Prefix for invoice numbers, e.g. "INV-"
    pub invoice_prefix: String,
    pub created_at: NaiveDateTime,
}

impl Organization {
    pub fn new(
        name: String,
        gstin: String,
        pan: String,
        state_code: String,
        invoice_prefix: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            gstin,
            pan,
            state_code,
            invoice_prefix,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A chart-of-accounts row.
///
/// The account type is immutable after creation and balances are always
/// derived from the ledger; `opening_balance` is the only stored amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Account code, unique within the organization (e.g. "1200")
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub opening_balance: BigDecimal,
    pub created_at: NaiveDateTime,
}

impl Account {
    pub fn new(
        organization_id: Uuid,
        code: String,
        name: String,
        account_type: AccountType,
        opening_balance: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            code,
            name,
            account_type,
            opening_balance,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Lifecycle of a journal entry: created DRAFT, posted exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalStatus {
    Draft,
    Posted,
}

/// One line of a journal entry. Exactly one of debit/credit is nonzero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: Uuid,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_id: Uuid, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: BigDecimal::from(0),
            description,
        }
    }

    pub fn credit(account_id: Uuid, amount: BigDecimal, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: BigDecimal::from(0),
            credit: amount,
            description,
        }
    }

    /// A line carries an amount on exactly one side, and never a negative one
    pub fn validate(&self) -> CoreResult<()> {
        let zero = BigDecimal::from(0);
        if self.debit < zero || self.credit < zero {
            return Err(CoreError::Validation(
                "journal line amounts must be nonnegative".to_string(),
            ));
        }
        let debit_set = self.debit != zero;
        let credit_set = self.credit != zero;
        if debit_set == credit_set {
            return Err(CoreError::Validation(
                "journal line must have exactly one of debit or credit set".to_string(),
            ));
        }
        Ok(())
    }
}

/// A balanced double-entry transaction against the chart of accounts.
///
/// Once posted, the entry and its lines are immutable; corrections are
/// recorded as reversing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Sequential entry number, unique per organization (e.g. "JE-00042")
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub status: JournalStatus,
    pub lines: Vec<JournalLine>,
    pub total_debit: BigDecimal,
    pub total_credit: BigDecimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    /// Sum of all debit amounts across lines
    pub fn sum_debits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit).sum()
    }

    /// Sum of all credit amounts across lines
    pub fn sum_credits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.sum_debits() == self.sum_credits()
    }

    /// Validate the double-entry invariants: at least two lines, each line
    /// well-formed, header totals matching the lines, debits equal credits.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.len() < 2 {
            return Err(CoreError::Validation(
                "journal entry needs at least two lines".to_string(),
            ));
        }
        for line in &self.lines {
            line.validate()?;
        }
        let debits = self.sum_debits();
        let credits = self.sum_credits();
        if debits != credits {
            return Err(CoreError::UnbalancedEntry { debits, credits });
        }
        if self.total_debit != debits || self.total_credit != credits {
            return Err(CoreError::Validation(
                "journal entry header totals do not match its lines".to_string(),
            ));
        }
        Ok(())
    }
}

/// Flattened per-account view of a posted journal line.
///
/// Created only as a side effect of posting and never edited; `sequence` is
/// the storage-assigned insertion counter that breaks date ties so running
/// balances are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    pub journal_entry_id: Uuid,
    pub date: NaiveDate,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub sequence: u64,
}

/// B2B invoices are reported on GSTR-1 with the buyer's GSTIN;
/// B2C supplies are reported in aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    B2B,
    B2C,
}

/// Stored lifecycle of an invoice or purchase document.
///
/// `Overdue` is a display-only state derived at read time (due date passed
/// with a pending amount); it is never persisted as a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Forward-only transitions; cancellation allowed from any non-paid
    /// state. `Overdue` is never a valid stored target.
    pub fn can_transition(self, to: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, to),
            (Draft, Sent) | (Draft, Cancelled) | (Sent, Cancelled) | (Sent, Paid)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

/// A single invoice line with its computed tax split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    /// HSN (goods) or SAC (services) classification code
    pub hsn_sac: Option<String>,
    pub quantity: BigDecimal,
    pub rate: BigDecimal,
    pub discount: Option<BigDecimal>,
    /// GST rate percentage applied to this item
    pub gst_rate: BigDecimal,
    /// Taxable amount: quantity x rate - discount
    pub amount: BigDecimal,
    /// Total GST on this item (cgst + sgst + igst), rounded per item
    pub gst_amount: BigDecimal,
}

/// A sales invoice and its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Sequential number unique per organization, e.g. "INV-00001"
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub invoice_type: InvoiceType,
    /// Buyer state code; determines CGST/SGST vs IGST against the
    /// organization's own state
    pub place_of_supply: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: InvoiceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A purchase document, symmetric to [`Invoice`] for the buy side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub purchase_number: String,
    pub vendor_id: Uuid,
    pub purchase_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Seller state code on the inward supply
    pub supply_state: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: InvoiceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A payment, optionally tied to an invoice. Free-standing advances carry a
/// customer but no invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    pub reference_no: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Month/year key for the statutory report tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// 1-12
    pub month: u32,
    pub year: i32,
}

impl ReportPeriod {
    pub fn new(month: u32, year: i32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::Validation(format!(
                "report month must be 1-12, got {month}"
            )));
        }
        Ok(Self { month, year })
    }

    /// Whether a date falls inside this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        date.month() == self.month && date.year() == self.year
    }
}

/// Taxable value and tax split for one partition of a GSTR report
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxTotals {
    pub taxable_value: BigDecimal,
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
    pub igst: BigDecimal,
}

impl TaxTotals {
    pub fn total_tax(&self) -> BigDecimal {
        &self.cgst + &self.sgst + &self.igst
    }
}

/// GSTR-1: outward supplies for a period, one row per (org, month, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr1Report {
    pub organization_id: Uuid,
    pub period: ReportPeriod,
    pub b2b: TaxTotals,
    pub b2c: TaxTotals,
    pub invoice_count: usize,
    pub generated_at: NaiveDateTime,
}

/// GSTR-2: inward supplies for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr2Report {
    pub organization_id: Uuid,
    pub period: ReportPeriod,
    pub inward: TaxTotals,
    pub purchase_count: usize,
    pub generated_at: NaiveDateTime,
}

/// GSTR-3B: summary tax liability combining outward and inward totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gstr3bReport {
    pub organization_id: Uuid,
    pub period: ReportPeriod,
    pub outward_taxable_value: BigDecimal,
    pub outward_tax: BigDecimal,
    pub inward_tax: BigDecimal,
    /// Input tax credit available; simplified to the full inward tax
    pub itc_available: BigDecimal,
    /// max(0, outward_tax - itc_available)
    pub tax_payable: BigDecimal,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EInvoiceStatus {
    Generated,
    Acknowledged,
    Failed,
}

/// Externally issued e-invoice reference, 1:1 with an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EInvoice {
    pub invoice_id: Uuid,
    pub organization_id: Uuid,
    /// Invoice Reference Number returned by the e-invoice portal
    pub irn: String,
    pub qr_code: String,
    pub status: EInvoiceStatus,
    pub generated_at: NaiveDateTime,
}

/// A bank statement line awaiting a match against recorded payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub date: NaiveDate,
    pub amount: BigDecimal,
    pub reference: Option<String>,
    pub narration: String,
}

/// Errors that can occur in the bookkeeping core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unbalanced entry: debits = {debits}, credits = {credits}")]
    UnbalancedEntry {
        debits: BigDecimal,
        credits: BigDecimal,
    },
    #[error("journal entry already posted: {0}")]
    AlreadyPosted(Uuid),
    #[error("invalid account reference: {0}")]
    InvalidAccount(String),
    #[error("sequence allocation conflict: {0}")]
    SequenceConflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Only sequence conflicts are safe to retry blindly; everything else
    /// indicates a logic or data problem terminal for the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::SequenceConflict(_))
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
