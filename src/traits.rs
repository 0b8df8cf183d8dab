//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::sequence::DocumentKind;
use crate::types::*;

/// Storage abstraction for the bookkeeping core.
///
/// Every query is organization-scoped; the core never assumes a pre-loaded
/// object graph and requests exactly the rows it needs. Implementations can
/// back this with any database; the crate ships an in-memory implementation
/// for tests and development.
#[async_trait]
pub trait Storage: Send + Sync {
    // Organizations
    async fn save_organization(&mut self, org: &Organization) -> CoreResult<()>;
    async fn get_organization(&self, org_id: Uuid) -> CoreResult<Option<Organization>>;

    // Chart of accounts
    async fn save_account(&mut self, account: &Account) -> CoreResult<()>;
    async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>>;
    async fn list_accounts(&self, org_id: Uuid) -> CoreResult<Vec<Account>>;

    // Journal
    async fn save_journal_entry(&mut self, entry: &JournalEntry) -> CoreResult<()>;
    async fn get_journal_entry(&self, entry_id: Uuid) -> CoreResult<Option<JournalEntry>>;

    /// Atomically persist a posted entry together with its projected ledger
    /// rows. Either everything lands or nothing does; a header flipped to
    /// POSTED without its ledger rows is an invariant violation the storage
    /// layer must make impossible. The storage assigns each ledger entry its
    /// `sequence` value.
    ///
    /// The DRAFT -> POSTED transition is part of this operation: the
    /// implementation must re-check the persisted entry's status inside the
    /// same transaction (a conditional update, not a blind overwrite) and
    /// fail with [`CoreError::AlreadyPosted`] when the stored entry is
    /// already posted. The caller's earlier status read does not count;
    /// without this check two concurrent posts of the same entry would each
    /// project ledger rows and double every affected balance.
    async fn post_journal_entry(
        &mut self,
        entry: &JournalEntry,
        ledger_entries: &[LedgerEntry],
    ) -> CoreResult<()>;

    /// Ledger rows for one account up to an optional cutoff date, ordered by
    /// date then insertion sequence.
    async fn ledger_entries(
        &self,
        account_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> CoreResult<Vec<LedgerEntry>>;

    // Invoices
    async fn save_invoice(&mut self, invoice: &Invoice) -> CoreResult<()>;
    async fn get_invoice(&self, invoice_id: Uuid) -> CoreResult<Option<Invoice>>;
    async fn list_invoices(&self, org_id: Uuid) -> CoreResult<Vec<Invoice>>;
    async fn invoices_in_period(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Vec<Invoice>>;

    // Purchases
    async fn save_purchase(&mut self, purchase: &Purchase) -> CoreResult<()>;
    async fn get_purchase(&self, purchase_id: Uuid) -> CoreResult<Option<Purchase>>;
    async fn purchases_in_period(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Vec<Purchase>>;

    // Payments
    async fn save_payment(&mut self, payment: &Payment) -> CoreResult<()>;
    async fn payments_for_invoice(&self, invoice_id: Uuid) -> CoreResult<Vec<Payment>>;

    // Statutory reports, keyed (org, month, year); upsert overwrites
    async fn upsert_gstr1(&mut self, report: &Gstr1Report) -> CoreResult<()>;
    async fn get_gstr1(&self, org_id: Uuid, period: ReportPeriod)
        -> CoreResult<Option<Gstr1Report>>;
    async fn upsert_gstr2(&mut self, report: &Gstr2Report) -> CoreResult<()>;
    async fn get_gstr2(&self, org_id: Uuid, period: ReportPeriod)
        -> CoreResult<Option<Gstr2Report>>;
    async fn upsert_gstr3b(&mut self, report: &Gstr3bReport) -> CoreResult<()>;
    async fn get_gstr3b(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Option<Gstr3bReport>>;

    // E-invoice records, 1:1 with invoices
    async fn upsert_einvoice(&mut self, einvoice: &EInvoice) -> CoreResult<()>;
    async fn get_einvoice(&self, invoice_id: Uuid) -> CoreResult<Option<EInvoice>>;
}

/// Persisted per-(organization, document kind) counter.
///
/// Each allocation must be a single atomic increment-and-read (row-level
/// locking or equivalent). Implementations that detect a concurrent
/// allocation they cannot serialize return [`CoreError::SequenceConflict`],
/// which is the one retryable error in the taxonomy. Deriving the next
/// number from `max(existing) + 1` is not an acceptable implementation; it
/// duplicates numbers under concurrent document creation.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Allocate the next sequence value for (org, kind), starting at 1
    async fn allocate(&mut self, org_id: Uuid, kind: DocumentKind) -> CoreResult<u64>;
}
