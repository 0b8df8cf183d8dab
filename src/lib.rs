//! # Invoicing Core
//!
//! The financial ledger and tax-computation engine behind a GST-compliant
//! invoicing platform for Indian small businesses.
//!
//! ## Features
//!
//! - **Double-entry journal**: balanced entries, draft/post lifecycle,
//!   reversing corrections
//! - **Ledger projection**: derived account balances and trial balance
//! - **GST tax splitting**: CGST/SGST/IGST by supply type with statutory
//!   rounding
//! - **Document numbering**: atomic per-organization, per-kind sequences
//! - **Payment reconciliation**: derived settlement, outstanding and overdue
//!   summaries, bank statement matching
//! - **Compliance aggregation**: GSTR-1/2/3B period reports and e-invoice
//!   records
//! - **Storage abstraction**: database-agnostic trait seam with an
//!   in-memory implementation for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use invoicing_core::{tax, SupplyType};
//! use bigdecimal::BigDecimal;
//!
//! let split = tax::split_tax(
//!     &BigDecimal::from(1000),
//!     &BigDecimal::from(18),
//!     SupplyType::from_states("29", "29"),
//! )
//! .unwrap();
//! assert_eq!(split.cgst, split.sgst);
//! ```

pub mod compliance;
pub mod invoicing;
pub mod journal;
pub mod ledger;
pub mod reconciliation;
pub mod sequence;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use compliance::{ComplianceAggregator, EInvoiceSigner, IrnReceipt, ReportOutcome};
pub use invoicing::{InvoiceDraft, Invoicing, ItemDraft, PurchaseDraft};
pub use journal::{DraftEntry, EntryBuilder, JournalEngine};
pub use ledger::{LedgerProjector, TrialBalance, TrialBalanceRow};
pub use reconciliation::{
    settlement, OutstandingSummary, Reconciler, Settlement, SettlementStatus,
};
pub use sequence::{DocumentKind, Sequencer};
pub use tax::{GstBreakup, GstSlab, SupplyType};
pub use traits::{SequenceStore, Storage};
pub use types::*;
