//! Sequential document numbering
//!
//! Document numbers are allocated from a persisted per-(organization, kind)
//! counter through [`SequenceStore`], one atomic increment per allocation.
//! Gaps are tolerable (a failed creation after allocation simply skips a
//! number); duplicates are not.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::traits::SequenceStore;
use crate::types::{CoreResult, Organization};

/// Document families that carry their own number sequence per organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Invoice,
    Purchase,
    JournalEntry,
}

impl DocumentKind {
    /// Prefix used when the organization does not configure one.
    /// Invoices use the organization's own prefix.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV-",
            DocumentKind::Purchase => "PUR-",
            DocumentKind::JournalEntry => "JE-",
        }
    }
}

/// Format a document number as `{prefix}{sequence zero-padded to 5 digits}`
pub fn format_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}{sequence:05}")
}

/// Allocates unique, monotonically increasing document numbers
pub struct Sequencer<S: SequenceStore> {
    store: S,
}

impl<S: SequenceStore> Sequencer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Allocate the next raw sequence value for (org, kind).
    ///
    /// Never returns the same value twice for the same pair, even under
    /// concurrent callers; a store that cannot serialize the allocation
    /// returns [`crate::CoreError::SequenceConflict`], which the caller may
    /// retry.
    pub async fn next_sequence(&mut self, org_id: Uuid, kind: DocumentKind) -> CoreResult<u64> {
        let seq = self.store.allocate(org_id, kind).await?;
        debug!(%org_id, ?kind, seq, "allocated document sequence");
        Ok(seq)
    }

    /// Allocate and format the next document number for the organization
    pub async fn next_number(
        &mut self,
        org: &Organization,
        kind: DocumentKind,
    ) -> CoreResult<String> {
        let seq = self.next_sequence(org.id, kind).await?;
        let prefix = match kind {
            DocumentKind::Invoice => org.invoice_prefix.as_str(),
            _ => kind.default_prefix(),
        };
        Ok(format_number(prefix, seq))
    }
}
