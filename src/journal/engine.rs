//! Journal entry creation, posting, and reversal

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::sequence::{format_number, DocumentKind, Sequencer};
use crate::traits::{SequenceStore, Storage};
use crate::types::*;

/// A validated, not-yet-numbered journal entry
#[derive(Debug, Clone)]
pub struct DraftEntry {
    pub date: NaiveDate,
    pub description: String,
    pub lines: Vec<JournalLine>,
}

/// Builder for journal entries
#[derive(Debug)]
pub struct EntryBuilder {
    date: NaiveDate,
    description: String,
    lines: Vec<JournalLine>,
}

impl EntryBuilder {
    pub fn new(date: NaiveDate, description: String) -> Self {
        Self {
            date,
            description,
            lines: Vec::new(),
        }
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: Uuid, amount: BigDecimal) -> Self {
        self.lines.push(JournalLine::debit(account_id, amount, None));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_id: Uuid, amount: BigDecimal) -> Self {
        self.lines
            .push(JournalLine::credit(account_id, amount, None));
        self
    }

    /// Add a pre-built line
    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Validate the double-entry invariants and produce a draft.
    /// Fails with [`CoreError::UnbalancedEntry`] when debits and credits
    /// differ, or a validation error for malformed lines.
    pub fn build(self) -> CoreResult<DraftEntry> {
        if self.lines.len() < 2 {
            return Err(CoreError::Validation(
                "journal entry needs at least two lines".to_string(),
            ));
        }
        for line in &self.lines {
            line.validate()?;
        }
        let debits: BigDecimal = self.lines.iter().map(|l| &l.debit).sum();
        let credits: BigDecimal = self.lines.iter().map(|l| &l.credit).sum();
        if debits != credits {
            return Err(CoreError::UnbalancedEntry { debits, credits });
        }
        Ok(DraftEntry {
            date: self.date,
            description: self.description,
            lines: self.lines,
        })
    }
}

/// Records balanced double-entry transactions and projects them into the
/// ledger on posting
pub struct JournalEngine<S: Storage + SequenceStore> {
    storage: S,
    sequencer: Sequencer<S>,
}

impl<S: Storage + SequenceStore + Clone> JournalEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            sequencer: Sequencer::new(storage.clone()),
            storage,
        }
    }

    /// Create a DRAFT journal entry from a validated draft.
    ///
    /// Every line must reference an account that exists and belongs to the
    /// same organization; a foreign or missing reference fails with
    /// [`CoreError::InvalidAccount`]. The entry number is allocated only
    /// after validation passes, so validation failures never consume a
    /// number.
    pub async fn create_entry(
        &mut self,
        organization_id: Uuid,
        draft: DraftEntry,
    ) -> CoreResult<JournalEntry> {
        for line in &draft.lines {
            match self.storage.get_account(line.account_id).await? {
                None => {
                    return Err(CoreError::InvalidAccount(format!(
                        "account {} does not exist",
                        line.account_id
                    )))
                }
                Some(account) if account.organization_id != organization_id => {
                    return Err(CoreError::InvalidAccount(format!(
                        "account {} belongs to another organization",
                        line.account_id
                    )))
                }
                Some(_) => {}
            }
        }

        let seq = self
            .sequencer
            .next_sequence(organization_id, DocumentKind::JournalEntry)
            .await?;
        let entry_number = format_number(DocumentKind::JournalEntry.default_prefix(), seq);

        let now = chrono::Utc::now().naive_utc();
        let total_debit: BigDecimal = draft.lines.iter().map(|l| &l.debit).sum();
        let total_credit: BigDecimal = draft.lines.iter().map(|l| &l.credit).sum();
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            organization_id,
            entry_number,
            date: draft.date,
            description: draft.description,
            status: JournalStatus::Draft,
            lines: draft.lines,
            total_debit,
            total_credit,
            created_at: now,
            updated_at: now,
        };
        entry.validate()?;

        self.storage.save_journal_entry(&entry).await?;
        info!(entry = %entry.entry_number, %organization_id, "created journal entry");
        Ok(entry)
    }

    /// Transition a DRAFT entry to POSTED, projecting one ledger entry per
    /// line in the same storage transaction.
    ///
    /// Posting an already-POSTED entry fails with
    /// [`CoreError::AlreadyPosted`]. The early status check here is a fast
    /// path; the authoritative guard is the conditional transition inside
    /// [`Storage::post_journal_entry`], which holds even when two posts of
    /// the same entry race. Posted entries are immutable from here on.
    pub async fn post(&mut self, entry_id: Uuid) -> CoreResult<JournalEntry> {
        let mut entry = self
            .storage
            .get_journal_entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("journal entry {entry_id}")))?;

        if entry.status == JournalStatus::Posted {
            return Err(CoreError::AlreadyPosted(entry_id));
        }
        // The balance invariant is enforced again at the transition, not
        // just at creation
        entry.validate()?;

        entry.status = JournalStatus::Posted;
        entry.updated_at = chrono::Utc::now().naive_utc();

        let ledger_entries: Vec<LedgerEntry> = entry
            .lines
            .iter()
            .map(|line| LedgerEntry {
                id: Uuid::new_v4(),
                organization_id: entry.organization_id,
                account_id: line.account_id,
                journal_entry_id: entry.id,
                date: entry.date,
                debit: line.debit.clone(),
                credit: line.credit.clone(),
                // assigned by the storage layer
                sequence: 0,
            })
            .collect();

        self.storage
            .post_journal_entry(&entry, &ledger_entries)
            .await?;
        info!(entry = %entry.entry_number, lines = entry.lines.len(), "posted journal entry");
        Ok(entry)
    }

    /// Create and post a reversing entry for a POSTED entry.
    ///
    /// Posted entries are never mutated or deleted; this is the only
    /// correction mechanism.
    pub async fn reverse(
        &mut self,
        entry_id: Uuid,
        date: NaiveDate,
        description: Option<String>,
    ) -> CoreResult<JournalEntry> {
        let original = self
            .storage
            .get_journal_entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("journal entry {entry_id}")))?;

        if original.status != JournalStatus::Posted {
            return Err(CoreError::Validation(format!(
                "only posted entries can be reversed, {} is a draft",
                original.entry_number
            )));
        }

        let lines = original
            .lines
            .iter()
            .map(|line| JournalLine {
                account_id: line.account_id,
                debit: line.credit.clone(),
                credit: line.debit.clone(),
                description: line.description.clone(),
            })
            .collect();

        let draft = DraftEntry {
            date,
            description: description
                .unwrap_or_else(|| format!("Reversal of {}", original.entry_number)),
            lines,
        };
        let reversal = self
            .create_entry(original.organization_id, draft)
            .await?;
        self.post(reversal.id).await
    }

    /// Fetch an entry, failing with `NotFound` when absent
    pub async fn get_entry(&self, entry_id: Uuid) -> CoreResult<JournalEntry> {
        self.storage
            .get_journal_entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("journal entry {entry_id}")))
    }
}
