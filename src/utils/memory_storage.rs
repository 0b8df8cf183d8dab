//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::sequence::DocumentKind;
use crate::traits::{SequenceStore, Storage};
use crate::types::*;

type ReportKey = (Uuid, ReportPeriod);

/// Append-only ledger with its insertion counter, kept under one lock so
/// posting stays atomic
#[derive(Debug, Default)]
struct LedgerBook {
    entries: Vec<LedgerEntry>,
    next_sequence: u64,
}

/// In-memory [`Storage`] and [`SequenceStore`] implementation.
///
/// Clones share state, so one instance can back several components at once.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    organizations: Arc<RwLock<HashMap<Uuid, Organization>>>,
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    journal_entries: Arc<RwLock<HashMap<Uuid, JournalEntry>>>,
    ledger: Arc<RwLock<LedgerBook>>,
    invoices: Arc<RwLock<HashMap<Uuid, Invoice>>>,
    purchases: Arc<RwLock<HashMap<Uuid, Purchase>>>,
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
    gstr1: Arc<RwLock<HashMap<ReportKey, Gstr1Report>>>,
    gstr2: Arc<RwLock<HashMap<ReportKey, Gstr2Report>>>,
    gstr3b: Arc<RwLock<HashMap<ReportKey, Gstr3bReport>>>,
    einvoices: Arc<RwLock<HashMap<Uuid, EInvoice>>>,
    sequences: Arc<Mutex<HashMap<(Uuid, DocumentKind), u64>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all data (useful for tests)
    pub fn clear(&self) {
        self.organizations.write().unwrap().clear();
        self.accounts.write().unwrap().clear();
        self.journal_entries.write().unwrap().clear();
        *self.ledger.write().unwrap() = LedgerBook::default();
        self.invoices.write().unwrap().clear();
        self.purchases.write().unwrap().clear();
        self.payments.write().unwrap().clear();
        self.gstr1.write().unwrap().clear();
        self.gstr2.write().unwrap().clear();
        self.gstr3b.write().unwrap().clear();
        self.einvoices.write().unwrap().clear();
        self.sequences.lock().unwrap().clear();
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_organization(&mut self, org: &Organization) -> CoreResult<()> {
        self.organizations
            .write()
            .unwrap()
            .insert(org.id, org.clone());
        Ok(())
    }

    async fn get_organization(&self, org_id: Uuid) -> CoreResult<Option<Organization>> {
        Ok(self.organizations.read().unwrap().get(&org_id).cloned())
    }

    async fn save_account(&mut self, account: &Account) -> CoreResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        let duplicate_code = accounts.values().any(|a| {
            a.organization_id == account.organization_id
                && a.code == account.code
                && a.id != account.id
        });
        if duplicate_code {
            return Err(CoreError::Validation(format!(
                "account code '{}' already exists in this organization",
                account.code
            )));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: Uuid) -> CoreResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&account_id).cloned())
    }

    async fn list_accounts(&self, org_id: Uuid) -> CoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|a| a.organization_id == org_id)
            .cloned()
            .collect())
    }

    async fn save_journal_entry(&mut self, entry: &JournalEntry) -> CoreResult<()> {
        self.journal_entries
            .write()
            .unwrap()
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_journal_entry(&self, entry_id: Uuid) -> CoreResult<Option<JournalEntry>> {
        Ok(self.journal_entries.read().unwrap().get(&entry_id).cloned())
    }

    async fn post_journal_entry(
        &mut self,
        entry: &JournalEntry,
        ledger_entries: &[LedgerEntry],
    ) -> CoreResult<()> {
        // Both locks are held for the whole update: the posted header and
        // its ledger rows become visible together or not at all.
        let mut entries = self.journal_entries.write().unwrap();
        let mut ledger = self.ledger.write().unwrap();

        // The stored status is re-checked under the write lock; a caller's
        // earlier read is stale the moment a concurrent post lands.
        if entries
            .get(&entry.id)
            .is_some_and(|existing| existing.status == JournalStatus::Posted)
        {
            return Err(CoreError::AlreadyPosted(entry.id));
        }

        entries.insert(entry.id, entry.clone());
        for ledger_entry in ledger_entries {
            ledger.next_sequence += 1;
            let mut row = ledger_entry.clone();
            row.sequence = ledger.next_sequence;
            ledger.entries.push(row);
        }
        Ok(())
    }

    async fn ledger_entries(
        &self,
        account_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let ledger = self.ledger.read().unwrap();
        let mut rows: Vec<LedgerEntry> = ledger
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .filter(|e| as_of.is_none_or(|cutoff| e.date <= cutoff))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.sequence.cmp(&b.sequence)));
        Ok(rows)
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> CoreResult<()> {
        self.invoices
            .write()
            .unwrap()
            .insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> CoreResult<Option<Invoice>> {
        Ok(self.invoices.read().unwrap().get(&invoice_id).cloned())
    }

    async fn list_invoices(&self, org_id: Uuid) -> CoreResult<Vec<Invoice>> {
        Ok(self
            .invoices
            .read()
            .unwrap()
            .values()
            .filter(|i| i.organization_id == org_id)
            .cloned()
            .collect())
    }

    async fn invoices_in_period(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Vec<Invoice>> {
        Ok(self
            .invoices
            .read()
            .unwrap()
            .values()
            .filter(|i| i.organization_id == org_id && period.contains(i.invoice_date))
            .cloned()
            .collect())
    }

    async fn save_purchase(&mut self, purchase: &Purchase) -> CoreResult<()> {
        self.purchases
            .write()
            .unwrap()
            .insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> CoreResult<Option<Purchase>> {
        Ok(self.purchases.read().unwrap().get(&purchase_id).cloned())
    }

    async fn purchases_in_period(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Vec<Purchase>> {
        Ok(self
            .purchases
            .read()
            .unwrap()
            .values()
            .filter(|p| p.organization_id == org_id && period.contains(p.purchase_date))
            .cloned()
            .collect())
    }

    async fn save_payment(&mut self, payment: &Payment) -> CoreResult<()> {
        self.payments
            .write()
            .unwrap()
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn payments_for_invoice(&self, invoice_id: Uuid) -> CoreResult<Vec<Payment>> {
        Ok(self
            .payments
            .read()
            .unwrap()
            .values()
            .filter(|p| p.invoice_id == Some(invoice_id))
            .cloned()
            .collect())
    }

    async fn upsert_gstr1(&mut self, report: &Gstr1Report) -> CoreResult<()> {
        self.gstr1
            .write()
            .unwrap()
            .insert((report.organization_id, report.period), report.clone());
        Ok(())
    }

    async fn get_gstr1(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Option<Gstr1Report>> {
        Ok(self.gstr1.read().unwrap().get(&(org_id, period)).cloned())
    }

    async fn upsert_gstr2(&mut self, report: &Gstr2Report) -> CoreResult<()> {
        self.gstr2
            .write()
            .unwrap()
            .insert((report.organization_id, report.period), report.clone());
        Ok(())
    }

    async fn get_gstr2(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Option<Gstr2Report>> {
        Ok(self.gstr2.read().unwrap().get(&(org_id, period)).cloned())
    }

    async fn upsert_gstr3b(&mut self, report: &Gstr3bReport) -> CoreResult<()> {
        self.gstr3b
            .write()
            .unwrap()
            .insert((report.organization_id, report.period), report.clone());
        Ok(())
    }

    async fn get_gstr3b(
        &self,
        org_id: Uuid,
        period: ReportPeriod,
    ) -> CoreResult<Option<Gstr3bReport>> {
        Ok(self.gstr3b.read().unwrap().get(&(org_id, period)).cloned())
    }

    async fn upsert_einvoice(&mut self, einvoice: &EInvoice) -> CoreResult<()> {
        self.einvoices
            .write()
            .unwrap()
            .insert(einvoice.invoice_id, einvoice.clone());
        Ok(())
    }

    async fn get_einvoice(&self, invoice_id: Uuid) -> CoreResult<Option<EInvoice>> {
        Ok(self.einvoices.read().unwrap().get(&invoice_id).cloned())
    }
}

#[async_trait]
impl SequenceStore for MemoryStorage {
    async fn allocate(&mut self, org_id: Uuid, kind: DocumentKind) -> CoreResult<u64> {
        // Single mutex acquisition per allocation: increment-and-read is
        // atomic, so this implementation never reports a conflict.
        let mut sequences = self.sequences.lock().unwrap();
        let counter = sequences.entry((org_id, kind)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
