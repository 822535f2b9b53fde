//! Invoice persistence collaborator.
//!
//! Invoices are immutable financial snapshots: they are created once, updated
//! only through lifecycle transitions, and never physically deleted;
//! cancellation is a terminal status, not removal.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use vitaerp_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion};
use vitaerp_invoicing::{Invoice, InvoiceId};
use vitaerp_reporting::InvoiceFilter;

/// Persistence collaborator for invoices.
pub trait InvoiceRepository: Send + Sync {
    /// Persist a freshly built invoice.
    ///
    /// Fails `Conflict` on a duplicate id or invoice number.
    fn create(&self, invoice: Invoice) -> DomainResult<()>;

    /// Persist a transitioned invoice.
    ///
    /// `expected` is the version the caller loaded; a concurrent writer that
    /// got there first makes this fail `Conflict` instead of double-applying.
    fn update(&self, invoice: Invoice, expected: ExpectedVersion) -> DomainResult<()>;

    fn get(&self, id: InvoiceId) -> DomainResult<Invoice>;

    fn get_by_number(&self, number: &str) -> DomainResult<Invoice>;

    /// Invoices matching `filter` at instant `now` (for the derived-overdue
    /// criterion).
    fn list(&self, filter: &InvoiceFilter, now: DateTime<Utc>) -> Vec<Invoice>;

    /// Every invoice, for whole-collection rollups.
    fn list_all(&self) -> Vec<Invoice>;
}

/// In-memory repository for tests/dev.
///
/// The write lock is what provides the single-writer-per-invoice guarantee
/// here; a database implementation would use a transaction or row lock.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    inner: RwLock<Store>,
}

#[derive(Debug, Default)]
struct Store {
    invoices: HashMap<InvoiceId, Invoice>,
    by_number: HashMap<String, InvoiceId>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvoiceRepository for InMemoryInvoiceRepository {
    fn create(&self, invoice: Invoice) -> DomainResult<()> {
        let number = invoice
            .number()
            .ok_or_else(|| DomainError::validation("cannot persist an invoice without a number"))?
            .as_str()
            .to_string();

        let mut store = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        if store.invoices.contains_key(&invoice.id_typed()) {
            return Err(DomainError::conflict("invoice id already exists"));
        }
        if store.by_number.contains_key(&number) {
            return Err(DomainError::conflict(format!(
                "invoice number {number} already exists"
            )));
        }

        store.by_number.insert(number, invoice.id_typed());
        store.invoices.insert(invoice.id_typed(), invoice);
        Ok(())
    }

    fn update(&self, invoice: Invoice, expected: ExpectedVersion) -> DomainResult<()> {
        let mut store = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;

        let current = store
            .invoices
            .get(&invoice.id_typed())
            .ok_or(DomainError::NotFound)?;
        expected.check(current.version())?;

        store.invoices.insert(invoice.id_typed(), invoice);
        Ok(())
    }

    fn get(&self, id: InvoiceId) -> DomainResult<Invoice> {
        let store = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;
        store.invoices.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn get_by_number(&self, number: &str) -> DomainResult<Invoice> {
        let store = self
            .inner
            .read()
            .map_err(|_| DomainError::conflict("invoice store lock poisoned"))?;
        store
            .by_number
            .get(number)
            .and_then(|id| store.invoices.get(id))
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn list(&self, filter: &InvoiceFilter, now: DateTime<Utc>) -> Vec<Invoice> {
        let store = match self.inner.read() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut matches: Vec<Invoice> = store
            .invoices
            .values()
            .filter(|inv| filter.matches(inv, now))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        matches
    }

    fn list_all(&self) -> Vec<Invoice> {
        let store = match self.inner.read() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        store.invoices.values().cloned().collect()
    }
}
