//! Invoice list filtering.
//!
//! "Overdue" is queryable here exactly like a stored status, but it is
//! resolved through the derived predicate, so the persisted status set never
//! grows an `overdue` member.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitaerp_clients::ClientKind;
use vitaerp_invoicing::{Invoice, InvoiceStatus};

/// Status criterion: a stored status, or the derived overdue view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Stored(InvoiceStatus),
    Overdue,
}

/// Criteria for `list`; empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<StatusFilter>,
    pub client_kind: Option<ClientKind>,
    /// Inclusive bounds on the issue date.
    pub issued_from: Option<DateTime<Utc>>,
    pub issued_to: Option<DateTime<Utc>>,
    /// Case-insensitive match over invoice number, client name, and notes.
    pub search: Option<String>,
}

impl InvoiceFilter {
    /// Whether `invoice` satisfies every set criterion at instant `now`.
    pub fn matches(&self, invoice: &Invoice, now: DateTime<Utc>) -> bool {
        match self.status {
            Some(StatusFilter::Stored(status)) if invoice.status() != status => return false,
            Some(StatusFilter::Overdue) if !invoice.is_overdue(now) => return false,
            _ => {}
        }

        if let Some(kind) = self.client_kind {
            if invoice.client_kind() != kind {
                return false;
            }
        }

        if let Some(from) = self.issued_from {
            if invoice.issue_date().is_none_or(|d| d < from) {
                return false;
            }
        }
        if let Some(to) = self.issued_to {
            if invoice.issue_date().is_none_or(|d| d > to) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let number_hit = invoice
                .number()
                .is_some_and(|n| n.as_str().to_lowercase().contains(&needle));
            let name_hit = invoice
                .client_snapshot()
                .is_some_and(|s| s.name.to_lowercase().contains(&needle));
            let notes_hit = invoice
                .notes()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !(number_hit || name_hit || notes_hit) {
                return false;
            }
        }

        true
    }
}
