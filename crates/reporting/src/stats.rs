//! Count/amount rollups per status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitaerp_invoicing::{Invoice, InvoiceStatus};

/// Rollup over an invoice collection.
///
/// `pending_*` covers every stored-`pending` invoice; `overdue_*` is the
/// derived subset of those past their due date. An overdue invoice therefore
/// appears in both; the derived view never changes a stored rollup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStats {
    pub total_invoices: usize,
    pub total_amount: u64,
    pub paid_invoices: usize,
    pub paid_amount: u64,
    pub pending_invoices: usize,
    pub pending_amount: u64,
    pub overdue_invoices: usize,
    pub overdue_amount: u64,
}

/// Compute rollups for a collection of invoices.
///
/// Pure function: deterministic and idempotent over the same `(invoices,
/// now)` input. Overdue figures come from [`Invoice::is_overdue`], never
/// from a stored field.
pub fn compute_stats(invoices: &[Invoice], now: DateTime<Utc>) -> InvoiceStats {
    let mut stats = InvoiceStats::default();

    for invoice in invoices {
        stats.total_invoices += 1;
        stats.total_amount = stats.total_amount.saturating_add(invoice.total());

        match invoice.status() {
            InvoiceStatus::Paid => {
                stats.paid_invoices += 1;
                stats.paid_amount = stats.paid_amount.saturating_add(invoice.total());
            }
            InvoiceStatus::Pending => {
                stats.pending_invoices += 1;
                stats.pending_amount = stats.pending_amount.saturating_add(invoice.total());
            }
            InvoiceStatus::Draft | InvoiceStatus::Cancelled => {}
        }

        if invoice.is_overdue(now) {
            stats.overdue_invoices += 1;
            stats.overdue_amount = stats.overdue_amount.saturating_add(invoice.total());
        }
    }

    stats
}
