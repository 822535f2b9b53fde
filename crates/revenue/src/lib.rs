//! Revenue reconciliation.
//!
//! Upstream reporting hands us an aggregate revenue figure plus a per-channel
//! breakdown that is known to be occasionally inconsistent. This crate turns
//! those figures into a trustworthy, percentage-annotated breakdown: measured
//! when payment-level records are available, corrected-and-flagged when the
//! documented upstream defect is detected.

pub mod reconcile;

pub use reconcile::{
    Channel, PaymentRecord, RawRevenueTotals, Reconciliation, ReconciliationWarning,
    RevenueBreakdown, reconcile,
};
