//! Read-only rollups and list filtering over invoice collections.
//!
//! Everything here is a pure function of `(invoices, now)`: the derived
//! overdue rule is folded in at read time and nothing is ever written back.

pub mod filter;
pub mod stats;

pub use filter::{InvoiceFilter, StatusFilter};
pub use stats::{InvoiceStats, compute_stats};
