//! Infrastructure layer: adapters for the external collaborators and the
//! billing service facade.
//!
//! The domain crates stay pure; everything that needs a lock, a counter, or
//! a lookup table lives here. The in-memory adapters double as the reference
//! semantics for real database-backed implementations: `create` rejects
//! duplicate numbers, `update` enforces optimistic concurrency, and the
//! number sequence is serialized.

pub mod directory;
pub mod sequence;
pub mod service;
pub mod store;

pub use directory::InMemoryClientDirectory;
pub use sequence::InMemoryNumberSequence;
pub use service::{BillingService, CreateInvoiceRequest};
pub use store::{InMemoryInvoiceRepository, InvoiceRepository};

#[cfg(test)]
mod integration_tests;
