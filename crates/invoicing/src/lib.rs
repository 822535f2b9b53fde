//! Invoicing domain module (event-sourced).
//!
//! This crate contains the business rules for invoice construction and the
//! invoice status lifecycle, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage). Invoices are immutable financial snapshots:
//! amounts resolved from a client's balance at build time are frozen in and
//! never re-derived, even if the live balance later changes.

pub mod builder;
pub mod export;
pub mod invoice;
pub mod number;
pub mod template;

pub use builder::{BuildRequest, InvoiceBuilder, ItemDraft};
pub use export::{
    DocumentRenderer, ExportClientBlock, ExportError, ExportFooter, ExportHeader, ExportLine,
    ExportTotals, InvoiceExportView, RenderedDocument,
};
pub use invoice::{
    AmendNotes, CancelInvoice, ClientSnapshot, Invoice, InvoiceCancelled, InvoiceCommand,
    InvoiceCreated, InvoiceEvent, InvoiceId, InvoiceItem, InvoiceSent, InvoiceStatus,
    NotesAmended, PaymentMethod, PaymentRecorded, RecordPayment, SendInvoice,
};
pub use number::{BillingPeriod, InvoiceNumber, NumberSequence};
pub use template::{
    AmountRule, InvoiceTemplate, TemplateCatalog, TemplateKind, default_catalog, resolve_amount,
};
