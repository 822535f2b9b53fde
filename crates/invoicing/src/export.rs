//! Document export boundary.
//!
//! The core hands a read-only [`InvoiceExportView`] to an external renderer
//! and never performs layout or byte formatting itself. Render/send is
//! asynchronous from the core's perspective: failures surface as
//! [`ExportError::Failed`] for the caller to retry, and cancelling an export
//! has no effect on invoice state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vitaerp_clients::ClientKind;
use vitaerp_core::{DomainError, DomainResult};

use crate::invoice::{Invoice, InvoiceStatus, PaymentMethod};
use crate::template::TemplateKind;

/// Identity block of the rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportHeader {
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub template_kind: TemplateKind,
}

/// Who is being billed, as frozen at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportClientBlock {
    pub name: String,
    pub kind: ClientKind,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

/// Monetary totals, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTotals {
    pub subtotal: u64,
    pub tax_rate_bp: u32,
    pub tax_amount: u64,
    pub total: u64,
}

/// Trailing metadata (payment details, notes, generation time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFooter {
    pub generated_at: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Read-only view the core exposes to document renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceExportView {
    pub header: ExportHeader,
    pub client_block: ExportClientBlock,
    pub items: Vec<ExportLine>,
    pub totals: ExportTotals,
    pub footer: ExportFooter,
}

impl InvoiceExportView {
    /// Project an invoice into its export view.
    ///
    /// Fails `NotFound` for an invoice that was never created (rehydration
    /// shell); every created invoice is exportable regardless of status.
    pub fn from_invoice(invoice: &Invoice, generated_at: DateTime<Utc>) -> DomainResult<Self> {
        if !invoice.is_created() {
            return Err(DomainError::not_found());
        }
        let number = invoice.number().ok_or(DomainError::NotFound)?;
        let snapshot = invoice.client_snapshot().ok_or(DomainError::NotFound)?;
        let issue_date = invoice.issue_date().ok_or(DomainError::NotFound)?;
        let due_date = invoice.due_date().ok_or(DomainError::NotFound)?;
        let template_kind = invoice.template_kind().ok_or(DomainError::NotFound)?;

        Ok(Self {
            header: ExportHeader {
                invoice_number: number.as_str().to_string(),
                issue_date,
                due_date,
                status: invoice.status(),
                template_kind,
            },
            client_block: ExportClientBlock {
                name: snapshot.name.clone(),
                kind: invoice.client_kind(),
                email: snapshot.contact.email.clone(),
                phone: snapshot.contact.phone.clone(),
            },
            items: invoice
                .items()
                .iter()
                .map(|i| ExportLine {
                    description: i.description.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.line_total,
                })
                .collect(),
            totals: ExportTotals {
                subtotal: invoice.subtotal(),
                tax_rate_bp: invoice.tax_rate_bp(),
                tax_amount: invoice.tax_amount(),
                total: invoice.total(),
            },
            footer: ExportFooter {
                generated_at,
                payment_date: invoice.payment_date(),
                payment_method: invoice.payment_method(),
                notes: invoice.notes().map(str::to_string),
            },
        })
    }
}

/// Export failure, surfaced from the external renderer.
///
/// Retryable by the caller; the core runs no retry loop of its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("export failed: {cause}")]
    Failed { cause: String },
}

/// Rendered bytes plus their media type, produced outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// External renderer boundary (PDF/CSV/... lives behind this).
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, view: &InvoiceExportView) -> Result<RenderedDocument, ExportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use vitaerp_clients::{ClientId, ContactInfo};
    use vitaerp_core::{Aggregate, AggregateId};

    use crate::invoice::{
        ClientSnapshot, InvoiceCreated, InvoiceEvent, InvoiceId, InvoiceItem,
    };
    use crate::number::{BillingPeriod, InvoiceNumber};

    fn test_invoice() -> Invoice {
        let id = InvoiceId::new(AggregateId::new());
        let issue = Utc::now();
        let mut invoice = Invoice::empty(id);
        invoice.apply(&InvoiceEvent::InvoiceCreated(InvoiceCreated {
            invoice_id: id,
            number: InvoiceNumber::generate(BillingPeriod::of(issue), 12),
            client_id: ClientId::new(AggregateId::new()),
            client_kind: ClientKind::Partner,
            client_snapshot: ClientSnapshot {
                name: "CV Express Ltda".to_string(),
                contact: ContactInfo {
                    email: Some("pagos@cvexpress.cl".to_string()),
                    phone: None,
                },
            },
            items: vec![InvoiceItem {
                description: "Settlement of outstanding partner balance".to_string(),
                quantity: 1,
                unit_price: 150_000,
                line_total: 150_000,
            }],
            subtotal: 150_000,
            tax_rate_bp: 0,
            tax_amount: 0,
            total: 150_000,
            issue_date: issue,
            due_date: issue + Duration::days(15),
            initial_status: InvoiceStatus::Pending,
            notes: Some("monthly settlement".to_string()),
            template_kind: TemplateKind::PartnerDebtSettlement,
            occurred_at: issue,
        }));
        invoice
    }

    #[test]
    fn view_mirrors_invoice_fields() {
        let invoice = test_invoice();
        let generated_at = Utc::now();
        let view = InvoiceExportView::from_invoice(&invoice, generated_at).unwrap();

        assert_eq!(
            view.header.invoice_number,
            invoice.number().unwrap().as_str()
        );
        assert_eq!(view.header.status, InvoiceStatus::Pending);
        assert_eq!(view.client_block.name, "CV Express Ltda");
        assert_eq!(view.client_block.kind, ClientKind::Partner);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.totals.total, 150_000);
        assert_eq!(view.footer.generated_at, generated_at);
        assert_eq!(view.footer.notes.as_deref(), Some("monthly settlement"));
    }

    #[test]
    fn view_is_read_only_projection() {
        let invoice = test_invoice();
        let before = invoice.clone();
        let _ = InvoiceExportView::from_invoice(&invoice, Utc::now()).unwrap();
        assert_eq!(invoice, before);
    }

    #[test]
    fn uncreated_invoice_is_not_exportable() {
        let invoice = Invoice::empty(InvoiceId::new(AggregateId::new()));
        let err = InvoiceExportView::from_invoice(&invoice, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn renderer_failures_surface_as_export_failed() {
        struct FailingRenderer;
        impl DocumentRenderer for FailingRenderer {
            fn render(&self, _view: &InvoiceExportView) -> Result<RenderedDocument, ExportError> {
                Err(ExportError::Failed {
                    cause: "printer on fire".to_string(),
                })
            }
        }

        let view = InvoiceExportView::from_invoice(&test_invoice(), Utc::now()).unwrap();
        let err = FailingRenderer.render(&view).unwrap_err();
        match err {
            ExportError::Failed { cause } => assert_eq!(cause, "printer on fire"),
        }
    }

    #[test]
    fn view_serializes_for_the_renderer_boundary() {
        let view = InvoiceExportView::from_invoice(&test_invoice(), Utc::now()).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["header"]["status"], "pending");
        assert_eq!(json["totals"]["total"], 150_000);
    }
}
