//! Billing service facade.
//!
//! Wires the pure domain (resolver, catalog, builder, lifecycle, reconciler,
//! stats) to the external collaborators (directory, repository, sequence,
//! clock). Each operation is one read-modify-write: the repository's
//! optimistic version check plus the serialized sequence give the two
//! concurrency guarantees the domain requires.

use chrono::{DateTime, Utc};

use vitaerp_clients::{ClientDirectory, ClientId, ClientKind, resolve};
use vitaerp_core::{Aggregate, AggregateRoot, Clock, DomainError, DomainResult, ExpectedVersion};
use vitaerp_invoicing::{
    AmendNotes, BuildRequest, CancelInvoice, Invoice, InvoiceBuilder, InvoiceCommand,
    InvoiceExportView, InvoiceId, ItemDraft, NumberSequence, PaymentMethod, RecordPayment,
    SendInvoice, TemplateCatalog, TemplateKind,
};
use vitaerp_reporting::{InvoiceFilter, InvoiceStats, compute_stats};
use vitaerp_revenue::{PaymentRecord, RawRevenueTotals, Reconciliation, reconcile};

use crate::store::InvoiceRepository;

/// Everything needed to create an invoice for a known client.
#[derive(Debug, Clone)]
pub struct CreateInvoiceRequest {
    pub client_kind: ClientKind,
    pub client_id: ClientId,
    pub template_kind: TemplateKind,
    pub items: Option<Vec<ItemDraft>>,
    pub manual_amount: Option<i64>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// The back-office billing engine, one instance per process.
pub struct BillingService<R, S, D, C> {
    repository: R,
    sequence: S,
    directory: D,
    clock: C,
    catalog: TemplateCatalog,
}

impl<R, S, D, C> BillingService<R, S, D, C>
where
    R: InvoiceRepository,
    S: NumberSequence,
    D: ClientDirectory,
    C: Clock,
{
    pub fn new(repository: R, sequence: S, directory: D, clock: C, catalog: TemplateCatalog) -> Self {
        Self {
            repository,
            sequence,
            directory,
            clock,
            catalog,
        }
    }

    /// Resolve the billing target, build the invoice, persist it.
    #[tracing::instrument(skip(self, request), fields(template = %request.template_kind))]
    pub fn create_invoice(&self, request: CreateInvoiceRequest) -> DomainResult<Invoice> {
        let entity = resolve(&self.directory, request.client_kind, request.client_id)?;

        let build = BuildRequest {
            template_kind: request.template_kind,
            items: request.items,
            manual_amount: request.manual_amount,
            description: request.description,
            notes: request.notes,
            issue_date: request.issue_date,
            due_date: request.due_date,
        };
        let builder = InvoiceBuilder::new(&self.catalog);
        let invoice = builder.build(&build, &entity, &self.sequence, self.clock.now())?;

        self.repository.create(invoice.clone())?;
        tracing::info!(
            invoice = %invoice.id_typed(),
            number = %invoice.number().map(|n| n.as_str()).unwrap_or_default(),
            total = invoice.total(),
            "invoice created"
        );
        Ok(invoice)
    }

    /// `draft → pending`.
    #[tracing::instrument(skip(self))]
    pub fn send_invoice(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.transition(
            id,
            InvoiceCommand::SendInvoice(SendInvoice {
                invoice_id: id,
                occurred_at: self.clock.now(),
            }),
        )
    }

    /// `pending → paid`.
    #[tracing::instrument(skip(self))]
    pub fn record_payment(
        &self,
        id: InvoiceId,
        payment_date: DateTime<Utc>,
        method: PaymentMethod,
    ) -> DomainResult<Invoice> {
        self.transition(
            id,
            InvoiceCommand::RecordPayment(RecordPayment {
                invoice_id: id,
                payment_date,
                method,
                occurred_at: self.clock.now(),
            }),
        )
    }

    /// `draft|pending → cancelled`.
    #[tracing::instrument(skip(self))]
    pub fn cancel_invoice(&self, id: InvoiceId, reason: Option<String>) -> DomainResult<Invoice> {
        self.transition(
            id,
            InvoiceCommand::CancelInvoice(CancelInvoice {
                invoice_id: id,
                reason,
                occurred_at: self.clock.now(),
            }),
        )
    }

    /// Amend notes in any status (the one field terminal invoices keep open).
    #[tracing::instrument(skip(self, notes))]
    pub fn amend_notes(&self, id: InvoiceId, notes: Option<String>) -> DomainResult<Invoice> {
        self.transition(
            id,
            InvoiceCommand::AmendNotes(AmendNotes {
                invoice_id: id,
                notes,
                occurred_at: self.clock.now(),
            }),
        )
    }

    pub fn get(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.repository.get(id)
    }

    pub fn get_by_number(&self, number: &str) -> DomainResult<Invoice> {
        self.repository.get_by_number(number)
    }

    pub fn list(&self, filter: &InvoiceFilter) -> Vec<Invoice> {
        self.repository.list(filter, self.clock.now())
    }

    /// Whole-collection rollup, derived-overdue rule folded in.
    pub fn stats(&self) -> InvoiceStats {
        compute_stats(&self.repository.list_all(), self.clock.now())
    }

    /// Reconcile upstream revenue figures; the correction warning is logged
    /// here and still returned; the flag is part of the contract.
    ///
    /// A non-zero split that disagrees with the reported total is not
    /// corrected (the measured figures win), only logged.
    pub fn reconcile_revenue(
        &self,
        raw: &RawRevenueTotals,
        payments: Option<&[PaymentRecord]>,
    ) -> Reconciliation {
        let result = reconcile(raw, payments);
        if let Some(warning) = &result.warning {
            tracing::warn!(
                total_revenue = raw.total_revenue,
                "revenue breakdown corrected: {warning}"
            );
        } else {
            let component_sum = raw.direct_revenue.saturating_add(raw.referral_revenue);
            if component_sum > 0 && component_sum != raw.total_revenue {
                tracing::warn!(
                    total_revenue = raw.total_revenue,
                    component_sum,
                    "reported channel split disagrees with total revenue"
                );
            }
        }
        result
    }

    /// Read-only export view for the external renderer.
    pub fn export_view(&self, id: InvoiceId) -> DomainResult<InvoiceExportView> {
        let invoice = self.repository.get(id)?;
        InvoiceExportView::from_invoice(&invoice, self.clock.now())
    }

    /// One read-modify-write, retried once on a lost race.
    ///
    /// The reload re-handles the command against the winner's state, so a
    /// concurrent duplicate `record_payment` observes `paid` and fails
    /// `InvalidTransition` instead of surfacing the raw version conflict.
    fn transition(&self, id: InvoiceId, command: InvoiceCommand) -> DomainResult<Invoice> {
        match self.try_transition(id, &command) {
            Err(DomainError::Conflict(_)) => self.try_transition(id, &command),
            outcome => outcome,
        }
    }

    fn try_transition(&self, id: InvoiceId, command: &InvoiceCommand) -> DomainResult<Invoice> {
        let mut invoice = self.repository.get(id)?;
        let loaded_version = invoice.version();

        let events = invoice.handle(command)?;
        for event in &events {
            invoice.apply(event);
        }

        self.repository
            .update(invoice.clone(), ExpectedVersion::Exact(loaded_version))?;
        Ok(invoice)
    }
}
