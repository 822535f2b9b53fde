use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitaerp_clients::{ClientId, ClientKind, ContactInfo};
use vitaerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, ValueObject};
use vitaerp_events::Event;

use crate::number::InvoiceNumber;
use crate::template::TemplateKind;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Stored invoice status lifecycle.
///
/// `overdue` is deliberately absent: it is a read-time view derived from
/// `(status, due_date, now)` via [`Invoice::is_overdue`] and must never be
/// written back into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    Cash,
    Other,
}

/// One invoice line (immutable once built).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    /// Whole currency units.
    pub unit_price: u64,
    /// `quantity × unit_price`, computed by the builder.
    pub line_total: u64,
}

impl ValueObject for InvoiceItem {}

/// Client details frozen into the invoice at build time.
///
/// The live client record may change later; the invoice keeps billing the
/// client as they were when it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub name: String,
    pub contact: ContactInfo,
}

/// Aggregate root: Invoice.
///
/// Serializable as a whole: the repository persists the current document,
/// not the event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    number: Option<InvoiceNumber>,
    client_id: Option<ClientId>,
    client_kind: ClientKind,
    client_snapshot: Option<ClientSnapshot>,
    items: Vec<InvoiceItem>,
    subtotal: u64,
    /// Basis points (1900 = 19%).
    tax_rate_bp: u32,
    tax_amount: u64,
    total: u64,
    issue_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    status: InvoiceStatus,
    payment_date: Option<DateTime<Utc>>,
    payment_method: Option<PaymentMethod>,
    notes: Option<String>,
    template_kind: Option<TemplateKind>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            number: None,
            client_id: None,
            client_kind: ClientKind::Customer,
            client_snapshot: None,
            items: Vec::new(),
            subtotal: 0,
            tax_rate_bp: 0,
            tax_amount: 0,
            total: 0,
            issue_date: None,
            due_date: None,
            status: InvoiceStatus::Draft,
            payment_date: None,
            payment_method: None,
            notes: None,
            template_kind: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn number(&self) -> Option<&InvoiceNumber> {
        self.number.as_ref()
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn client_kind(&self) -> ClientKind {
        self.client_kind
    }

    pub fn client_snapshot(&self) -> Option<&ClientSnapshot> {
        self.client_snapshot.as_ref()
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    pub fn tax_rate_bp(&self) -> u32 {
        self.tax_rate_bp
    }

    pub fn tax_amount(&self) -> u64 {
        self.tax_amount
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn issue_date(&self) -> Option<DateTime<Utc>> {
        self.issue_date
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.payment_date
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn template_kind(&self) -> Option<TemplateKind> {
        self.template_kind
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Derived overdue predicate, evaluated at read time by every consumer.
    ///
    /// Only `pending` invoices can be overdue; drafts were never sent and
    /// terminal invoices are settled. The result is never stored.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Pending
            && self.due_date.is_some_and(|due| now > due)
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SendInvoice (`draft → pending`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendInvoice {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment (`pending → paid`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub invoice_id: InvoiceId,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelInvoice (`draft|pending → cancelled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelInvoice {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendNotes.
///
/// Notes are the one field that stays mutable after an invoice reaches a
/// terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendNotes {
    pub invoice_id: InvoiceId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    SendInvoice(SendInvoice),
    RecordPayment(RecordPayment),
    CancelInvoice(CancelInvoice),
    AmendNotes(AmendNotes),
}

/// Event: InvoiceCreated.
///
/// Emitted exclusively by [`crate::builder::InvoiceBuilder`]; there is no
/// create command, which is what guarantees the builder is the single
/// creation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub invoice_id: InvoiceId,
    pub number: InvoiceNumber,
    pub client_id: ClientId,
    pub client_kind: ClientKind,
    pub client_snapshot: ClientSnapshot,
    pub items: Vec<InvoiceItem>,
    pub subtotal: u64,
    pub tax_rate_bp: u32,
    pub tax_amount: u64,
    pub total: u64,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub initial_status: InvoiceStatus,
    pub notes: Option<String>,
    pub template_kind: TemplateKind,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSent {
    pub invoice_id: InvoiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub invoice_id: InvoiceId,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InvoiceCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCancelled {
    pub invoice_id: InvoiceId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: NotesAmended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesAmended {
    pub invoice_id: InvoiceId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceCreated(InvoiceCreated),
    InvoiceSent(InvoiceSent),
    PaymentRecorded(PaymentRecorded),
    InvoiceCancelled(InvoiceCancelled),
    NotesAmended(NotesAmended),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "invoicing.invoice.created",
            InvoiceEvent::InvoiceSent(_) => "invoicing.invoice.sent",
            InvoiceEvent::PaymentRecorded(_) => "invoicing.invoice.payment_recorded",
            InvoiceEvent::InvoiceCancelled(_) => "invoicing.invoice.cancelled",
            InvoiceEvent::NotesAmended(_) => "invoicing.invoice.notes_amended",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceCreated(e) => e.occurred_at,
            InvoiceEvent::InvoiceSent(e) => e.occurred_at,
            InvoiceEvent::PaymentRecorded(e) => e.occurred_at,
            InvoiceEvent::InvoiceCancelled(e) => e.occurred_at,
            InvoiceEvent::NotesAmended(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceCreated(e) => {
                self.id = e.invoice_id;
                self.number = Some(e.number.clone());
                self.client_id = Some(e.client_id);
                self.client_kind = e.client_kind;
                self.client_snapshot = Some(e.client_snapshot.clone());
                self.items = e.items.clone();
                self.subtotal = e.subtotal;
                self.tax_rate_bp = e.tax_rate_bp;
                self.tax_amount = e.tax_amount;
                self.total = e.total;
                self.issue_date = Some(e.issue_date);
                self.due_date = Some(e.due_date);
                self.status = e.initial_status;
                self.notes = e.notes.clone();
                self.template_kind = Some(e.template_kind);
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.created = true;
            }
            InvoiceEvent::InvoiceSent(e) => {
                self.status = InvoiceStatus::Pending;
                self.updated_at = Some(e.occurred_at);
            }
            InvoiceEvent::PaymentRecorded(e) => {
                self.status = InvoiceStatus::Paid;
                self.payment_date = Some(e.payment_date);
                self.payment_method = Some(e.method);
                self.updated_at = Some(e.occurred_at);
            }
            InvoiceEvent::InvoiceCancelled(e) => {
                self.status = InvoiceStatus::Cancelled;
                self.updated_at = Some(e.occurred_at);
            }
            InvoiceEvent::NotesAmended(e) => {
                self.notes = e.notes.clone();
                self.updated_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::SendInvoice(cmd) => self.handle_send(cmd),
            InvoiceCommand::RecordPayment(cmd) => self.handle_record_payment(cmd),
            InvoiceCommand::CancelInvoice(cmd) => self.handle_cancel(cmd),
            InvoiceCommand::AmendNotes(cmd) => self.handle_amend_notes(cmd),
        }
    }
}

impl Invoice {
    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::conflict("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_send(&self, cmd: &SendInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::invalid_transition(format!(
                "cannot send a {} invoice (only draft)",
                self.status
            )));
        }

        Ok(vec![InvoiceEvent::InvoiceSent(InvoiceSent {
            invoice_id: cmd.invoice_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_payment(&self, cmd: &RecordPayment) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.status != InvoiceStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "cannot record a payment on a {} invoice (only pending)",
                self.status
            )));
        }

        Ok(vec![InvoiceEvent::PaymentRecorded(PaymentRecorded {
            invoice_id: cmd.invoice_id,
            payment_date: cmd.payment_date,
            method: cmd.method,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(cmd.invoice_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "cannot cancel a {} invoice",
                self.status
            )));
        }

        Ok(vec![InvoiceEvent::InvoiceCancelled(InvoiceCancelled {
            invoice_id: cmd.invoice_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend_notes(&self, cmd: &AmendNotes) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(cmd.invoice_id)?;

        // Allowed in every status, terminal ones included.
        Ok(vec![InvoiceEvent::NotesAmended(NotesAmended {
            invoice_id: cmd.invoice_id,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
