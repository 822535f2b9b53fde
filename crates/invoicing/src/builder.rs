//! Invoice construction.
//!
//! The builder is the single creation path for invoices: it combines a
//! template, a resolved billing entity and optional manual overrides into a
//! validated [`Invoice`], computing totals with checked arithmetic and
//! allocating a unique number from the durable sequence collaborator.

use chrono::{DateTime, Utc};

use vitaerp_clients::BillableEntity;
use vitaerp_core::{Aggregate, AggregateId, DomainError, DomainResult};

use crate::invoice::{
    ClientSnapshot, Invoice, InvoiceCreated, InvoiceEvent, InvoiceId, InvoiceItem,
};
use crate::number::{BillingPeriod, InvoiceNumber, NumberSequence};
use crate::template::{TemplateCatalog, TemplateKind, resolve_amount};

/// Unvalidated invoice line as supplied by the caller.
///
/// `unit_price` is signed so a negative input can be rejected with a
/// `Validation` error instead of being silently reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub description: String,
    pub quantity: u32,
    pub unit_price: i64,
}

/// Everything the caller decides when building an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub template_kind: TemplateKind,
    /// Explicit line items; when `None`, exactly one item is synthesized
    /// from the template's amount rule.
    pub items: Option<Vec<ItemDraft>>,
    /// Amount for `Manual` templates; ignored by the other rules.
    pub manual_amount: Option<i64>,
    /// Overrides the template's default description for the synthesized item.
    pub description: Option<String>,
    pub notes: Option<String>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Builds validated invoices against an injected template catalog.
#[derive(Debug)]
pub struct InvoiceBuilder<'a> {
    catalog: &'a TemplateCatalog,
}

impl<'a> InvoiceBuilder<'a> {
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self { catalog }
    }

    /// Build an invoice.
    ///
    /// Validation failures (unknown template, kind mismatch, malformed items,
    /// inverted dates) return `Validation` before any state exists; the
    /// sequence is only consumed once the request is known to be valid.
    pub fn build(
        &self,
        request: &BuildRequest,
        entity: &BillableEntity,
        sequence: &dyn NumberSequence,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        let template = self
            .catalog
            .find(request.template_kind)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown invoice template: {}",
                    request.template_kind
                ))
            })?;

        if template.target_kind != entity.kind {
            return Err(DomainError::validation(format!(
                "template {} does not bill {:?} clients",
                template.kind, entity.kind
            )));
        }

        if request.due_date < request.issue_date {
            return Err(DomainError::validation(
                "due_date cannot precede issue_date",
            ));
        }

        let items = match &request.items {
            Some(drafts) => {
                if drafts.is_empty() {
                    return Err(DomainError::validation(
                        "an invoice requires at least one item",
                    ));
                }
                drafts
                    .iter()
                    .map(validate_item)
                    .collect::<DomainResult<Vec<_>>>()?
            }
            None => {
                let amount = resolve_amount(template, entity, request.manual_amount)?;
                let description = request
                    .description
                    .clone()
                    .unwrap_or_else(|| template.default_description.clone());
                vec![validate_item(&ItemDraft {
                    description,
                    quantity: 1,
                    unit_price: amount as i64,
                })?]
            }
        };

        let subtotal = sum_line_totals(&items)?;
        let tax_amount = tax_for(subtotal, template.tax_rate_bp)?;
        let total = subtotal
            .checked_add(tax_amount)
            .ok_or_else(|| DomainError::invariant("invoice total overflow"))?;

        // Request is valid from here on; allocate the number last so a
        // rejected build never burns a sequence value.
        let period = BillingPeriod::of(request.issue_date);
        let seq = sequence.next(period)?;
        let number = InvoiceNumber::generate(period, seq);

        let invoice_id = InvoiceId::new(AggregateId::new());
        let created = InvoiceCreated {
            invoice_id,
            number,
            client_id: entity.id,
            client_kind: entity.kind,
            client_snapshot: ClientSnapshot {
                name: entity.display_name.clone(),
                contact: entity.contact.clone(),
            },
            items,
            subtotal,
            tax_rate_bp: template.tax_rate_bp,
            tax_amount,
            total,
            issue_date: request.issue_date,
            due_date: request.due_date,
            initial_status: template.initial_status,
            notes: request.notes.clone(),
            template_kind: template.kind,
            occurred_at: now,
        };

        let mut invoice = Invoice::empty(invoice_id);
        invoice.apply(&InvoiceEvent::InvoiceCreated(created));
        Ok(invoice)
    }
}

fn validate_item(draft: &ItemDraft) -> DomainResult<InvoiceItem> {
    if draft.description.trim().is_empty() {
        return Err(DomainError::validation(
            "item description cannot be empty",
        ));
    }
    if draft.quantity == 0 {
        return Err(DomainError::validation("item quantity must be positive"));
    }
    if draft.unit_price < 0 {
        return Err(DomainError::validation(
            "item unit_price cannot be negative",
        ));
    }

    let unit_price = draft.unit_price as u64;
    let line_total = (draft.quantity as u128)
        .checked_mul(unit_price as u128)
        .and_then(|t| u64::try_from(t).ok())
        .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;

    Ok(InvoiceItem {
        description: draft.description.clone(),
        quantity: draft.quantity,
        unit_price,
        line_total,
    })
}

fn sum_line_totals(items: &[InvoiceItem]) -> DomainResult<u64> {
    let mut subtotal: u64 = 0;
    for item in items {
        subtotal = subtotal
            .checked_add(item.line_total)
            .ok_or_else(|| DomainError::invariant("invoice subtotal overflow"))?;
    }
    Ok(subtotal)
}

/// `round_half_up(subtotal × rate_bp / 10_000)`.
fn tax_for(subtotal: u64, rate_bp: u32) -> DomainResult<u64> {
    let raw = (subtotal as u128) * (rate_bp as u128);
    u64::try_from((raw + 5_000) / 10_000)
        .map_err(|_| DomainError::invariant("invoice tax overflow"))
}
