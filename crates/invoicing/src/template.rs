//! Invoice template catalog.
//!
//! Templates are plain configuration data injected into the builder (and into
//! tests), never read from a hidden global. Each template pins down four
//! policies at once: which client kind it bills, how the amount is derived,
//! which tax rate applies, and which status a fresh invoice starts in.

use serde::{Deserialize, Serialize};

use vitaerp_clients::{BillableEntity, ClientKind};
use vitaerp_core::{DomainError, DomainResult};

use crate::invoice::InvoiceStatus;

/// Template kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Standard CV package sold to a direct customer.
    CvPackageStandard,
    /// Custom work for a direct customer, priced per engagement.
    CustomService,
    /// Settlement invoice formalizing a partner's accumulated debt.
    PartnerDebtSettlement,
    /// Settlement invoice formalizing an associate's commission payout.
    AssociateCommissionPayout,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::CvPackageStandard => "cv_package_standard",
            TemplateKind::CustomService => "custom_service",
            TemplateKind::PartnerDebtSettlement => "partner_debt_settlement",
            TemplateKind::AssociateCommissionPayout => "associate_commission_payout",
        }
    }
}

impl core::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the invoiced amount is derived for a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountRule {
    /// A configured constant, in whole currency units.
    Fixed(u64),
    /// The resolved client's `outstanding_balance` (settlement invoices).
    FromEntityBalance,
    /// A caller-supplied amount, validated at build time.
    Manual,
}

/// One invoice template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTemplate {
    pub kind: TemplateKind,
    pub target_kind: ClientKind,
    pub default_description: String,
    pub amount_rule: AmountRule,
    /// Tax rate in basis points (1900 = 19%).
    pub tax_rate_bp: u32,
    /// Status a freshly built invoice starts in.
    pub initial_status: InvoiceStatus,
}

/// Ordered set of templates, passed in as configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCatalog {
    templates: Vec<InvoiceTemplate>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<InvoiceTemplate>) -> Self {
        Self { templates }
    }

    /// Templates in declaration order.
    pub fn list(&self) -> &[InvoiceTemplate] {
        &self.templates
    }

    pub fn find(&self, kind: TemplateKind) -> Option<&InvoiceTemplate> {
        self.templates.iter().find(|t| t.kind == kind)
    }
}

/// The production catalog.
///
/// Tax and initial-status policy, per template:
///
/// | template                      | target    | amount rule         | tax | initial   |
/// |-------------------------------|-----------|---------------------|-----|-----------|
/// | `cv_package_standard`         | customer  | fixed 45 000        | 19% | `draft`   |
/// | `custom_service`              | customer  | manual              | 19% | `draft`   |
/// | `partner_debt_settlement`     | partner   | from entity balance | 0%  | `pending` |
/// | `associate_commission_payout` | associate | from entity balance | 0%  | `pending` |
///
/// Customer-facing sales carry 19% VAT and start as editable drafts.
/// Settlement invoices formalize an already-existing balance: tax-free and
/// sent immediately, so they start `pending`.
pub fn default_catalog() -> TemplateCatalog {
    TemplateCatalog::new(vec![
        InvoiceTemplate {
            kind: TemplateKind::CvPackageStandard,
            target_kind: ClientKind::Customer,
            default_description: "Professional CV package".to_string(),
            amount_rule: AmountRule::Fixed(45_000),
            tax_rate_bp: 1_900,
            initial_status: InvoiceStatus::Draft,
        },
        InvoiceTemplate {
            kind: TemplateKind::CustomService,
            target_kind: ClientKind::Customer,
            default_description: "Custom CV service".to_string(),
            amount_rule: AmountRule::Manual,
            tax_rate_bp: 1_900,
            initial_status: InvoiceStatus::Draft,
        },
        InvoiceTemplate {
            kind: TemplateKind::PartnerDebtSettlement,
            target_kind: ClientKind::Partner,
            default_description: "Settlement of outstanding partner balance".to_string(),
            amount_rule: AmountRule::FromEntityBalance,
            tax_rate_bp: 0,
            initial_status: InvoiceStatus::Pending,
        },
        InvoiceTemplate {
            kind: TemplateKind::AssociateCommissionPayout,
            target_kind: ClientKind::Associate,
            default_description: "Commission payout settlement".to_string(),
            amount_rule: AmountRule::FromEntityBalance,
            tax_rate_bp: 0,
            initial_status: InvoiceStatus::Pending,
        },
    ])
}

/// Derive the invoiced amount for a template/entity pair.
///
/// `Manual` requires a non-negative caller-supplied amount; the other rules
/// ignore `manual_amount` entirely.
pub fn resolve_amount(
    template: &InvoiceTemplate,
    entity: &BillableEntity,
    manual_amount: Option<i64>,
) -> DomainResult<u64> {
    match template.amount_rule {
        AmountRule::Fixed(amount) => Ok(amount),
        AmountRule::FromEntityBalance => Ok(entity.outstanding_balance),
        AmountRule::Manual => match manual_amount {
            None => Err(DomainError::validation(
                "manual amount is required for this template",
            )),
            Some(a) if a < 0 => Err(DomainError::validation("manual amount cannot be negative")),
            Some(a) => Ok(a as u64),
        },
    }
}
