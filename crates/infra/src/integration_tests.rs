//! End-to-end tests over the full stack: directory, catalog, builder,
//! lifecycle, repository, stats, reconciliation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};

use vitaerp_clients::{
    AssociateRecord, ClientId, ClientKind, ClientRecord, ContactInfo, CustomerRecord,
    PartnerRecord,
};
use vitaerp_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, ExpectedVersion, FixedClock,
};
use vitaerp_invoicing::{
    Invoice, InvoiceCommand, InvoiceId, InvoiceStatus, ItemDraft, PaymentMethod, RecordPayment,
    TemplateKind, default_catalog,
};
use vitaerp_reporting::{InvoiceFilter, StatusFilter};
use vitaerp_revenue::RawRevenueTotals;

use crate::directory::InMemoryClientDirectory;
use crate::sequence::InMemoryNumberSequence;
use crate::service::{BillingService, CreateInvoiceRequest};
use crate::store::{InMemoryInvoiceRepository, InvoiceRepository};

type TestService =
    BillingService<InMemoryInvoiceRepository, InMemoryNumberSequence, InMemoryClientDirectory, FixedClock>;

fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 15, 10, 0, 0).unwrap()
}

fn contact() -> ContactInfo {
    ContactInfo {
        email: Some("billing@example.com".into()),
        phone: None,
    }
}

fn seeded_service() -> (TestService, ClientId, ClientId, ClientId) {
    vitaerp_observability::init();

    let directory = InMemoryClientDirectory::new();

    let customer_id = ClientId::new(AggregateId::new());
    directory.insert(ClientRecord::Customer(CustomerRecord {
        id: customer_id,
        name: "Jana Novak".into(),
        contact: contact(),
    }));

    let partner_id = ClientId::new(AggregateId::new());
    directory.insert(ClientRecord::Partner(PartnerRecord {
        id: partner_id,
        company_name: "CareerBoost s.r.o.".into(),
        contact: contact(),
        debt: 120_000,
    }));

    let associate_id = ClientId::new(AggregateId::new());
    directory.insert(ClientRecord::Associate(AssociateRecord {
        id: associate_id,
        name: "Milan Horak".into(),
        contact: contact(),
        commission_due: 30_000,
        available_balance: 18_000,
    }));

    let service = BillingService::new(
        InMemoryInvoiceRepository::new(),
        InMemoryNumberSequence::new(),
        directory,
        FixedClock(test_now()),
        default_catalog(),
    );
    (service, customer_id, partner_id, associate_id)
}

fn standard_request(customer_id: ClientId) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        client_kind: ClientKind::Customer,
        client_id: customer_id,
        template_kind: TemplateKind::CvPackageStandard,
        items: None,
        manual_amount: None,
        description: None,
        notes: None,
        issue_date: test_now(),
        due_date: test_now() + chrono::Duration::days(14),
    }
}

#[test]
fn create_persist_reload_round_trip() {
    let (service, customer_id, _, _) = seeded_service();

    let created = service.create_invoice(standard_request(customer_id)).unwrap();
    let reloaded = service.get(created.id_typed()).unwrap();

    assert_eq!(created, reloaded);
    assert_eq!(reloaded.status(), InvoiceStatus::Draft);
    assert_eq!(reloaded.subtotal(), 45_000);
    assert_eq!(reloaded.tax_amount(), 8_550);
    assert_eq!(reloaded.total(), 53_550);
    assert_eq!(reloaded.client_snapshot().unwrap().name, "Jana Novak");
    assert_eq!(reloaded.number().unwrap().as_str(), "INV-202608-0001");

    let by_number = service.get_by_number("INV-202608-0001").unwrap();
    assert_eq!(by_number.id_typed(), created.id_typed());
}

#[test]
fn balance_templates_pull_amounts_from_the_directory() {
    let (service, _, partner_id, associate_id) = seeded_service();

    let settlement = service
        .create_invoice(CreateInvoiceRequest {
            client_kind: ClientKind::Partner,
            client_id: partner_id,
            template_kind: TemplateKind::PartnerDebtSettlement,
            items: None,
            manual_amount: None,
            description: None,
            notes: None,
            issue_date: test_now(),
            due_date: test_now() + chrono::Duration::days(30),
        })
        .unwrap();
    assert_eq!(settlement.subtotal(), 120_000);
    assert_eq!(settlement.tax_amount(), 0);
    assert_eq!(settlement.status(), InvoiceStatus::Pending);

    let payout = service
        .create_invoice(CreateInvoiceRequest {
            client_kind: ClientKind::Associate,
            client_id: associate_id,
            template_kind: TemplateKind::AssociateCommissionPayout,
            items: None,
            manual_amount: None,
            description: None,
            notes: None,
            issue_date: test_now(),
            due_date: test_now() + chrono::Duration::days(30),
        })
        .unwrap();
    assert_eq!(payout.subtotal(), 30_000);
}

#[test]
fn full_lifecycle_draft_sent_paid() {
    let (service, customer_id, _, _) = seeded_service();
    let invoice = service.create_invoice(standard_request(customer_id)).unwrap();
    let id = invoice.id_typed();

    let sent = service.send_invoice(id).unwrap();
    assert_eq!(sent.status(), InvoiceStatus::Pending);

    let paid = service
        .record_payment(id, test_now() + chrono::Duration::days(3), PaymentMethod::BankTransfer)
        .unwrap();
    assert_eq!(paid.status(), InvoiceStatus::Paid);
    assert_eq!(paid.payment_method(), Some(PaymentMethod::BankTransfer));

    // Terminal state sticks in the repository too.
    assert_eq!(service.get(id).unwrap().status(), InvoiceStatus::Paid);
}

#[test]
fn double_payment_is_rejected_and_state_is_unchanged() {
    let (service, customer_id, _, _) = seeded_service();
    let invoice = service.create_invoice(standard_request(customer_id)).unwrap();
    let id = invoice.id_typed();

    service.send_invoice(id).unwrap();
    let paid = service
        .record_payment(id, test_now(), PaymentMethod::Card)
        .unwrap();

    let err = service
        .record_payment(id, test_now() + chrono::Duration::days(1), PaymentMethod::Cash)
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));

    let stored = service.get(id).unwrap();
    assert_eq!(stored, paid);
    assert_eq!(stored.payment_method(), Some(PaymentMethod::Card));
}

#[test]
fn cancellation_allowed_from_pending_but_not_paid() {
    let (service, customer_id, _, _) = seeded_service();

    let a = service.create_invoice(standard_request(customer_id)).unwrap();
    service.send_invoice(a.id_typed()).unwrap();
    let cancelled = service
        .cancel_invoice(a.id_typed(), Some("client withdrew the order".into()))
        .unwrap();
    assert_eq!(cancelled.status(), InvoiceStatus::Cancelled);

    let b = service.create_invoice(standard_request(customer_id)).unwrap();
    service.send_invoice(b.id_typed()).unwrap();
    service
        .record_payment(b.id_typed(), test_now(), PaymentMethod::Cash)
        .unwrap();
    let err = service.cancel_invoice(b.id_typed(), None).unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

#[test]
fn notes_stay_amendable_after_terminal_status() {
    let (service, customer_id, _, _) = seeded_service();
    let invoice = service.create_invoice(standard_request(customer_id)).unwrap();
    let id = invoice.id_typed();

    service.send_invoice(id).unwrap();
    service.record_payment(id, test_now(), PaymentMethod::Card).unwrap();

    let amended = service.amend_notes(id, Some("settled in person".into())).unwrap();
    assert_eq!(amended.notes(), Some("settled in person"));
    assert_eq!(amended.status(), InvoiceStatus::Paid);
}

#[test]
fn concurrent_creates_get_unique_invoice_numbers() {
    let (service, customer_id, _, _) = seeded_service();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                (0..10)
                    .map(|_| {
                        let invoice =
                            service.create_invoice(standard_request(customer_id)).unwrap();
                        invoice.number().unwrap().as_str().to_owned()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut numbers: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 80);
}

#[test]
fn stats_and_overdue_listing_agree() {
    let (service, customer_id, _, _) = seeded_service();

    // One draft, one pending due in the future, one pending past due,
    // one paid.
    service.create_invoice(standard_request(customer_id)).unwrap();

    let pending = service.create_invoice(standard_request(customer_id)).unwrap();
    service.send_invoice(pending.id_typed()).unwrap();

    let mut overdue_request = standard_request(customer_id);
    overdue_request.issue_date = test_now() - chrono::Duration::days(30);
    overdue_request.due_date = test_now() - chrono::Duration::days(10);
    let overdue = service.create_invoice(overdue_request).unwrap();
    service.send_invoice(overdue.id_typed()).unwrap();

    let paid = service.create_invoice(standard_request(customer_id)).unwrap();
    service.send_invoice(paid.id_typed()).unwrap();
    service
        .record_payment(paid.id_typed(), test_now(), PaymentMethod::BankTransfer)
        .unwrap();

    let stats = service.stats();
    assert_eq!(stats.total_invoices, 4);
    assert_eq!(stats.total_amount, 4 * 53_550);
    assert_eq!(stats.paid_invoices, 1);
    assert_eq!(stats.paid_amount, 53_550);
    // Pending counts the overdue one as well.
    assert_eq!(stats.pending_invoices, 2);
    assert_eq!(stats.pending_amount, 2 * 53_550);
    assert_eq!(stats.overdue_invoices, 1);
    assert_eq!(stats.overdue_amount, 53_550);

    let listed = service.list(&InvoiceFilter {
        status: Some(StatusFilter::Overdue),
        ..InvoiceFilter::default()
    });
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id_typed(), overdue.id_typed());
}

#[test]
fn listing_filters_by_search_and_kind() {
    let (service, customer_id, partner_id, _) = seeded_service();

    service.create_invoice(standard_request(customer_id)).unwrap();
    service
        .create_invoice(CreateInvoiceRequest {
            client_kind: ClientKind::Partner,
            client_id: partner_id,
            template_kind: TemplateKind::PartnerDebtSettlement,
            items: None,
            manual_amount: None,
            description: None,
            notes: Some("quarterly settlement".into()),
            issue_date: test_now(),
            due_date: test_now() + chrono::Duration::days(30),
        })
        .unwrap();

    let partners = service.list(&InvoiceFilter {
        client_kind: Some(ClientKind::Partner),
        ..InvoiceFilter::default()
    });
    assert_eq!(partners.len(), 1);

    let searched = service.list(&InvoiceFilter {
        search: Some("QUARTERLY".into()),
        ..InvoiceFilter::default()
    });
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].client_kind(), ClientKind::Partner);
}

#[test]
fn manual_template_with_explicit_items() {
    let (service, customer_id, _, _) = seeded_service();

    let invoice = service
        .create_invoice(CreateInvoiceRequest {
            client_kind: ClientKind::Customer,
            client_id: customer_id,
            template_kind: TemplateKind::CustomService,
            items: Some(vec![
                ItemDraft {
                    description: "LinkedIn profile rewrite".into(),
                    quantity: 1,
                    unit_price: 20_000,
                },
                ItemDraft {
                    description: "Cover letter".into(),
                    quantity: 2,
                    unit_price: 5_000,
                },
            ]),
            manual_amount: None,
            description: None,
            notes: None,
            issue_date: test_now(),
            due_date: test_now() + chrono::Duration::days(14),
        })
        .unwrap();

    assert_eq!(invoice.items().len(), 2);
    assert_eq!(invoice.subtotal(), 30_000);
    assert_eq!(invoice.tax_amount(), 5_700);
}

#[test]
fn unknown_client_fails_without_consuming_a_number() {
    let (service, customer_id, _, _) = seeded_service();

    let err = service
        .create_invoice(CreateInvoiceRequest {
            client_id: ClientId::new(AggregateId::new()),
            ..standard_request(customer_id)
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound));

    let first = service.create_invoice(standard_request(customer_id)).unwrap();
    assert_eq!(first.number().unwrap().as_str(), "INV-202608-0001");
}

/// Repository that loses exactly one race: the first `update` is preempted
/// by a competing payment committed in between, then fails the version check.
struct ContendedRepository {
    inner: InMemoryInvoiceRepository,
    raced: AtomicBool,
}

impl ContendedRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryInvoiceRepository::new(),
            raced: AtomicBool::new(false),
        }
    }

    fn commit_competing_payment(&self, id: InvoiceId) {
        let mut winner = self.inner.get(id).unwrap();
        let version = winner.version();
        let events = winner
            .handle(&InvoiceCommand::RecordPayment(RecordPayment {
                invoice_id: id,
                payment_date: test_now(),
                method: PaymentMethod::Cash,
                occurred_at: test_now(),
            }))
            .unwrap();
        for event in &events {
            winner.apply(event);
        }
        self.inner
            .update(winner, ExpectedVersion::Exact(version))
            .unwrap();
    }
}

impl InvoiceRepository for ContendedRepository {
    fn create(&self, invoice: Invoice) -> DomainResult<()> {
        self.inner.create(invoice)
    }

    fn update(&self, invoice: Invoice, expected: ExpectedVersion) -> DomainResult<()> {
        // Contend only with payment commits; other transitions go through.
        if invoice.status() == InvoiceStatus::Paid && !self.raced.swap(true, Ordering::SeqCst) {
            self.commit_competing_payment(invoice.id_typed());
        }
        self.inner.update(invoice, expected)
    }

    fn get(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.inner.get(id)
    }

    fn get_by_number(&self, number: &str) -> DomainResult<Invoice> {
        self.inner.get_by_number(number)
    }

    fn list(&self, filter: &InvoiceFilter, now: DateTime<Utc>) -> Vec<Invoice> {
        self.inner.list(filter, now)
    }

    fn list_all(&self) -> Vec<Invoice> {
        self.inner.list_all()
    }
}

#[test]
fn losing_a_payment_race_observes_paid_not_a_version_conflict() {
    let directory = InMemoryClientDirectory::new();
    let customer_id = ClientId::new(AggregateId::new());
    directory.insert(ClientRecord::Customer(CustomerRecord {
        id: customer_id,
        name: "Jana Novak".into(),
        contact: contact(),
    }));
    let service = BillingService::new(
        ContendedRepository::new(),
        InMemoryNumberSequence::new(),
        directory,
        FixedClock(test_now()),
        default_catalog(),
    );

    let invoice = service.create_invoice(standard_request(customer_id)).unwrap();
    let id = invoice.id_typed();
    service.send_invoice(id).unwrap();

    // The competing payment wins mid-update; the loser must get the
    // lifecycle error, not the raw conflict.
    let err = service
        .record_payment(id, test_now(), PaymentMethod::BankTransfer)
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));

    let stored = service.get(id).unwrap();
    assert_eq!(stored.status(), InvoiceStatus::Paid);
    assert_eq!(stored.payment_method(), Some(PaymentMethod::Cash));
}

#[test]
fn reconcile_revenue_surfaces_the_correction_warning() {
    let (service, _, _, _) = seeded_service();

    let clean = service.reconcile_revenue(
        &RawRevenueTotals {
            total_revenue: 1_000,
            direct_revenue: 600,
            referral_revenue: 400,
        },
        None,
    );
    assert!(clean.is_reliable());
    assert!(clean.warning.is_none());

    let corrected = service.reconcile_revenue(
        &RawRevenueTotals {
            total_revenue: 1_000,
            direct_revenue: 0,
            referral_revenue: 0,
        },
        None,
    );
    assert!(!corrected.is_reliable());
    assert!(corrected.warning.is_some());
    assert_eq!(corrected.breakdown[0].amount, 1_000);
}

#[test]
fn export_view_mirrors_the_stored_invoice() {
    let (service, customer_id, _, _) = seeded_service();
    let invoice = service.create_invoice(standard_request(customer_id)).unwrap();

    let view = service.export_view(invoice.id_typed()).unwrap();
    assert_eq!(view.header.invoice_number, "INV-202608-0001");
    assert_eq!(view.totals.total, 53_550);
    assert_eq!(view.client_block.name, "Jana Novak");
    assert_eq!(view.items.len(), 1);
}
