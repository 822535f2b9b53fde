use serde::{Deserialize, Serialize};

use vitaerp_core::{AggregateId, DomainError, DomainResult, Entity, ValueObject};

/// Client identifier (shared across the three client kinds).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub AggregateId);

impl ClientId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Client kind: the three revenue channels the business sells through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Customer,
    Partner,
    Associate,
}

/// Contact information for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ValueObject for ContactInfo {}

/// Direct customer: buys CV packages, carries no running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: ClientId,
    pub name: String,
    pub contact: ContactInfo,
}

/// Reseller partner: accumulates debt for CVs sold on account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub id: ClientId,
    pub company_name: String,
    pub contact: ContactInfo,
    /// What the partner currently owes, in whole currency units.
    pub debt: u64,
}

/// Commission associate: earns a commission balance payable by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateRecord {
    pub id: ClientId,
    pub name: String,
    pub contact: ContactInfo,
    /// Commission earned and not yet settled, in whole currency units.
    pub commission_due: u64,
    /// Portion of the commission already cleared for withdrawal.
    pub available_balance: u64,
}

/// Raw client record as stored by the upstream directory.
///
/// Tagged variant rather than one struct with many optional fields: the three
/// shapes diverge too much (partners have `debt`, associates have commission
/// balances, customers have neither) to share a flat schema safely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClientRecord {
    Customer(CustomerRecord),
    Partner(PartnerRecord),
    Associate(AssociateRecord),
}

impl ClientRecord {
    pub fn kind(&self) -> ClientKind {
        match self {
            ClientRecord::Customer(_) => ClientKind::Customer,
            ClientRecord::Partner(_) => ClientKind::Partner,
            ClientRecord::Associate(_) => ClientKind::Associate,
        }
    }

    pub fn id(&self) -> ClientId {
        match self {
            ClientRecord::Customer(c) => c.id,
            ClientRecord::Partner(p) => p.id,
            ClientRecord::Associate(a) => a.id,
        }
    }
}

/// Uniform billing profile resolved from any client kind.
///
/// `outstanding_balance` is the partner's debt, the associate's commission
/// due, or 0 for a customer. Downstream logic (amount derivation, invoice
/// snapshots) works only with this profile and never pattern-matches on
/// [`ClientRecord`] again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillableEntity {
    pub id: ClientId,
    pub kind: ClientKind,
    pub display_name: String,
    pub contact: ContactInfo,
    /// Whole currency units.
    pub outstanding_balance: u64,
}

impl Entity for BillableEntity {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl From<&ClientRecord> for BillableEntity {
    fn from(record: &ClientRecord) -> Self {
        match record {
            ClientRecord::Customer(c) => BillableEntity {
                id: c.id,
                kind: ClientKind::Customer,
                display_name: c.name.clone(),
                contact: c.contact.clone(),
                outstanding_balance: 0,
            },
            ClientRecord::Partner(p) => BillableEntity {
                id: p.id,
                kind: ClientKind::Partner,
                display_name: p.company_name.clone(),
                contact: p.contact.clone(),
                outstanding_balance: p.debt,
            },
            ClientRecord::Associate(a) => BillableEntity {
                id: a.id,
                kind: ClientKind::Associate,
                display_name: a.name.clone(),
                contact: a.contact.clone(),
                outstanding_balance: a.commission_due,
            },
        }
    }
}

/// Read-only client data source (the upstream directory).
pub trait ClientDirectory: Send + Sync {
    /// Fetch the raw record for `id` **of that kind**, or `None` on miss.
    fn fetch(&self, kind: ClientKind, id: ClientId) -> Option<ClientRecord>;
}

/// Resolve a billing target into its uniform profile.
///
/// Fails `NotFound` when the id does not exist for that kind; a record whose
/// stored kind disagrees with the requested kind is treated the same way.
/// Pure read, no side effects.
pub fn resolve(
    directory: &dyn ClientDirectory,
    kind: ClientKind,
    id: ClientId,
) -> DomainResult<BillableEntity> {
    let record = directory.fetch(kind, id).ok_or(DomainError::NotFound)?;
    if record.kind() != kind || record.id() != id {
        return Err(DomainError::NotFound);
    }
    Ok(BillableEntity::from(&record))
}
