//! Billing targets: customers, reseller partners, and commission associates.
//!
//! The back-office bills three different shapes of client. This crate models
//! them as a tagged variant and resolves any of them into one uniform
//! [`BillableEntity`] profile so downstream invoicing logic never branches on
//! client kind.

pub mod client;

pub use client::{
    AssociateRecord, BillableEntity, ClientDirectory, ClientId, ClientKind, ClientRecord,
    ContactInfo, CustomerRecord, PartnerRecord, resolve,
};
