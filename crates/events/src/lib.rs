//! `vitaerp-events`: the event contract shared by domain aggregates.
//!
//! Invoices are never physically deleted and never mutated in place outside
//! their lifecycle operations; every state change is an event, which is what
//! makes the audit trail of a financial record trustworthy.

pub mod event;

pub use event::Event;
