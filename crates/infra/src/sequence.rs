//! Serialized invoice-number sequence.

use std::collections::HashMap;
use std::sync::Mutex;

use vitaerp_core::{DomainError, DomainResult};
use vitaerp_invoicing::{BillingPeriod, NumberSequence};

/// In-memory per-period counter.
///
/// The mutex serializes allocation, so two concurrent builds can never get
/// the same value. Durability across restarts is the job of a real
/// database-backed sequence; the contract is otherwise identical.
#[derive(Debug, Default)]
pub struct InMemoryNumberSequence {
    counters: Mutex<HashMap<BillingPeriod, u64>>,
}

impl InMemoryNumberSequence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NumberSequence for InMemoryNumberSequence {
    fn next(&self, period: BillingPeriod) -> DomainResult<u64> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| DomainError::conflict("number sequence lock poisoned"))?;
        let counter = counters.entry(period).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
