//! Invoice numbering.
//!
//! Numbers follow `INV-{year}{month}-{sequence}` with a durable, per-period
//! counter behind the persistence collaborator. Allocation must be serialized
//! by the implementation so concurrent builds can never collide (the
//! predecessor system's random 3-digit suffix is explicitly rejected).

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use vitaerp_core::DomainResult;

/// Year + month bucket a sequence counter is scoped to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn of(date: DateTime<Utc>) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Durable, collision-free sequence collaborator.
///
/// `next` must be serialized (single writer or equivalent locking) and must
/// never hand out the same value twice for a period, across restarts.
pub trait NumberSequence: Send + Sync {
    fn next(&self, period: BillingPeriod) -> DomainResult<u64>;
}

/// Globally unique invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Format a number for a period/sequence pair.
    pub fn generate(period: BillingPeriod, sequence: u64) -> Self {
        Self(format!(
            "INV-{:04}{:02}-{:04}",
            period.year, period.month, sequence
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generates_period_prefixed_number() {
        let date = Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).unwrap();
        let number = InvoiceNumber::generate(BillingPeriod::of(date), 7);
        assert_eq!(number.as_str(), "INV-202608-0007");
    }

    #[test]
    fn sequence_beyond_four_digits_keeps_growing() {
        let period = BillingPeriod { year: 2026, month: 1 };
        let number = InvoiceNumber::generate(period, 12_345);
        assert_eq!(number.as_str(), "INV-202601-12345");
    }

    #[test]
    fn period_of_extracts_year_and_month() {
        let date = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            BillingPeriod::of(date),
            BillingPeriod {
                year: 2025,
                month: 12
            }
        );
    }
}
