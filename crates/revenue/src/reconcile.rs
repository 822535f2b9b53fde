use serde::{Deserialize, Serialize};

use vitaerp_core::ValueObject;

/// Revenue channel.
///
/// `direct` is customer sales; `referral` covers partner and associate
/// commerce, matching the shape of the upstream figures being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Direct,
    Referral,
}

impl Channel {
    /// Output order is fixed so breakdowns are comparable across runs.
    pub const ALL: [Channel; 2] = [Channel::Direct, Channel::Referral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Direct => "direct",
            Channel::Referral => "referral",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate figures as reported upstream, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRevenueTotals {
    pub total_revenue: u64,
    pub direct_revenue: u64,
    pub referral_revenue: u64,
}

impl ValueObject for RawRevenueTotals {}

/// One payment-level record (ground truth when available).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub channel: Channel,
    pub amount: u64,
}

/// Corrected, annotated figure for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub channel: Channel,
    pub amount: u64,
    /// Share of total, rounded to one decimal place; `0.0` when the total
    /// is zero.
    pub percentage_of_total: f64,
    /// `true` for measured figures, `false` for estimates produced by the
    /// anomaly correction. Downstream reporting must visually distinguish
    /// the two.
    pub reliable: bool,
}

impl ValueObject for RevenueBreakdown {}

/// Non-fatal warning attached whenever the anomaly correction fired.
///
/// Part of the return value rather than a side channel, so callers cannot
/// drop it silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationWarning {
    pub detail: String,
    pub raw: RawRevenueTotals,
}

impl core::fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Reconciled per-channel revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub breakdown: Vec<RevenueBreakdown>,
    pub warning: Option<ReconciliationWarning>,
}

impl Reconciliation {
    /// Whether every figure in the breakdown was measured.
    pub fn is_reliable(&self) -> bool {
        self.breakdown.iter().all(|b| b.reliable)
    }
}

/// Reconcile upstream revenue figures into a per-channel breakdown.
///
/// Primary path: with at least one payment-level record, group and sum by
/// channel (ground truth) and mark every entry `reliable = true`. An empty
/// record set counts as no records.
///
/// Fallback path: without records, trust the reported split, except for the
/// known upstream defect where `total_revenue > 0` while the per-channel
/// figures are both zero. That case is corrected by attributing the entire
/// total to `direct`, with `reliable = false` and a warning so "estimated"
/// never masquerades as "measured".
///
/// Inputs are never mutated; the same inputs always yield the same result.
pub fn reconcile(raw: &RawRevenueTotals, payments: Option<&[PaymentRecord]>) -> Reconciliation {
    // An empty record set carries no measurements; treat it like no records,
    // otherwise it would claim an all-zero split as reliable.
    if let Some(payments) = payments.filter(|p| !p.is_empty()) {
        let total: u64 = payments.iter().map(|p| p.amount).sum();
        let breakdown = Channel::ALL
            .iter()
            .map(|&channel| {
                let amount: u64 = payments
                    .iter()
                    .filter(|p| p.channel == channel)
                    .map(|p| p.amount)
                    .sum();
                RevenueBreakdown {
                    channel,
                    amount,
                    percentage_of_total: percentage(amount, total),
                    reliable: true,
                }
            })
            .collect();
        return Reconciliation {
            breakdown,
            warning: None,
        };
    }

    let component_sum = raw.direct_revenue.saturating_add(raw.referral_revenue);
    if raw.total_revenue > 0 && component_sum == 0 {
        // Known upstream defect: a non-zero total with an all-zero split.
        // Correction policy: attribute everything to direct, flagged.
        let breakdown = vec![
            RevenueBreakdown {
                channel: Channel::Direct,
                amount: raw.total_revenue,
                percentage_of_total: percentage(raw.total_revenue, raw.total_revenue),
                reliable: false,
            },
            RevenueBreakdown {
                channel: Channel::Referral,
                amount: 0,
                percentage_of_total: 0.0,
                reliable: false,
            },
        ];
        return Reconciliation {
            breakdown,
            warning: Some(ReconciliationWarning {
                detail: format!(
                    "channel split missing for total revenue {}; attributed to direct as an estimate",
                    raw.total_revenue
                ),
                raw: *raw,
            }),
        };
    }

    let breakdown = vec![
        RevenueBreakdown {
            channel: Channel::Direct,
            amount: raw.direct_revenue,
            percentage_of_total: percentage(raw.direct_revenue, raw.total_revenue),
            reliable: true,
        },
        RevenueBreakdown {
            channel: Channel::Referral,
            amount: raw.referral_revenue,
            percentage_of_total: percentage(raw.referral_revenue, raw.total_revenue),
            reliable: true,
        },
    ];
    Reconciliation {
        breakdown,
        warning: None,
    }
}

/// `round(amount / total × 100, 1)`; `0.0` when `total` is zero.
fn percentage(amount: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = amount as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
