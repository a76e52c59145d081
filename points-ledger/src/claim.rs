//! Daily-claim state machine
//!
//! Pure decision logic over a user record: eligibility against the
//! cooldown window and the compounding bonus computation. No I/O here;
//! the writer actor applies the resulting mutation atomically.

use crate::types::{ClaimParams, UserRecord};
use chrono::{DateTime, Utc};

/// Decision produced by evaluating a claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimDecision {
    /// Cooldown elapsed (or never claimed); grant this bonus
    Eligible {
        /// Bonus computed from the pre-increment claim count
        bonus: i64,
    },

    /// Cooldown still running
    OnCooldown {
        /// Strictly positive seconds until eligibility
        seconds_remaining: i64,
    },
}

/// Compounding bonus for a claim at the given (pre-increment) count
///
/// `round(daily_amount * (1 + interest_rate) ^ claim_count)`, so the
/// first-ever claim pays exactly `daily_amount`.
pub fn compounded_bonus(daily_amount: i64, interest_rate: f64, claim_count: u64) -> i64 {
    let multiplier = (1.0 + interest_rate).powf(claim_count as f64);
    (daily_amount as f64 * multiplier).round() as i64
}

/// Evaluate a claim attempt against the cooldown window
///
/// A never-claimed record is always eligible regardless of `now`.
pub fn evaluate(record: &UserRecord, params: &ClaimParams, now: DateTime<Utc>) -> ClaimDecision {
    if let Some(last_claim) = record.last_claim {
        let elapsed = (now - last_claim).num_seconds();
        let seconds_remaining = params.cooldown_seconds - elapsed;
        if seconds_remaining > 0 {
            return ClaimDecision::OnCooldown { seconds_remaining };
        }
    }

    ClaimDecision::Eligible {
        bonus: compounded_bonus(params.daily_amount, params.interest_rate, record.claim_count),
    }
}
