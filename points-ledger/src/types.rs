//! Core types for the points ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (integer points, no floats in balances)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier (platform account id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Create new user ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get as raw u64
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Big-endian key bytes for storage ordering
    pub fn key_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Persisted ledger record, one per user
///
/// Records are created lazily on first touch and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User this record belongs to
    pub user_id: UserId,

    /// Signed point balance
    ///
    /// Non-negative in normal operation. Transfers enforce the floor;
    /// `adjust_points` deliberately does not (privileged callers may
    /// drive a balance negative).
    pub points: i64,

    /// Lifetime count of successful daily claims
    ///
    /// Only ever increments, by exactly 1 per successful claim. It is
    /// a total-claims counter, not a consecutive streak: a missed day
    /// does not reset it. Callers typically render it as a streak.
    pub claim_count: u64,

    /// Timestamp of the most recent successful claim
    ///
    /// `None` means never claimed, which makes the first claim always
    /// eligible. Monotonically non-decreasing per user.
    pub last_claim: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Fresh zero record for a first-touched user
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            claim_count: 0,
            last_claim: None,
        }
    }
}

/// Balance snapshot returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Current point balance
    pub points: i64,

    /// Lifetime successful claim count
    pub claim_count: u64,
}

/// Parameters of the daily-claim reward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaimParams {
    /// Base reward for a claim at count zero
    pub daily_amount: i64,

    /// Per-claim compounding rate (0.005 = 0.5%)
    pub interest_rate: f64,

    /// Minimum seconds between two successful claims
    pub cooldown_seconds: i64,
}

impl Default for ClaimParams {
    fn default() -> Self {
        Self {
            daily_amount: 500,
            interest_rate: 0.005, // 0.5%
            cooldown_seconds: 8 * 60 * 60, // 8 hours
        }
    }
}

/// Outcome of a transfer attempt
///
/// Insufficient funds is a normal outcome carrying data, not an error;
/// hard failures surface as `Err(Error::Storage(..))` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Debit and credit committed atomically
    Completed {
        /// Sender balance after the debit
        src_balance: i64,
        /// Receiver balance after the credit
        dst_balance: i64,
    },

    /// Sender balance was below the requested amount; nothing mutated
    InsufficientFunds {
        /// Sender balance at the time of the check
        available: i64,
    },
}

/// Outcome of a daily-claim attempt
///
/// A cooldown denial is a normal outcome, distinguishable from both a
/// successful claim and a storage failure (`Err`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Reward granted and record updated atomically
    Claimed {
        /// Points granted by this claim
        bonus: i64,
        /// Balance after the grant
        new_balance: i64,
        /// Claim count before this claim (caller renders count + 1)
        streak: u64,
    },

    /// Cooldown window has not elapsed; nothing mutated
    OnCooldown {
        /// Seconds until the next claim becomes eligible (always > 0)
        seconds_remaining: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_key_bytes_ordering() {
        let a = UserId::new(1);
        let b = UserId::new(256);
        assert!(a.key_bytes() < b.key_bytes());
    }

    #[test]
    fn test_new_record_is_zeroed() {
        let record = UserRecord::new(UserId::new(42));
        assert_eq!(record.points, 0);
        assert_eq!(record.claim_count, 0);
        assert!(record.last_claim.is_none());
    }

    #[test]
    fn test_record_roundtrip_bincode() {
        let record = UserRecord {
            user_id: UserId::new(7),
            points: 1234,
            claim_count: 9,
            last_claim: Some(Utc::now()),
        };

        let bytes = bincode::serialize(&record).unwrap();
        let decoded: UserRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_default_claim_params() {
        let params = ClaimParams::default();
        assert_eq!(params.daily_amount, 500);
        assert_eq!(params.cooldown_seconds, 28_800);
    }
}
