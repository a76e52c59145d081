//! Points Ledger Engine
//!
//! Balance storage, atomic point transfers, and the daily-claim state
//! machine for a social application's integer currency.
//!
//! # Architecture
//!
//! - **Single Writer**: One logical writer task eliminates race conditions
//! - **Whole-record commits**: Claim and transfer mutations land atomically
//! - **Lazy accounts**: Records are created on first touch, never deleted
//!
//! # Invariants
//!
//! - Conservation: transfers move points, they never create or destroy them
//! - Exactly-once claims: one successful claim per cooldown window per user
//! - Monotonic claim count: increments by 1 per claim, never resets

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod claim;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerStats};
pub use storage::Storage;
pub use types::{Balance, ClaimOutcome, ClaimParams, TransferOutcome, UserId, UserRecord};
