//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one logical writer task owns every mutation, so each check-then-mutate
//! sequence (sufficiency check + debit, cooldown check + claim, idempotent
//! account creation) runs as an atomic critical section with no row locks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              Command layer (chat platform)            │
//! │           Many concurrent command handlers            │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ async calls
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │      read record → decide → write record/batch       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//!              Storage (atomic RocksDB writes)
//! ```

use crate::claim::{self, ClaimDecision};
use crate::types::{Balance, ClaimOutcome, ClaimParams, TransferOutcome, UserId, UserRecord};
use crate::{Error, Result, Storage};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Create a zero record if the user has never been touched
    EnsureAccount {
        user_id: UserId,
        response: oneshot::Sender<Result<()>>,
    },

    /// Read balance and claim count (creates the record on first touch)
    GetBalance {
        user_id: UserId,
        response: oneshot::Sender<Result<Balance>>,
    },

    /// Unconditional mint/reduce
    AdjustPoints {
        user_id: UserId,
        amount: i64,
        response: oneshot::Sender<Result<i64>>,
    },

    /// Conserved transfer between two users
    Transfer {
        src: UserId,
        dst: UserId,
        amount: i64,
        response: oneshot::Sender<Result<TransferOutcome>>,
    },

    /// Daily-claim attempt
    ClaimDaily {
        user_id: UserId,
        params: ClaimParams,
        response: oneshot::Sender<Result<ClaimOutcome>>,
    },

    /// Shutdown actor; acked once the storage handle is released
    Shutdown {
        response: oneshot::Sender<()>,
    },
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut shutdown_ack = None;

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown { response } => {
                    shutdown_ack = Some(response);
                    break;
                }
                _ => {
                    if let Err(e) = self.handle_message(msg) {
                        tracing::error!("Error handling message: {}", e);
                    }
                }
            }
        }

        // Release the storage handle before acking so a caller awaiting
        // shutdown can immediately reopen the database
        drop(self.storage);
        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }
    }

    /// Handle a single message
    ///
    /// Storage failures are sent back through the response channel so the
    /// caller can tell a hard failure from a business-rule denial.
    fn handle_message(&mut self, msg: LedgerMessage) -> Result<()> {
        match msg {
            LedgerMessage::EnsureAccount { user_id, response } => {
                let result = self.ensure_account(user_id).map(|_| ());
                let _ = response.send(result);
            }

            LedgerMessage::GetBalance { user_id, response } => {
                let result = self.ensure_account(user_id).map(|record| Balance {
                    points: record.points,
                    claim_count: record.claim_count,
                });
                let _ = response.send(result);
            }

            LedgerMessage::AdjustPoints {
                user_id,
                amount,
                response,
            } => {
                let result = self.adjust_points(user_id, amount);
                let _ = response.send(result);
            }

            LedgerMessage::Transfer {
                src,
                dst,
                amount,
                response,
            } => {
                let result = self.transfer(src, dst, amount);
                let _ = response.send(result);
            }

            LedgerMessage::ClaimDaily {
                user_id,
                params,
                response,
            } => {
                let result = self.claim_daily(user_id, params);
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown { .. } => {
                // Handled in main loop
            }
        }

        Ok(())
    }

    /// Idempotent upsert: existing record wins, first touch writes zeros
    fn ensure_account(&self, user_id: UserId) -> Result<UserRecord> {
        if let Some(record) = self.storage.get_account(user_id)? {
            return Ok(record);
        }

        let record = UserRecord::new(user_id);
        self.storage.put_account(&record)?;

        tracing::debug!(user_id = %user_id, "Account created on first touch");

        Ok(record)
    }

    fn adjust_points(&self, user_id: UserId, amount: i64) -> Result<i64> {
        let mut record = self.ensure_account(user_id)?;

        // No floor check: this is the privileged mint/reduce path and may
        // drive the balance negative. Transfers enforce the floor.
        record.points += amount;
        self.storage.put_account(&record)?;

        Ok(record.points)
    }

    fn transfer(&self, src: UserId, dst: UserId, amount: i64) -> Result<TransferOutcome> {
        let mut src_record = self.ensure_account(src)?;
        let mut dst_record = self.ensure_account(dst)?;

        if src_record.points < amount {
            return Ok(TransferOutcome::InsufficientFunds {
                available: src_record.points,
            });
        }

        src_record.points -= amount;
        dst_record.points += amount;

        // Both sides in one batch: commit together or not at all
        self.storage.put_accounts_atomic(&src_record, &dst_record)?;

        tracing::debug!(
            src = %src,
            dst = %dst,
            amount,
            "Transfer committed"
        );

        Ok(TransferOutcome::Completed {
            src_balance: src_record.points,
            dst_balance: dst_record.points,
        })
    }

    fn claim_daily(&self, user_id: UserId, params: ClaimParams) -> Result<ClaimOutcome> {
        let mut record = self.ensure_account(user_id)?;
        let now = Utc::now();

        match claim::evaluate(&record, &params, now) {
            ClaimDecision::OnCooldown { seconds_remaining } => {
                Ok(ClaimOutcome::OnCooldown { seconds_remaining })
            }

            ClaimDecision::Eligible { bonus } => {
                let streak = record.claim_count;

                record.points += bonus;
                record.last_claim = Some(now);
                record.claim_count += 1;

                // One whole-record write: balance, timestamp, and count
                // can never be observed partially applied
                self.storage.put_account(&record)?;

                tracing::debug!(
                    user_id = %user_id,
                    bonus,
                    claim_count = record.claim_count,
                    "Daily claim granted"
                );

                Ok(ClaimOutcome::Claimed {
                    bonus,
                    new_balance: record.points,
                    streak,
                })
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Ensure the user's record exists
    pub async fn ensure_account(&self, user_id: UserId) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::EnsureAccount {
                user_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Get balance and claim count
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::GetBalance {
                user_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Adjust balance by any signed amount
    pub async fn adjust_points(&self, user_id: UserId, amount: i64) -> Result<i64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::AdjustPoints {
                user_id,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Transfer points between two users
    pub async fn transfer(
        &self,
        src: UserId,
        dst: UserId,
        amount: i64,
    ) -> Result<TransferOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Transfer {
                src,
                dst,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Attempt a daily claim
    pub async fn claim_daily(&self, user_id: UserId, params: ClaimParams) -> Result<ClaimOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::ClaimDaily {
                user_id,
                params,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor and wait for it to release storage
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Shutdown { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(storage: Arc<Storage>, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn test_storage() -> (Arc<Storage>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Arc::new(Storage::open(&config).unwrap()), temp_dir)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage, 100);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage, 100);
        let user = UserId::new(1);

        handle.ensure_account(user).await.unwrap();
        handle.adjust_points(user, 250).await.unwrap();
        handle.ensure_account(user).await.unwrap();

        // Re-ensuring must not reset the balance
        let balance = handle.get_balance(user).await.unwrap();
        assert_eq!(balance.points, 250);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_adjust_and_balance() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage, 100);
        let user = UserId::new(2);

        assert_eq!(handle.adjust_points(user, 100).await.unwrap(), 100);
        assert_eq!(handle.adjust_points(user, -40).await.unwrap(), 60);

        let balance = handle.get_balance(user).await.unwrap();
        assert_eq!(balance.points, 60);
        assert_eq!(balance.claim_count, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_transfer_conserves_and_denies() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage, 100);
        let alice = UserId::new(10);
        let bob = UserId::new(11);

        handle.adjust_points(alice, 100).await.unwrap();

        let outcome = handle.transfer(alice, bob, 60).await.unwrap();
        assert_eq!(
            outcome,
            TransferOutcome::Completed {
                src_balance: 40,
                dst_balance: 60
            }
        );

        // Second transfer exceeds the remaining balance
        let outcome = handle.transfer(alice, bob, 60).await.unwrap();
        assert_eq!(outcome, TransferOutcome::InsufficientFunds { available: 40 });

        // Denial must not have mutated anything
        assert_eq!(handle.get_balance(alice).await.unwrap().points, 40);
        assert_eq!(handle.get_balance(bob).await.unwrap().points, 60);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_claim_then_cooldown() {
        let (storage, _temp) = test_storage();
        let handle = spawn_ledger_actor(storage, 100);
        let user = UserId::new(20);
        let params = ClaimParams::default();

        let outcome = handle.claim_daily(user, params).await.unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Claimed {
                bonus: 500,
                new_balance: 500,
                streak: 0
            }
        );

        // Back-to-back second claim lands inside the window
        match handle.claim_daily(user, params).await.unwrap() {
            ClaimOutcome::OnCooldown { seconds_remaining } => {
                assert!(seconds_remaining > 0);
                assert!(seconds_remaining <= params.cooldown_seconds);
            }
            other => panic!("expected cooldown, got {:?}", other),
        }

        let balance = handle.get_balance(user).await.unwrap();
        assert_eq!(balance.points, 500);
        assert_eq!(balance.claim_count, 1);

        handle.shutdown().await.unwrap();
    }
}
