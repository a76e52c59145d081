//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_claims_granted_total` - Daily claims granted
//! - `ledger_claims_denied_total` - Daily claims denied by cooldown
//! - `ledger_transfers_completed_total` - Transfers committed
//! - `ledger_transfers_denied_total` - Transfers denied (insufficient funds)
//! - `ledger_adjustments_total` - Mint/reduce operations
//! - `ledger_op_duration_seconds` - Histogram of operation latencies
//! - `ledger_accounts_total` - Account count estimate

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Daily claims granted
    pub claims_granted: IntCounter,

    /// Daily claims denied by cooldown
    pub claims_denied: IntCounter,

    /// Transfers committed
    pub transfers_completed: IntCounter,

    /// Transfers denied for insufficient funds
    pub transfers_denied: IntCounter,

    /// Mint/reduce operations
    pub adjustments: IntCounter,

    /// Operation duration histogram
    pub op_duration: Histogram,

    /// Account count estimate
    pub accounts: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let claims_granted =
            IntCounter::new("ledger_claims_granted_total", "Daily claims granted")?;
        registry.register(Box::new(claims_granted.clone()))?;

        let claims_denied = IntCounter::new(
            "ledger_claims_denied_total",
            "Daily claims denied by cooldown",
        )?;
        registry.register(Box::new(claims_denied.clone()))?;

        let transfers_completed =
            IntCounter::new("ledger_transfers_completed_total", "Transfers committed")?;
        registry.register(Box::new(transfers_completed.clone()))?;

        let transfers_denied = IntCounter::new(
            "ledger_transfers_denied_total",
            "Transfers denied for insufficient funds",
        )?;
        registry.register(Box::new(transfers_denied.clone()))?;

        let adjustments = IntCounter::new("ledger_adjustments_total", "Mint/reduce operations")?;
        registry.register(Box::new(adjustments.clone()))?;

        let op_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_op_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0,
            ]),
        )?;
        registry.register(Box::new(op_duration.clone()))?;

        let accounts = IntGauge::new("ledger_accounts_total", "Account count estimate")?;
        registry.register(Box::new(accounts.clone()))?;

        Ok(Self {
            claims_granted,
            claims_denied,
            transfers_completed,
            transfers_denied,
            adjustments,
            op_duration,
            accounts,
            registry,
        })
    }

    /// Record claim outcome
    pub fn record_claim(&self, granted: bool) {
        if granted {
            self.claims_granted.inc();
        } else {
            self.claims_denied.inc();
        }
    }

    /// Record transfer outcome
    pub fn record_transfer(&self, completed: bool) {
        if completed {
            self.transfers_completed.inc();
        } else {
            self.transfers_denied.inc();
        }
    }

    /// Record mint/reduce operation
    pub fn record_adjustment(&self) {
        self.adjustments.inc();
    }

    /// Record operation duration
    pub fn record_op_duration(&self, duration_seconds: f64) {
        self.op_duration.observe(duration_seconds);
    }

    /// Update account count estimate
    pub fn update_account_count(&self, count: i64) {
        self.accounts.set(count);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.claims_granted.get(), 0);
        assert_eq!(metrics.transfers_completed.get(), 0);
    }

    #[test]
    fn test_record_claim() {
        let metrics = Metrics::new().unwrap();
        metrics.record_claim(true);
        metrics.record_claim(true);
        metrics.record_claim(false);
        assert_eq!(metrics.claims_granted.get(), 2);
        assert_eq!(metrics.claims_denied.get(), 1);
    }

    #[test]
    fn test_record_transfer() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transfer(true);
        metrics.record_transfer(false);
        assert_eq!(metrics.transfers_completed.get(), 1);
        assert_eq!(metrics.transfers_denied.get(), 1);
    }

    #[test]
    fn test_update_account_count() {
        let metrics = Metrics::new().unwrap();
        metrics.update_account_count(12345);
        assert_eq!(metrics.accounts.get(), 12345);
    }
}
