//! Prometheus metrics for the distribution engine
//!
//! # Metrics
//!
//! - `agro_transactions_total{status}` - Constructed transactions by outcome
//!   (`completed`, `failed_policy`, `failed_credit`)
//! - `agro_ledger_blocks` - Blocks currently in the ledger
//!
//! Collectors live on a per-instance registry, so several systems can coexist
//! in one process.

use crate::types::{FailureReason, TransactionOutcome};
use crate::Result;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Status label for committed transactions
pub const STATUS_COMPLETED: &str = "completed";
/// Status label for policy rejections
pub const STATUS_FAILED_POLICY: &str = "failed_policy";
/// Status label for insufficient credit
pub const STATUS_FAILED_CREDIT: &str = "failed_credit";

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions by outcome
    pub transactions_total: IntCounterVec,

    /// Current ledger length
    pub ledger_blocks: IntGauge,

    registry: Registry,
}

impl Metrics {
    /// Create collectors on a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let transactions_total = IntCounterVec::new(
            Opts::new(
                "agro_transactions_total",
                "Constructed transactions by outcome",
            ),
            &["status"],
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let ledger_blocks = IntGauge::new("agro_ledger_blocks", "Blocks currently in the ledger")?;
        registry.register(Box::new(ledger_blocks.clone()))?;

        Ok(Self {
            transactions_total,
            ledger_blocks,
            registry,
        })
    }

    /// Count a pipeline outcome
    pub fn observe_outcome(&self, outcome: &TransactionOutcome) {
        let status = match &outcome.failure {
            None => STATUS_COMPLETED,
            Some(FailureReason::PolicyRejected { .. }) => STATUS_FAILED_POLICY,
            Some(FailureReason::InsufficientCredit { .. }) => STATUS_FAILED_CREDIT,
        };
        self.transactions_total.with_label_values(&[status]).inc();
    }

    /// Record the ledger length
    pub fn set_ledger_blocks(&self, blocks: usize) {
        self.ledger_blocks.set(blocks as i64);
    }

    /// Count recorded for one status label
    pub fn transactions(&self, status: &str) -> u64 {
        self.transactions_total.with_label_values(&[status]).get()
    }

    /// Render every metric in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::Error::Other(format!("Metrics output is not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("ledger_blocks", &self.ledger_blocks.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionId, TransactionStatus};
    use rust_decimal::Decimal;

    fn outcome(failure: Option<FailureReason>) -> TransactionOutcome {
        TransactionOutcome {
            transaction_id: TransactionId(1),
            status: if failure.is_some() {
                TransactionStatus::Failed
            } else {
                TransactionStatus::Completed
            },
            failure,
        }
    }

    #[test]
    fn test_outcomes_counted_by_label() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_outcome(&outcome(None));
        metrics.observe_outcome(&outcome(None));
        metrics.observe_outcome(&outcome(Some(FailureReason::InsufficientCredit {
            required: Decimal::from(10),
            available: Decimal::ONE,
        })));

        assert_eq!(metrics.transactions(STATUS_COMPLETED), 2);
        assert_eq!(metrics.transactions(STATUS_FAILED_CREDIT), 1);
        assert_eq!(metrics.transactions(STATUS_FAILED_POLICY), 0);
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.set_ledger_blocks(5);
        assert_eq!(second.ledger_blocks.get(), 0);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_outcome(&outcome(None));
        metrics.set_ledger_blocks(3);

        let text = metrics.render().unwrap();
        assert!(text.contains("agro_transactions_total{status=\"completed\"} 1"));
        assert!(text.contains("agro_ledger_blocks 3"));
    }
}
