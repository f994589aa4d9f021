//! Policy engine
//!
//! A policy is a read-only predicate over a fully costed [`Transaction`].
//! The engine runs policies in registration order and stops at the first
//! rejection.

use crate::config::PolicyConfig;
use crate::types::Transaction;
use rust_decimal::Decimal;
use std::fmt;

/// Decision of a single policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Transaction may proceed
    Approve,
    /// Transaction must fail, with a human-readable reason
    Reject(String),
}

/// Pluggable transaction policy
pub trait Policy {
    /// Short identifier used in logs and failure reports
    fn name(&self) -> &str;

    /// Human-readable description of the rule
    fn description(&self) -> String;

    /// Evaluate the transaction without changing it
    fn evaluate(&self, transaction: &Transaction) -> PolicyDecision;
}

/// Rejects transactions whose total cost exceeds a ceiling
#[derive(Debug, Clone)]
pub struct PriceCeiling {
    max_total_cost: Decimal,
}

impl PriceCeiling {
    /// Create a ceiling at `max_total_cost`
    pub fn new(max_total_cost: Decimal) -> Self {
        Self { max_total_cost }
    }

    /// Configured ceiling
    pub fn max_total_cost(&self) -> Decimal {
        self.max_total_cost
    }
}

impl Policy for PriceCeiling {
    fn name(&self) -> &str {
        "PriceCeiling"
    }

    fn description(&self) -> String {
        format!(
            "Price Threshold Contract: Maximum allowed cost is RM{:.2}",
            self.max_total_cost
        )
    }

    fn evaluate(&self, transaction: &Transaction) -> PolicyDecision {
        if transaction.total_cost > self.max_total_cost {
            return PolicyDecision::Reject(format!(
                "Total cost RM{:.2} exceeds maximum allowed RM{:.2}",
                transaction.total_cost, self.max_total_cost
            ));
        }
        PolicyDecision::Approve
    }
}

/// Combined verdict of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// Every policy approved
    Approved,
    /// First rejecting policy and its reason
    Rejected {
        /// Policy name
        policy: String,
        /// Rejection reason
        reason: String,
    },
}

/// Ordered set of policies
#[derive(Default)]
pub struct PolicyEngine {
    policies: Vec<Box<dyn Policy>>,
}

impl PolicyEngine {
    /// Engine with no policies (approves everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the configured price ceiling
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut engine = Self::new();
        engine.register(PriceCeiling::new(config.price_ceiling));
        engine
    }

    /// Add a policy after the existing ones
    pub fn register(&mut self, policy: impl Policy + 'static) {
        tracing::debug!(policy = policy.name(), "Policy registered");
        self.policies.push(Box::new(policy));
    }

    /// Run every policy in order, stopping at the first rejection
    pub fn evaluate(&self, transaction: &Transaction) -> PolicyVerdict {
        for policy in &self.policies {
            if let PolicyDecision::Reject(reason) = policy.evaluate(transaction) {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    policy = policy.name(),
                    %reason,
                    "Transaction rejected by policy"
                );
                return PolicyVerdict::Rejected {
                    policy: policy.name().to_string(),
                    reason,
                };
            }
        }
        PolicyVerdict::Approved
    }

    /// Registered policy names, in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Descriptions of the registered policies, in evaluation order
    pub fn descriptions(&self) -> Vec<String> {
        self.policies.iter().map(|p| p.description()).collect()
    }

    /// Number of registered policies
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policy is registered
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("policies", &self.names())
            .finish()
    }
}
