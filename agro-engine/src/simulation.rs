//! Seasonal demand simulation
//!
//! Places one high-demand and one normal-demand seasonal order for every
//! retailer through the regular pipeline.

use crate::config::OrderTemplate;
use crate::system::DistributionSystem;
use crate::types::{OrderType, RetailerId, TransactionOutcome, TransactionRequest};
use crate::Result;
use std::fmt;

/// Demand level of a simulated order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandTier {
    /// High-demand template
    High,
    /// Normal-demand template
    Normal,
}

impl fmt::Display for DemandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandTier::High => f.write_str("high"),
            DemandTier::Normal => f.write_str("normal"),
        }
    }
}

/// One simulated order and what became of it
#[derive(Debug)]
pub struct SimulatedOrder {
    /// Ordering retailer
    pub retailer_id: RetailerId,

    /// Template used
    pub tier: DemandTier,

    /// Pipeline result; errors do not stop the simulation
    pub result: Result<TransactionOutcome>,
}

fn seasonal_request(template: &OrderTemplate, retailer: RetailerId) -> TransactionRequest {
    TransactionRequest {
        supplier_id: template.supplier_id,
        retailer_id: retailer,
        product_id: template.product_id,
        transporter_id: template.transporter_id,
        quantity: template.quantity,
        order_type: OrderType::Seasonal,
    }
}

impl DistributionSystem {
    /// Place both seasonal orders for every retailer, in retailer id order
    pub fn run_seasonal_simulation(&mut self) -> Vec<SimulatedOrder> {
        let retailers: Vec<RetailerId> = self.store().retailers().map(|r| r.id).collect();
        let templates = [
            (DemandTier::High, self.config().simulation.high_demand),
            (DemandTier::Normal, self.config().simulation.normal_demand),
        ];

        let mut orders = Vec::with_capacity(retailers.len() * templates.len());
        for retailer_id in retailers {
            for (tier, template) in &templates {
                let request = seasonal_request(template, retailer_id);
                let result = self.create_transaction(&request);

                if let Err(e) = &result {
                    tracing::warn!(%retailer_id, %tier, error = %e, "Seasonal order not placed");
                }

                orders.push(SimulatedOrder {
                    retailer_id,
                    tier: *tier,
                    result,
                });
            }
        }

        tracing::info!(orders = orders.len(), "Seasonal simulation finished");
        orders
    }
}
