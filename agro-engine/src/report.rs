//! Distribution summary over the transaction history

use crate::store::EntityStore;
use crate::types::{ProductId, TransactionStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Units delivered for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDistribution {
    /// Product
    pub product_id: ProductId,

    /// Product name, empty when the product is unknown
    pub product_name: String,

    /// Units delivered by completed transactions
    pub quantity: u64,
}

/// Distribution report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
    /// Completed transactions
    pub completed: usize,

    /// Failed transactions
    pub failed: usize,

    /// Sum of total cost over completed transactions
    pub total_revenue: Decimal,

    /// Delivered units per product, ascending product id
    pub products: Vec<ProductDistribution>,
}

impl DistributionReport {
    /// Build the report from the store's transactions
    pub fn from_store(store: &EntityStore) -> Self {
        let mut completed = 0;
        let mut failed = 0;
        let mut total_revenue = Decimal::ZERO;
        let mut quantities: BTreeMap<ProductId, u64> = BTreeMap::new();

        for tx in store.transactions() {
            match tx.status {
                TransactionStatus::Completed => {
                    completed += 1;
                    total_revenue += tx.total_cost;
                    *quantities.entry(tx.product_id).or_insert(0) += u64::from(tx.quantity);
                }
                TransactionStatus::Failed => failed += 1,
                TransactionStatus::Pending => {
                    tracing::warn!(transaction_id = %tx.id, "Pending transaction found at rest");
                }
            }
        }

        let products = quantities
            .into_iter()
            .map(|(product_id, quantity)| ProductDistribution {
                product_id,
                product_name: store
                    .product(product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                quantity,
            })
            .collect();

        Self {
            completed,
            failed,
            total_revenue,
            products,
        }
    }

    /// Completed plus failed
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}
