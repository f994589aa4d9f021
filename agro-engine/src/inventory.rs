//! Demand-proportional stock allocation
//!
//! Advisory only: the allocator reads stock and transaction history and never
//! moves stock itself.
//!
//! Allocation runs in three passes:
//!
//! 1. Share stock by historical completed demand, or evenly without history
//! 2. Raise every share to the safety-stock floor
//! 3. If the floored shares exceed stock, scale them all down to fit
//!
//! The floor is applied before rescaling, so it is a best-effort minimum.

use crate::config::InventoryConfig;
use crate::types::{Product, ProductId, Retailer, RetailerId, Transaction};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Allocation for one retailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetailerAllocation {
    /// Retailer
    pub retailer_id: RetailerId,

    /// Completed units delivered in the past
    pub historical_demand: u64,

    /// Suggested units
    pub allocation: u64,
}

/// Allocation plan for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    /// Allocated product
    pub product_id: ProductId,

    /// Stock on hand at planning time
    pub total_stock: u32,

    /// Completed units across all retailers
    pub total_demand: u64,

    /// Per-retailer allocations in retailer order
    pub allocations: Vec<RetailerAllocation>,

    /// Whether floored shares had to be scaled down to fit stock
    pub rescaled: bool,

    /// Holding cost of an even split
    pub current_holding_cost: Decimal,

    /// Holding cost of this plan
    pub optimized_holding_cost: Decimal,

    /// Even-split cost minus plan cost
    pub savings: Decimal,
}

impl AllocationPlan {
    /// Sum of all allocations
    pub fn total_allocated(&self) -> u64 {
        self.allocations.iter().map(|a| a.allocation).sum()
    }

    /// Ledger record for this plan
    pub fn ledger_payload(&self) -> String {
        format!(
            "Inventory Optimization | Product: {} | Total Stock: {} | Optimization Savings: RM{:.2}",
            self.product_id, self.total_stock, self.savings
        )
    }
}

/// `value * numerator / denominator` without intermediate overflow
///
/// Callers keep `numerator <= denominator`, so the result never exceeds
/// `value`.
fn scale(value: u64, numerator: u64, denominator: u64) -> u64 {
    let scaled = u128::from(value) * u128::from(numerator) / u128::from(denominator);
    u64::try_from(scaled).unwrap_or(value)
}

/// Proportional inventory allocator
#[derive(Debug, Clone)]
pub struct Allocator {
    safety_stock: u64,
    holding_cost_rate: Decimal,
}

impl Allocator {
    /// Create an allocator from configuration
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            safety_stock: u64::from(config.safety_stock),
            holding_cost_rate: config.holding_cost_rate,
        }
    }

    /// Plan how `product`'s stock should be spread over `retailers`
    ///
    /// Only Completed transactions for `product` count towards demand.
    pub fn allocate<'a>(
        &self,
        product: &Product,
        retailers: &[&Retailer],
        history: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<AllocationPlan> {
        if retailers.is_empty() {
            return Err(Error::NoRetailers);
        }

        let mut demand: HashMap<RetailerId, u64> = HashMap::new();
        for tx in history {
            if tx.product_id == product.id && tx.is_completed() {
                *demand.entry(tx.retailer_id).or_insert(0) += u64::from(tx.quantity);
            }
        }
        let total_demand: u64 = demand.values().sum();

        let stock = u64::from(product.stock);
        let count = retailers.len() as u64;

        let mut allocations: Vec<RetailerAllocation> = retailers
            .iter()
            .map(|retailer| {
                let historical_demand = demand.get(&retailer.id).copied().unwrap_or(0);
                let share = if total_demand > 0 {
                    scale(stock, historical_demand, total_demand)
                } else {
                    stock / count
                };
                RetailerAllocation {
                    retailer_id: retailer.id,
                    historical_demand,
                    allocation: share.max(self.safety_stock),
                }
            })
            .collect();

        let floored = allocations
            .iter()
            .fold(0u64, |sum, a| sum.saturating_add(a.allocation));
        let rescaled = floored > stock;
        if rescaled {
            for entry in &mut allocations {
                entry.allocation = scale(stock, entry.allocation, floored);
            }
            tracing::debug!(
                product_id = %product.id,
                floored,
                stock,
                "Safety stock exceeded supply, allocations rescaled"
            );
        }

        let overflow = || Error::CostOverflow(format!("holding cost for product {}", product.id));
        let unit_holding_cost = product
            .price
            .checked_mul(self.holding_cost_rate)
            .ok_or_else(overflow)?;
        let even_split = stock / count;
        let current_holding_cost = Decimal::from(even_split * count)
            .checked_mul(unit_holding_cost)
            .ok_or_else(overflow)?;
        let allocated: u64 = allocations.iter().map(|a| a.allocation).sum();
        let optimized_holding_cost = Decimal::from(allocated)
            .checked_mul(unit_holding_cost)
            .ok_or_else(overflow)?;

        let plan = AllocationPlan {
            product_id: product.id,
            total_stock: product.stock,
            total_demand,
            allocations,
            rescaled,
            current_holding_cost,
            optimized_holding_cost,
            savings: current_holding_cost - optimized_holding_cost,
        };

        tracing::info!(
            product_id = %product.id,
            retailers = retailers.len(),
            total_demand,
            allocated,
            rescaled,
            "Inventory allocation planned"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::types::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId(1),
            name: "Rice".into(),
            price: Decimal::new(550, 2),
            stock,
        }
    }

    fn retailer(id: u32) -> Retailer {
        Retailer {
            id: RetailerId(id),
            name: format!("Retailer {}", id),
            location: "KL".into(),
            coordinates: GeoPoint::new(3.0, 101.0).unwrap(),
            credit: CreditAccount::new(Decimal::ZERO, Decimal::ZERO),
            product_ids: vec![],
        }
    }

    fn delivered(id: u32, retailer: u32, product: u32, quantity: u32, status: TransactionStatus) -> Transaction {
        let request = TransactionRequest::regular(
            SupplierId(1),
            RetailerId(retailer),
            ProductId(product),
            TransporterId(1),
            quantity,
        );
        let mut tx = Transaction::new(TransactionId(id), &request, Decimal::ZERO, Decimal::ZERO);
        tx.status = status;
        tx
    }

    fn allocations(plan: &AllocationPlan) -> Vec<u64> {
        plan.allocations.iter().map(|a| a.allocation).collect()
    }

    #[test]
    fn test_no_retailers() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let result = allocator.allocate(&product(100), &[], Vec::<&Transaction>::new());
        assert!(matches!(result, Err(Error::NoRetailers)));
    }

    #[test]
    fn test_even_split_without_history() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b, c) = (retailer(1), retailer(2), retailer(3));

        let plan = allocator.allocate(&product(100), &[&a, &b, &c], Vec::new()).unwrap();
        assert_eq!(allocations(&plan), vec![33, 33, 33]);
        assert_eq!(plan.total_demand, 0);
        assert!(!plan.rescaled);
        assert_eq!(plan.savings, Decimal::ZERO);
    }

    #[test]
    fn test_proportional_to_completed_demand() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b) = (retailer(1), retailer(2));
        let history = vec![
            delivered(1, 1, 1, 300, TransactionStatus::Completed),
            delivered(2, 2, 1, 100, TransactionStatus::Completed),
            delivered(3, 2, 1, 500, TransactionStatus::Failed),
            delivered(4, 2, 2, 900, TransactionStatus::Completed),
        ];

        let plan = allocator.allocate(&product(1000), &[&a, &b], &history).unwrap();
        assert_eq!(plan.total_demand, 400);
        assert_eq!(allocations(&plan), vec![750, 250]);
        assert_eq!(plan.allocations[0].historical_demand, 300);
        assert_eq!(plan.total_allocated(), 1000);
    }

    #[test]
    fn test_safety_floor_applied() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b) = (retailer(1), retailer(2));
        let history = vec![delivered(1, 1, 1, 100, TransactionStatus::Completed)];

        let plan = allocator.allocate(&product(100), &[&a, &b], &history).unwrap();
        // 100 + floor(10) exceeds stock, so both shares shrink
        assert!(plan.rescaled);
        assert_eq!(allocations(&plan), vec![90, 9]);
        assert!(plan.total_allocated() <= 100);
    }

    #[test]
    fn test_floor_without_rescale() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b) = (retailer(1), retailer(2));
        let history = vec![
            delivered(1, 1, 1, 905, TransactionStatus::Completed),
            delivered(2, 2, 1, 95, TransactionStatus::Completed),
        ];

        // Shares 90/9: the floor lifts the second into truncation slack
        let plan = allocator.allocate(&product(100), &[&a, &b], &history).unwrap();
        assert_eq!(allocations(&plan), vec![90, 10]);
        assert!(!plan.rescaled);
    }

    #[test]
    fn test_large_history_does_not_overflow() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b) = (retailer(1), retailer(2));
        let history: Vec<Transaction> = (1..=6)
            .map(|id| delivered(id, 1 + id % 2, 1, u32::MAX, TransactionStatus::Completed))
            .collect();

        let plan = allocator.allocate(&product(u32::MAX), &[&a, &b], &history).unwrap();
        assert_eq!(plan.total_demand, 6 * u64::from(u32::MAX));
        assert_eq!(plan.allocations[0].allocation, u64::from(u32::MAX) / 2);
        assert!(plan.total_allocated() <= u64::from(u32::MAX));
    }

    #[test]
    fn test_holding_cost_overflow_is_an_error() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let a = retailer(1);
        let mut expensive = product(100);
        expensive.price = Decimal::MAX;

        assert!(matches!(
            allocator.allocate(&expensive, &[&a], Vec::new()),
            Err(Error::CostOverflow(_))
        ));
    }

    #[test]
    fn test_zero_stock_rescales_to_zero() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b) = (retailer(1), retailer(2));

        let plan = allocator.allocate(&product(0), &[&a, &b], Vec::new()).unwrap();
        assert_eq!(allocations(&plan), vec![0, 0]);
        assert!(plan.rescaled);
    }

    #[test]
    fn test_holding_cost_analysis() {
        let allocator = Allocator::new(&InventoryConfig::default());
        let (a, b, c) = (retailer(1), retailer(2), retailer(3));
        let history = vec![
            delivered(1, 1, 1, 50, TransactionStatus::Completed),
            delivered(2, 2, 1, 50, TransactionStatus::Completed),
        ];

        let plan = allocator.allocate(&product(100), &[&a, &b, &c], &history).unwrap();
        // Shares 50/50/0 become 50/50/10, then scale by 100/110
        assert_eq!(allocations(&plan), vec![45, 45, 9]);

        // Unit holding cost is 5.50 * 0.2 = 1.10
        assert_eq!(plan.current_holding_cost, Decimal::new(10890, 2));
        assert_eq!(plan.optimized_holding_cost, Decimal::new(10890, 2));
        assert_eq!(plan.savings, Decimal::ZERO);
        assert_eq!(
            plan.ledger_payload(),
            "Inventory Optimization | Product: 1 | Total Stock: 100 | Optimization Savings: RM0.00"
        );
    }
}
