//! Core types for the distribution engine

use crate::geo::GeoPoint;
use agro_ledger::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Raw numeric value
            pub fn value(&self) -> u32 {
                self.0
            }

            /// Id following this one, `None` once the id space is used up
            pub fn checked_next(&self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }
    };
}

entity_id!(
    /// Product identifier
    ProductId
);
entity_id!(
    /// Supplier identifier
    SupplierId
);
entity_id!(
    /// Retailer identifier
    RetailerId
);
entity_id!(
    /// Transporter identifier
    TransporterId
);
entity_id!(
    /// Transaction identifier
    TransactionId
);

/// Kinds of stored entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Product
    Product,
    /// Supplier
    Supplier,
    /// Retailer
    Retailer,
    /// Transporter
    Transporter,
    /// Transaction
    Transaction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Product => "Product",
            EntityKind::Supplier => "Supplier",
            EntityKind::Retailer => "Retailer",
            EntityKind::Transporter => "Transporter",
            EntityKind::Transaction => "Transaction",
        };
        f.write_str(name)
    }
}

/// Product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Product ID
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Decimal,

    /// Units on hand
    pub stock: u32,
}

impl Product {
    /// Whether `quantity` units can be taken from stock
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Ledger summary line
    pub fn summary(&self) -> String {
        format!(
            "Product ID: {} | Name: {} | Price: RM{:.2} | Stock: {}",
            self.id, self.name, self.price, self.stock
        )
    }
}

/// Supplier of one or more products
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    /// Supplier ID
    pub id: SupplierId,

    /// Display name
    pub name: String,

    /// Free-text location
    pub location: String,

    /// Free-text branch
    pub branch: String,

    /// Dispatch coordinates
    pub coordinates: GeoPoint,

    /// Products this supplier can ship, in insertion order (duplicates kept)
    pub product_ids: Vec<ProductId>,
}

impl Supplier {
    /// Whether the supplier carries `product`
    pub fn supplies(&self, product: ProductId) -> bool {
        self.product_ids.contains(&product)
    }

    /// Ledger summary line
    pub fn summary(&self) -> String {
        format!(
            "Supplier ID: {} | Name: {} | Location: {} | Branch: {} | Coordinates: {}",
            self.id, self.name, self.location, self.branch, self.coordinates
        )
    }
}

/// Retailer credit balances
///
/// Both balances always move together by the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    /// Balance available for purchases
    pub current: Decimal,

    /// Annual balance
    pub annual: Decimal,
}

impl CreditAccount {
    /// Create an account with the given balances
    pub fn new(current: Decimal, annual: Decimal) -> Self {
        Self { current, annual }
    }

    /// Whether `amount` can be deducted
    pub fn covers(&self, amount: Decimal) -> bool {
        self.current >= amount
    }

    /// Deduct `amount` from both balances
    ///
    /// Returns false and leaves both balances untouched when the current
    /// balance is too low.
    pub fn deduct(&mut self, amount: Decimal) -> bool {
        if !self.covers(amount) {
            return false;
        }
        match (
            self.current.checked_sub(amount),
            self.annual.checked_sub(amount),
        ) {
            (Some(current), Some(annual)) => {
                self.current = current;
                self.annual = annual;
                true
            }
            _ => false,
        }
    }

    /// Add `amount` to both balances
    ///
    /// Returns false and leaves both balances untouched when either would
    /// leave the decimal range.
    pub fn top_up(&mut self, amount: Decimal) -> bool {
        match (
            self.current.checked_add(amount),
            self.annual.checked_add(amount),
        ) {
            (Some(current), Some(annual)) => {
                self.current = current;
                self.annual = annual;
                true
            }
            _ => false,
        }
    }
}

/// Retailer receiving deliveries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retailer {
    /// Retailer ID
    pub id: RetailerId,

    /// Display name
    pub name: String,

    /// Free-text location
    pub location: String,

    /// Delivery coordinates
    pub coordinates: GeoPoint,

    /// Credit balances
    pub credit: CreditAccount,

    /// Products associated with this retailer (not consulted by the pipeline)
    pub product_ids: Vec<ProductId>,
}

impl Retailer {
    /// Ledger summary line
    pub fn summary(&self) -> String {
        format!(
            "Retailer ID: {} | Name: {} | Location: {} | Coordinates: {} | Credit Balance: RM{:.2} | Annual Credit: RM{:.2}",
            self.id,
            self.name,
            self.location,
            self.coordinates,
            self.credit.current,
            self.credit.annual
        )
    }
}

/// Carrier pricing deliveries by distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transporter {
    /// Transporter ID
    pub id: TransporterId,

    /// Display name
    pub name: String,

    /// Vehicle or service label
    pub transport_type: String,

    /// Price per kilometre
    pub cost_per_km: Decimal,

    /// Maximum load in mass units
    pub max_capacity: f64,
}

impl Transporter {
    /// Cost of covering `distance_km`, `None` on decimal overflow
    pub fn transport_cost(&self, distance_km: Decimal) -> Option<Decimal> {
        distance_km.checked_mul(self.cost_per_km)
    }

    /// Whether a load of `weight` fits
    pub fn can_carry(&self, weight: f64) -> bool {
        weight <= self.max_capacity
    }

    /// Ledger summary line
    pub fn summary(&self) -> String {
        format!(
            "Transporter ID: {} | Name: {} | Type: {} | Cost per km: RM{:.2} | Max Capacity: {}",
            self.id, self.name, self.transport_type, self.cost_per_km, self.max_capacity
        )
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Constructed, not yet decided
    Pending,
    /// Credit deducted and stock moved
    Completed,
    /// Rejected by a policy or by credit
    Failed,
}

impl TransactionStatus {
    /// Persisted label
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TransactionStatus::Pending),
            "Completed" => Ok(TransactionStatus::Completed),
            "Failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Order type label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Ordinary order
    #[default]
    Regular,
    /// Seasonal demand order
    Seasonal,
}

impl OrderType {
    /// Persisted label
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Regular => "Regular",
            OrderType::Seasonal => "Seasonal",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Regular" => Ok(OrderType::Regular),
            "Seasonal" => Ok(OrderType::Seasonal),
            other => Err(format!("unknown order type '{}'", other)),
        }
    }
}

/// Input to the transaction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Shipping supplier
    pub supplier_id: SupplierId,

    /// Receiving retailer
    pub retailer_id: RetailerId,

    /// Ordered product
    pub product_id: ProductId,

    /// Carrier
    pub transporter_id: TransporterId,

    /// Units ordered
    pub quantity: u32,

    /// Order type
    pub order_type: OrderType,
}

impl TransactionRequest {
    /// Regular order
    pub fn regular(
        supplier_id: SupplierId,
        retailer_id: RetailerId,
        product_id: ProductId,
        transporter_id: TransporterId,
        quantity: u32,
    ) -> Self {
        Self {
            supplier_id,
            retailer_id,
            product_id,
            transporter_id,
            quantity,
            order_type: OrderType::Regular,
        }
    }

    /// Same order with a different type
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }
}

/// Costed transaction
///
/// Immutable once stored; status is decided by the pipeline before that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Transaction ID
    pub id: TransactionId,

    /// Shipping supplier
    pub supplier_id: SupplierId,

    /// Receiving retailer
    pub retailer_id: RetailerId,

    /// Ordered product
    pub product_id: ProductId,

    /// Carrier
    pub transporter_id: TransporterId,

    /// Units ordered
    pub quantity: u32,

    /// Unit price times quantity
    pub product_cost: Decimal,

    /// Distance times cost per km
    pub transport_cost: Decimal,

    /// Product cost plus transport cost
    pub total_cost: Decimal,

    /// Creation time
    pub timestamp: Timestamp,

    /// Status
    pub status: TransactionStatus,

    /// Order type
    pub order_type: OrderType,
}

impl Transaction {
    /// Build a pending transaction for `request`
    ///
    /// `product_cost + transport_cost` must fit the decimal range.
    pub fn new(
        id: TransactionId,
        request: &TransactionRequest,
        product_cost: Decimal,
        transport_cost: Decimal,
    ) -> Self {
        Self {
            id,
            supplier_id: request.supplier_id,
            retailer_id: request.retailer_id,
            product_id: request.product_id,
            transporter_id: request.transporter_id,
            quantity: request.quantity,
            product_cost,
            transport_cost,
            total_cost: product_cost + transport_cost,
            timestamp: Timestamp::now(),
            status: TransactionStatus::Pending,
            order_type: request.order_type,
        }
    }

    /// Whether the transaction committed
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Description carried by the ledger record
    pub fn block_data(&self) -> String {
        format!(
            "Transaction ID: {} | Supplier ID: {} | Retailer ID: {} | Product ID: {} | Quantity: {} | Total Cost: RM{:.2} | Timestamp: {} | Status: {} | Order Type: {}",
            self.id,
            self.supplier_id,
            self.retailer_id,
            self.product_id,
            self.quantity,
            self.total_cost,
            self.timestamp,
            self.status,
            self.order_type
        )
    }
}

/// Why a constructed transaction failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// A policy rejected the transaction
    PolicyRejected {
        /// Rejecting policy
        policy: String,
        /// Its reason
        reason: String,
    },

    /// Retailer credit did not cover the total cost
    InsufficientCredit {
        /// Total cost
        required: Decimal,
        /// Current balance
        available: Decimal,
    },
}

impl FailureReason {
    /// Ledger record prefix for this failure
    pub fn ledger_prefix(&self) -> &'static str {
        match self {
            FailureReason::PolicyRejected { .. } => "Failed Transaction",
            FailureReason::InsufficientCredit { .. } => "Failed Transaction (Credit)",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::PolicyRejected { policy, reason } => {
                write!(f, "rejected by {}: {}", policy, reason)
            }
            FailureReason::InsufficientCredit {
                required,
                available,
            } => write!(
                f,
                "insufficient credit: required RM{:.2}, available RM{:.2}",
                required, available
            ),
        }
    }
}

/// Ledger record prefix for committed transactions
pub const COMPLETED_PREFIX: &str = "Completed Transaction";

/// Result of a pipeline run that constructed a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionOutcome {
    /// Id assigned to the transaction
    pub transaction_id: TransactionId,

    /// Terminal status
    pub status: TransactionStatus,

    /// Set when the status is Failed
    pub failure: Option<FailureReason>,
}

impl TransactionOutcome {
    /// Whether the transaction committed
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}
