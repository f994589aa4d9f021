//! Error types for the distribution engine
//!
//! Only caller and precondition errors live here. Policy rejections and
//! insufficient credit are recorded outcomes, see
//! [`TransactionOutcome`](crate::types::TransactionOutcome).

use crate::types::{EntityKind, ProductId, SupplierId};
use thiserror::Error;

/// Engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Ledger or record codec error
    #[error("Ledger error: {0}")]
    Ledger(#[from] agro_ledger::Error),

    /// Unknown entity id
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind looked up
        kind: EntityKind,
        /// Id that was not found
        id: u32,
    },

    /// Supplier's product list does not contain the product
    #[error("Supplier {supplier} does not supply product {product}")]
    SupplierDoesNotCarryProduct {
        /// Supplier
        supplier: SupplierId,
        /// Requested product
        product: ProductId,
    },

    /// Not enough stock to fill the order
    #[error("Insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product
        product: ProductId,
        /// Requested quantity
        requested: u32,
        /// Stock on hand
        available: u32,
    },

    /// Order quantity of zero
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    /// A computed cost does not fit the decimal range
    #[error("Cost out of range: {0}")]
    CostOverflow(String),

    /// No ids left for an entity kind
    #[error("No {0} ids left to assign")]
    IdsExhausted(EntityKind),

    /// Latitude or longitude out of range
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Entity field failed validation
    #[error("Invalid {kind}: {reason}")]
    InvalidEntity {
        /// Entity kind being created or updated
        kind: EntityKind,
        /// What was wrong
        reason: String,
    },

    /// Route planning needs more retailers
    #[error("Route optimization needs at least {required} retailers, found {found}")]
    InsufficientRetailers {
        /// Minimum number of retailers
        required: usize,
        /// Retailers available
        found: usize,
    },

    /// Allocation over an empty retailer set
    #[error("No retailers registered")]
    NoRetailers,

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a not-found error
    pub fn not_found(kind: EntityKind, id: impl Into<u32>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Build a validation error
    pub fn invalid(kind: EntityKind, reason: impl Into<String>) -> Self {
        Error::InvalidEntity {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found(EntityKind::Retailer, crate::types::RetailerId(7));
        assert_eq!(err.to_string(), "Retailer 7 not found");
    }

    #[test]
    fn test_ledger_error_converts() {
        let err: Error = agro_ledger::Error::InvariantViolation("empty".into()).into();
        assert!(matches!(err, Error::Ledger(_)));
    }

    #[test]
    fn test_string_conversion() {
        let err: Error = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
