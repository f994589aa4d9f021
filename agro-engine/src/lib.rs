//! Agro Engine
//!
//! Transaction pipeline and distribution analytics on top of the agro ledger.
//!
//! # Architecture
//!
//! ```text
//!   agro CLI
//!      │
//!      ▼
//! DistributionSystem ──► pipeline ──► PolicyEngine
//!      │                    │
//!      ▼                    ▼
//!  EntityStore ◄────────────┤
//!      │                    ▼
//!      └──────────────►  Ledger (agro-ledger)
//! ```
//!
//! Route planning and inventory allocation only read the store; they append a
//! summary to the ledger when asked to record their result.
//!
//! # Example
//!
//! ```
//! use agro_engine::{Config, CreditAccount, DistributionSystem, GeoPoint, TransactionRequest};
//! use rust_decimal::Decimal;
//!
//! let mut system = DistributionSystem::new(Config::default())?;
//! let rice = system.add_product("Rice", Decimal::new(550, 2), 1000)?;
//! let supplier = system.add_supplier(
//!     "Malayan Agro",
//!     "Kuala Lumpur",
//!     "HQ",
//!     GeoPoint::new(3.168, 101.708)?,
//!     &[rice],
//! )?;
//! let retailer = system.add_retailer(
//!     "FreshMart",
//!     "Petaling Jaya",
//!     GeoPoint::new(3.148, 101.698)?,
//!     CreditAccount::new(Decimal::from(10000), Decimal::from(10000)),
//! )?;
//! let truck = system.add_transporter("FastTrans", "Truck", Decimal::new(250, 2), 5000.0)?;
//!
//! let outcome = system.create_transaction(&TransactionRequest::regular(
//!     supplier, retailer, rice, truck, 100,
//! ))?;
//! assert!(outcome.is_completed());
//! assert_eq!(system.store().product(rice).unwrap().stock, 900);
//! # Ok::<(), agro_engine::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod geo;
pub mod codec;
pub mod store;
pub mod policy;
pub mod pipeline;
pub mod routing;
pub mod inventory;
pub mod report;
pub mod simulation;
pub mod persistence;
pub mod metrics;
pub mod system;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use config::{Config, InventoryConfig, OrderTemplate, PolicyConfig, SimulationConfig};
pub use types::*;
pub use geo::GeoPoint;
pub use store::{EntityStore, IdCounters};
pub use policy::{Policy, PolicyDecision, PolicyEngine, PolicyVerdict, PriceCeiling};
pub use routing::{plan_route, RouteCost, RoutePlan};
pub use inventory::{AllocationPlan, Allocator, RetailerAllocation};
pub use report::{DistributionReport, ProductDistribution};
pub use simulation::{DemandTier, SimulatedOrder};
pub use persistence::LoadSummary;
pub use metrics::Metrics;
pub use system::DistributionSystem;
