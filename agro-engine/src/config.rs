//! Configuration for the distribution engine

use crate::types::{ProductId, SupplierId, TransporterId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Directory holding the chain and entity files
    pub data_dir: PathBuf,

    /// Ledger configuration
    pub ledger: agro_ledger::Config,

    /// Policy configuration
    pub policy: PolicyConfig,

    /// Inventory allocation configuration
    pub inventory: InventoryConfig,

    /// Seasonal simulation configuration
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "agro-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::from("./data"),
            ledger: agro_ledger::Config::default(),
            policy: PolicyConfig::default(),
            inventory: InventoryConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Highest total cost the price ceiling accepts
    pub price_ceiling: Decimal,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            price_ceiling: Decimal::from(4000),
        }
    }
}

/// Inventory allocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Minimum units allocated to each retailer before rescaling
    pub safety_stock: u32,

    /// Holding cost per unit as a fraction of unit price
    pub holding_cost_rate: Decimal,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            safety_stock: 10,
            holding_cost_rate: Decimal::new(2, 1), // 20%
        }
    }
}

/// One order placed per retailer during a seasonal simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTemplate {
    /// Shipping supplier
    pub supplier_id: SupplierId,

    /// Ordered product
    pub product_id: ProductId,

    /// Carrier
    pub transporter_id: TransporterId,

    /// Units ordered
    pub quantity: u32,
}

/// Seasonal simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// High-demand order
    pub high_demand: OrderTemplate,

    /// Normal-demand order
    pub normal_demand: OrderTemplate,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            high_demand: OrderTemplate {
                supplier_id: SupplierId(1),
                product_id: ProductId(1),
                transporter_id: TransporterId(1),
                quantity: 100,
            },
            normal_demand: OrderTemplate {
                supplier_id: SupplierId(2),
                product_id: ProductId(2),
                transporter_id: TransporterId(2),
                quantity: 50,
            },
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config {
            ledger: agro_ledger::Config::from_env()?,
            ..Default::default()
        };

        if let Ok(dir) = std::env::var("AGRO_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(ceiling) = std::env::var("AGRO_PRICE_CEILING") {
            config.policy.price_ceiling = ceiling.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AGRO_PRICE_CEILING: {}", e))
            })?;
        }

        if let Ok(floor) = std::env::var("AGRO_SAFETY_STOCK") {
            config.inventory.safety_stock = floor.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AGRO_SAFETY_STOCK: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot operate with
    pub fn validate(&self) -> crate::Result<()> {
        self.ledger.validate()?;

        if self.policy.price_ceiling < Decimal::ZERO {
            return Err(crate::Error::Config(
                "price_ceiling must not be negative".to_string(),
            ));
        }

        if self.inventory.holding_cost_rate < Decimal::ZERO {
            return Err(crate::Error::Config(
                "holding_cost_rate must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the chain file
    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger.chain_file)
    }
}
