//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain file name, relative to the data directory
    pub chain_file: PathBuf,

    /// Width of generated block tokens
    pub token_length: usize,

    /// Payload written into every genesis block
    pub genesis_payload: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_file: PathBuf::from("blockchain.dat"),
            token_length: 10,
            genesis_payload: "Genesis Block".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(file) = std::env::var("AGRO_LEDGER_CHAIN_FILE") {
            config.chain_file = PathBuf::from(file);
        }

        if let Ok(length) = std::env::var("AGRO_LEDGER_TOKEN_LENGTH") {
            config.token_length = length.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AGRO_LEDGER_TOKEN_LENGTH: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the ledger cannot operate with
    pub fn validate(&self) -> crate::Result<()> {
        if self.token_length == 0 {
            return Err(crate::Error::Config(
                "token_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chain_file, PathBuf::from("blockchain.dat"));
        assert_eq!(config.token_length, 10);
        assert_eq!(config.genesis_payload, "Genesis Block");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("token_length = 16").unwrap();
        assert_eq!(config.token_length, 16);
        assert_eq!(config.genesis_payload, "Genesis Block");
    }

    #[test]
    fn test_zero_token_length_rejected() {
        let config = Config {
            token_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
