use std::{fs, path::Path};

use bitcoin::Network;
use bs_common::logging::LoggerConfig;
use bs_settlement::{SettlementPolicy, VerifyContext};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default value for `network` in [`Config`].
const DEFAULT_NETWORK: Network = Network::Bitcoin;

fn default_network() -> Network {
    DEFAULT_NETWORK
}

/// Top-level configuration file.
///
/// Every section is optional; counterparties running with the defaults interoperate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Network settlement addresses are encoded for.
    #[serde(default = "default_network")]
    pub network: Network,

    #[serde(default)]
    pub policy: SettlementPolicy,

    #[serde(default)]
    pub logging: LoggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK,
            policy: SettlementPolicy::default(),
            logging: LoggerConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let policy = &self.policy;
        if !(0.0..1.0).contains(&policy.fee_tolerance) {
            return Err(ConfigError::InvalidPolicy("fee_tolerance must be in [0, 1)"));
        }
        if !(policy.min_relay_fee_rate.is_finite() && policy.min_relay_fee_rate > 0.0) {
            return Err(ConfigError::InvalidPolicy(
                "min_relay_fee_rate must be positive",
            ));
        }
        if policy.payout_max_vsize == 0 {
            return Err(ConfigError::InvalidPolicy("payout_max_vsize must be nonzero"));
        }
        Ok(self)
    }

    pub fn verify_context(&self) -> VerifyContext {
        VerifyContext::new(self.network).with_policy(self.policy)
    }
}
