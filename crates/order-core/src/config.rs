//! Configuration for the order signing pipeline.
//!
//! Everything the pipeline needs about the network is passed in explicitly
//! through [`ExchangeConfig`]; nothing is discovered into global state.

use std::env;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::types::REFERENCE_DECIMALS;
use crate::{Error, Result};

/// Prefix of every environment variable read by [`ExchangeConfig::from_env`].
pub const ENV_PREFIX: &str = "ORDER_SIGNER";

const DEFAULT_RPC_ENDPOINT: &str = "http://localhost:8545";

/// Exchange and network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// JSON-RPC endpoint of the node.
    pub rpc_endpoint: String,
    /// Deployed exchange contract.
    pub exchange_address: Address,
    pub assets: AssetAddresses,
    /// Expected network id; checked against the node when set.
    #[serde(default)]
    pub network_id: Option<u64>,
    /// Upper bound on a single signing request.
    #[serde(default)]
    pub sign_timeout_secs: Option<u64>,
    /// Fixed-point scale of order quantities.
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: u32,
}

/// Token contracts of the traded pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAddresses {
    pub base: Address,
    pub quote: Address,
    /// Asset the matcher fee is charged in.
    pub matcher_fee: Address,
}

fn default_amount_decimals() -> u32 {
    REFERENCE_DECIMALS
}

impl ExchangeConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `ORDER_SIGNER_RPC_URL`, `ORDER_SIGNER_EXCHANGE_ADDRESS`,
    /// `ORDER_SIGNER_BASE_ASSET`, `ORDER_SIGNER_QUOTE_ASSET`,
    /// `ORDER_SIGNER_MATCHER_FEE_ASSET` (defaults to the base asset),
    /// `ORDER_SIGNER_NETWORK_ID`, `ORDER_SIGNER_SIGN_TIMEOUT_SECS` and
    /// `ORDER_SIGNER_AMOUNT_DECIMALS`. A `.env` file is honoured.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::Config {
                message: format!("{}_{} environment variable not set", ENV_PREFIX, name),
            })
        };

        let base = parse_address("BASE_ASSET", &required("BASE_ASSET")?)?;
        let quote = parse_address("QUOTE_ASSET", &required("QUOTE_ASSET")?)?;
        let matcher_fee = match var("MATCHER_FEE_ASSET") {
            Some(raw) => parse_address("MATCHER_FEE_ASSET", &raw)?,
            None => base,
        };

        let config = Self {
            rpc_endpoint: var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_ENDPOINT.to_string()),
            exchange_address: parse_address("EXCHANGE_ADDRESS", &required("EXCHANGE_ADDRESS")?)?,
            assets: AssetAddresses {
                base,
                quote,
                matcher_fee,
            },
            network_id: parse_optional("NETWORK_ID", var("NETWORK_ID"))?,
            sign_timeout_secs: parse_optional("SIGN_TIMEOUT_SECS", var("SIGN_TIMEOUT_SECS"))?,
            amount_decimals: parse_optional("AMOUNT_DECIMALS", var("AMOUNT_DECIMALS"))?
                .unwrap_or(REFERENCE_DECIMALS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file (TOML, JSON or YAML by extension),
    /// with `ORDER_SIGNER__*` environment variables taking precedence.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.rpc_endpoint).map_err(|e| Error::Config {
            message: format!("Invalid RPC endpoint {:?}: {}", self.rpc_endpoint, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("Unsupported RPC scheme {:?}", url.scheme()),
            });
        }

        if self.assets.base == self.assets.quote {
            return Err(Error::Config {
                message: "Base and quote assets must differ".to_string(),
            });
        }

        if self.amount_decimals > 19 {
            return Err(Error::Config {
                message: format!(
                    "{} decimals cannot be represented in 64 bits",
                    self.amount_decimals
                ),
            });
        }

        Ok(())
    }

    /// Signing timeout, if configured.
    pub fn sign_timeout(&self) -> Option<Duration> {
        self.sign_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_address(name: &str, raw: &str) -> Result<Address> {
    raw.trim().parse().map_err(|e| Error::Config {
        message: format!("{}_{} is not a 20-byte address: {}", ENV_PREFIX, name, e),
    })
}

/// A variable that is set must parse; only an absent one falls back.
fn parse_optional<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|raw| {
        raw.trim().parse().map_err(|e| Error::Config {
            message: format!("{}_{} has invalid value {:?}: {}", ENV_PREFIX, name, raw, e),
        })
    })
    .transpose()
}
