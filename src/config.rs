// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 BandPay

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into a
//! [`Settings`] value. Missing or malformed required variables abort
//! startup with a [`ConfigError`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for the embedded database | `/data` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CHAIN_RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `CHAIN_ID` | Chain ID for signed transactions | `80002` (Polygon Amoy) |
//! | `TOKEN_CONTRACT_ADDRESS` | ERC-20 token contract | Required |
//! | `OWNER_ADDRESS` | Privileged signing identity (store wallet) | Required |
//! | `OWNER_PRIVATE_KEY` | Owner key, hex without `0x` | Required |
//! | `GAS_TOPUP_THRESHOLD` | Native balance below which gas is sent | `0.05` |
//! | `GAS_TOPUP_AMOUNT` | Native amount sent per top-up | `0.1` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use url::Url;

/// Default native-balance threshold below which a wallet gets a gas top-up.
pub const DEFAULT_GAS_TOPUP_THRESHOLD: &str = "0.05";

/// Default native amount sent per gas top-up.
pub const DEFAULT_GAS_TOPUP_AMOUNT: &str = "0.1";

/// How long to wait for a submitted transaction to be mined.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Blockchain-side configuration.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// EVM JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Chain ID used when signing transactions.
    pub chain_id: u64,
    /// ERC-20 token contract address (0x-prefixed).
    pub token_address: String,
    /// Owner/store address: fallback settlement target and gas funder.
    pub owner_address: String,
    /// Owner private key, hex without `0x`. Never logged.
    pub owner_private_key: String,
    /// Native balance below which a custodial wallet is topped up.
    pub gas_topup_threshold: Decimal,
    /// Native amount sent per top-up.
    pub gas_topup_amount: Decimal,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub chain: ChainSettings,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", "8080")?;
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "/data".to_string()));

        Ok(Self {
            host,
            port,
            data_dir,
            chain: ChainSettings::from_env()?,
        })
    }
}

impl ChainSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_raw = require_var("CHAIN_RPC_URL")?;
        let rpc_url = rpc_raw
            .parse()
            .map_err(|e: url::ParseError| ConfigError::Invalid {
                name: "CHAIN_RPC_URL",
                reason: e.to_string(),
            })?;

        Ok(Self {
            rpc_url,
            chain_id: parse_var("CHAIN_ID", "80002")?,
            token_address: require_var("TOKEN_CONTRACT_ADDRESS")?,
            owner_address: require_var("OWNER_ADDRESS")?,
            owner_private_key: require_var("OWNER_PRIVATE_KEY")?,
            gas_topup_threshold: parse_var("GAS_TOPUP_THRESHOLD", DEFAULT_GAS_TOPUP_THRESHOLD)?,
            gas_topup_amount: parse_var("GAS_TOPUP_AMOUNT", DEFAULT_GAS_TOPUP_AMOUNT)?,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_var<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gas_constants_parse() {
        let threshold: Decimal = DEFAULT_GAS_TOPUP_THRESHOLD.parse().unwrap();
        let amount: Decimal = DEFAULT_GAS_TOPUP_AMOUNT.parse().unwrap();
        assert!(threshold < amount);
        assert_eq!(threshold, Decimal::new(5, 2));
        assert_eq!(amount, Decimal::new(1, 1));
    }

    #[test]
    fn confirmation_timeout_is_two_minutes() {
        assert_eq!(CONFIRMATION_TIMEOUT.as_secs(), 120);
    }
}
