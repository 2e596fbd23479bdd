// src/config.rs
use std::env;
use std::str::FromStr;

use ethers::providers::Http;
use ethers::types::Address;
use thiserror::Error;

use crate::chain::{get_chain_from_id, ChainDescriptor};
use crate::contracts::ENTRY_POINT_V0_6;
use crate::error::RelayError;

pub const BUNDLER_URL: &str = "BUNDLER_URL";
pub const PAYMASTER_URL: &str = "PAYMASTER_URL";
pub const PROJECT_ID: &str = "PROJECT_ID";
pub const CHAIN_ID: &str = "CHAIN_ID";
pub const SPONSOR_BY_DEFAULT: &str = "SPONSOR_BY_DEFAULT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bundler_url: String,
    pub paymaster_url: String,
    pub project_id: Option<String>,
    pub chain_id: Option<u64>,
    pub sponsor_by_default: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset,
    /// and every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let required = [BUNDLER_URL, PAYMASTER_URL];
        let missing: Vec<&'static str> = required
            .into_iter()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let bundler_url = parse_url(BUNDLER_URL, get(BUNDLER_URL))?;
        let paymaster_url = parse_url(PAYMASTER_URL, get(PAYMASTER_URL))?;

        let chain_id = get(CHAIN_ID)
            .map(|value| {
                let id = value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: CHAIN_ID,
                    reason: e.to_string(),
                })?;
                get_chain_from_id(id).map_err(|e| ConfigError::Invalid {
                    name: CHAIN_ID,
                    reason: e.to_string(),
                })?;
                Ok(id)
            })
            .transpose()?;

        let sponsor_by_default = match get(SPONSOR_BY_DEFAULT) {
            None => true,
            Some(value) => value.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                name: SPONSOR_BY_DEFAULT,
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            bundler_url,
            paymaster_url,
            project_id: get(PROJECT_ID).map(|value| value.trim().to_string()),
            chain_id,
            sponsor_by_default,
        })
    }

    pub fn bundler_endpoint(&self, project_id: &str) -> String {
        endpoint(&self.bundler_url, project_id)
    }

    pub fn paymaster_endpoint(&self, project_id: &str) -> String {
        endpoint(&self.paymaster_url, project_id)
    }

    /// The request's project id, or the configured one.
    pub fn project_id<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, RelayError> {
        requested
            .filter(|id| !id.trim().is_empty())
            .or(self.project_id.as_deref())
            .ok_or(RelayError::MissingProjectId)
    }

    /// The request's chain, or the configured one.
    pub fn chain(&self, requested: Option<u64>) -> Result<ChainDescriptor, RelayError> {
        let id = requested.or(self.chain_id).ok_or(RelayError::MissingChainId)?;
        get_chain_from_id(id)
    }
}

/// Parses an entry point override, falling back to v0.6.
pub fn entry_point(requested: Option<&str>) -> Result<Address, RelayError> {
    match requested {
        Some(address) => parse_address(address),
        None => Ok(ENTRY_POINT_V0_6),
    }
}

pub fn parse_address(value: &str) -> Result<Address, RelayError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| RelayError::InvalidAddress(value.to_string()))
}

fn parse_url(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(vec![name]))?;
    let value = value.trim().trim_end_matches('/').to_string();
    Http::from_str(&value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    Ok(value)
}

fn endpoint(base: &str, project_id: &str) -> String {
    format!("{}/{}", base, project_id)
}
