use std::env;
use std::net::SocketAddr;

use crate::error::{CcaError, CcaResult};

pub const DEFAULT_MONGODB_DATABASE: &str = "cca";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings read from the environment (and `.env`) at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub bind_address: SocketAddr,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> CcaResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CcaResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| CcaError::Config(format!("{} must be set", key)))
        };
        let optional = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                tracing::debug!("{} not set, using default: {}", key, default);
                default.to_owned()
            })
        };

        let bind_address = optional("BIND_ADDRESS", DEFAULT_BIND_ADDRESS);

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            mongodb_uri: required("MONGODB_URI")?,
            mongodb_database: optional("MONGODB_DATABASE", DEFAULT_MONGODB_DATABASE),
            bind_address: bind_address.parse().map_err(|err| {
                CcaError::Config(format!("invalid BIND_ADDRESS {}: {}", bind_address, err))
            })?,
            log_level: optional("LOG_LEVEL", DEFAULT_LOG_LEVEL),
        })
    }
}
