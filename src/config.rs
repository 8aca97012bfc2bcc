//! Server configuration read from the environment at startup.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `8080` |
//! | `BIND_ADDRESS` | `0.0.0.0` |
//!
//! Azure settings are not part of this: the applier factory reads them on
//! every tag-apply request (see [`AzureSettings`](crate::tagging::AzureSettings)).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),

    #[error("invalid BIND_ADDRESS {0:?}")]
    InvalidBindAddress(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_address: IpAddr,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(address) = var("BIND_ADDRESS") {
            config.bind_address = address
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddress(address))?;
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
