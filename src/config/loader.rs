//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Node endpoint override.
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";
/// Deployed contract address override.
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";
/// Listening port override.
pub const PORT_ENV_VAR: &str = "PORT";
/// Chain ID override.
pub const CHAIN_ID_ENV_VAR: &str = "CHAIN_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let mut errors = apply_env_overrides(&mut config, env);
    if let Err(validation) = validate_config(&config) {
        errors.extend(validation);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

/// Overlay environment variables onto a configuration.
///
/// Returns errors for values that could not be interpreted.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(url) = env(RPC_URL_ENV_VAR) {
        config.chain.rpc_url = url;
    }
    if let Some(address) = env(CONTRACT_ADDRESS_ENV_VAR) {
        config.chain.contract_address = address;
    }
    if let Some(chain_id) = env(CHAIN_ID_ENV_VAR) {
        match chain_id.trim().parse() {
            Ok(id) => config.chain.chain_id = id,
            Err(_) => errors.push(ValidationError {
                field: "CHAIN_ID",
                message: format!("'{}' is not a chain id", chain_id),
            }),
        }
    }
    if let Some(port) = env(PORT_ENV_VAR) {
        match port.trim().parse::<u16>() {
            Ok(port) => {
                let host = config
                    .server
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "0.0.0.0".to_string());
                config.server.bind_address = format!("{}:{}", host, port);
            }
            Err(_) => errors.push(ValidationError {
                field: "PORT",
                message: format!("'{}' is not a port number", port),
            }),
        }
    }

    errors
}
