//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required values are present (contract address, node endpoint)
//! - Validate value ranges (timeouts > 0, port valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.server.bind_address.parse::<SocketAddr>() {
        Ok(addr) if addr.port() == 0 => {
            errors.push(ValidationError::new("server.bind_address", "port must be non-zero"));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address '{}': {}", config.server.bind_address, e),
        )),
    }

    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    let chain = &config.chain;
    if chain.rpc_url.trim().is_empty() {
        errors.push(ValidationError::new("chain.rpc_url", "node endpoint is required"));
    } else if let Err(e) = chain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            "chain.rpc_url",
            format!("invalid URL '{}': {}", chain.rpc_url, e),
        ));
    }

    if chain.contract_address.trim().is_empty() {
        errors.push(ValidationError::new("chain.contract_address", "contract address is required"));
    } else if chain.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "chain.contract_address",
            format!("'{}' is not a 20-byte hex address", chain.contract_address),
        ));
    }

    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    if chain.confirmation_blocks == 0 {
        errors.push(ValidationError::new("chain.confirmation_blocks", "must be at least 1"));
    }
    if chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.confirmation_timeout_secs", "must be greater than 0"));
    }
    if chain.poll_interval_ms == 0 {
        errors.push(ValidationError::new("chain.poll_interval_ms", "must be greater than 0"));
    }
    if !(chain.gas_price_multiplier.is_finite() && chain.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new("chain.gas_price_multiplier", "must be a finite value >= 1.0"));
    }

    if config.gateway.queue_capacity == 0 {
        errors.push(ValidationError::new("gateway.queue_capacity", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.chain.contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_contract_address() {
        let errors = validate_config(&GatewayConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "chain.contract_address");
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid_config();
        config.server.bind_address = "not-an-address".to_string();
        config.chain.rpc_url = "::::".to_string();
        config.chain.confirmation_blocks = 0;
        config.gateway.queue_capacity = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "chain.rpc_url",
                "chain.confirmation_blocks",
                "gateway.queue_capacity",
            ]
        );
    }

    #[test]
    fn test_malformed_contract_address() {
        let mut config = valid_config();
        config.chain.contract_address = "0x1234".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("not a 20-byte hex address"));
    }
}
