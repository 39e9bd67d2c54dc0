//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check identifiers are well formed (CAIP-2 chain id, hex quantities)
//! - Validate URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use alloy::primitives::{Address, Bytes, U256};

use crate::config::schema::AppConfig;
use crate::transaction::types::ChainId;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
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

/// Validate a fully loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.project_id.trim().is_empty() {
        errors.push(ValidationError::new(
            "project_id",
            "must be set (WALLETCONNECT_PROJECT_ID)",
        ));
    }

    if let Err(e) = config.chain.id.parse::<ChainId>() {
        errors.push(ValidationError::new("chain.id", e.to_string()));
    }

    if let Err(e) = url::Url::parse(&config.chain.explorer_tx_url) {
        errors.push(ValidationError::new("chain.explorer_tx_url", e.to_string()));
    }

    match url::Url::parse(&config.bridge.url) {
        Ok(u) if u.scheme() == "ws" || u.scheme() == "wss" => {}
        Ok(u) => errors.push(ValidationError::new(
            "bridge.url",
            format!("unsupported scheme '{}', expected ws or wss", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("bridge.url", e.to_string())),
    }

    if config.bridge.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "bridge.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    if let Some(relay) = &config.bridge.relay_url {
        if let Err(e) = url::Url::parse(relay) {
            errors.push(ValidationError::new("bridge.relay_url", e.to_string()));
        }
    }

    if config.session.init_max_attempts == 0 {
        errors.push(ValidationError::new(
            "session.init_max_attempts",
            "must be at least 1",
        ));
    }

    if config.session.init_base_delay_ms > config.session.init_max_delay_ms {
        errors.push(ValidationError::new(
            "session.init_base_delay_ms",
            "must not exceed session.init_max_delay_ms",
        ));
    }

    let tx = &config.transaction;
    if tx.to.parse::<Address>().is_err() {
        errors.push(ValidationError::new("transaction.to", "not a valid address"));
    }
    if tx.data.parse::<Bytes>().is_err() {
        errors.push(ValidationError::new("transaction.data", "not valid hex data"));
    }
    for (field, value) in [
        ("transaction.gas_price", &tx.gas_price),
        ("transaction.gas_limit", &tx.gas_limit),
        ("transaction.value", &tx.value),
    ] {
        if value.parse::<U256>().is_err() {
            errors.push(ValidationError::new(field, "not a valid quantity"));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a valid socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
