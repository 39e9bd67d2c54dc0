//! The fixed `eth_sendTransaction` payload.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::config::TransactionConfig;
use crate::transaction::types::{TransactionError, ParseResult};

/// JSON-RPC method the session is authorized for.
pub const SEND_TRANSACTION_METHOD: &str = "eth_sendTransaction";

/// Transaction object in the shape wallets accept for `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub value: U256,
}

impl TransactionPayload {
    /// Build the payload sent from `from` using the configured constants.
    pub fn from_config(from: &str, config: &TransactionConfig) -> ParseResult<Self> {
        Ok(Self {
            from: parse_field("from", from)?,
            to: parse_field("to", &config.to)?,
            data: parse_field("data", &config.data)?,
            gas_price: parse_field("gas_price", &config.gas_price)?,
            gas_limit: parse_field("gas_limit", &config.gas_limit)?,
            value: parse_field("value", &config.value)?,
        })
    }

    /// JSON-RPC params array for the request.
    pub fn to_params(&self) -> serde_json::Value {
        serde_json::json!([self])
    }
}

fn parse_field<T>(field: &'static str, raw: &str) -> ParseResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| TransactionError::InvalidField {
        field,
        reason: e.to_string(),
    })
}
