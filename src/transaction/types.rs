//! Chain-agnostic identifiers and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing identifiers or building a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Not a `namespace:reference` pair.
    #[error("Invalid chain id '{0}': expected namespace:reference")]
    InvalidChainId(String),

    /// Not a `namespace:reference:address` triple.
    #[error("Invalid account id '{0}': expected namespace:reference:address")]
    InvalidAccountId(String),

    /// A transaction field could not be decoded.
    #[error("Invalid transaction field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Result type for identifier and payload parsing.
pub type ParseResult<T> = Result<T, TransactionError>;

/// CAIP-2 chain identifier, e.g. `eip155:5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    namespace: String,
    reference: String,
}

impl ChainId {
    /// Namespace part (`eip155`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reference part (`5`).
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for ChainId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if valid_segment(namespace) && valid_segment(reference) => {
                Ok(Self {
                    namespace: namespace.to_string(),
                    reference: reference.to_string(),
                })
            }
            _ => Err(TransactionError::InvalidChainId(s.to_string())),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

/// CAIP-10 account identifier, e.g. `eip155:5:0xABC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId {
    chain: ChainId,
    address: String,
}

impl AccountId {
    /// The chain this account lives on.
    pub fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// Address with the `namespace:reference:` prefix removed.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl FromStr for AccountId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(namespace), Some(reference), Some(address)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(TransactionError::InvalidAccountId(s.to_string()));
        };

        if address.is_empty() || address.contains(':') {
            return Err(TransactionError::InvalidAccountId(s.to_string()));
        }

        let chain = format!("{}:{}", namespace, reference)
            .parse()
            .map_err(|_| TransactionError::InvalidAccountId(s.to_string()))?;

        Ok(Self {
            chain,
            address: address.to_string(),
        })
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Opaque value the wallet returned for a request, usually a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionResult(pub String);

impl TransactionResult {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Block explorer page for this result.
    pub fn explorer_link(&self, explorer_tx_url: &str) -> String {
        format!("{}{}", explorer_tx_url, self.0)
    }
}

impl fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
