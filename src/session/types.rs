//! Session records and namespace definitions.
//!
//! Field names follow the sign protocol's JSON shapes (camelCase).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transaction::types::{AccountId, ChainId, ParseResult, TransactionError};

/// Peer metadata exchanged during pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

/// Capabilities requested for one namespace in a session proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProposalNamespace {
    pub methods: Vec<String>,
    pub chains: Vec<String>,
    pub events: Vec<String>,
}

/// Namespace key → requested capabilities.
pub type ProposalNamespaces = BTreeMap<String, ProposalNamespace>;

/// Capabilities the wallet granted for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionNamespace {
    pub accounts: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

/// An approved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Pairing identifier used to address later requests.
    pub topic: String,
    pub namespaces: BTreeMap<String, SessionNamespace>,
    /// Unix seconds after which the wallet drops the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<Metadata>,
}

impl Session {
    /// First authorized account in `namespace`.
    pub fn primary_account(&self, namespace: &str) -> ParseResult<AccountId> {
        let raw = self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.accounts.first())
            .ok_or_else(|| TransactionError::InvalidAccountId(format!("<no {namespace} account>")))?;
        raw.parse()
    }
}

/// Build the proposal used by the connect action.
///
/// The session may submit transactions on `chain` and emits connect/disconnect.
pub fn proposal_for(chain: &ChainId, method: &str) -> ProposalNamespaces {
    let mut namespaces = ProposalNamespaces::new();
    namespaces.insert(
        chain.namespace().to_string(),
        ProposalNamespace {
            methods: vec![method.to_string()],
            chains: vec![chain.to_string()],
            events: vec!["connect".to_string(), "disconnect".to_string()],
        },
    );
    namespaces
}
