//! Identity registry operations: register agents, manage their URI and
//! metadata, and read them back.

use std::sync::Arc;

use alloy::primitives::{hex, Bytes, TxHash, U256};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::transaction::{SubmitOptions, TxSubmitter};
use crate::blockchain::types::{BlockchainResult, Submission, WaitMode};
use crate::contracts::abi::IIdentityRegistry;
use crate::contracts::{read, ContractEndpoint};
use crate::identity::extractor::extract_registered_id;

/// One metadata key/value pair stored with an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataItem {
    pub key: String,
    pub value: Bytes,
}

impl MetadataItem {
    /// Text value, stored as its UTF-8 bytes.
    pub fn text(key: impl Into<String>, value: &str) -> Self {
        Self {
            key: key.into(),
            value: Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Known only when the receipt was awaited.
    pub agent_id: Option<U256>,
    pub tx_hash: TxHash,
}

/// Outcome of comparing on-chain agent data with expectations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentVerification {
    pub token_uri: Option<String>,
    /// `(key, expected, actual)`; `actual` is `None` when the lookup failed.
    pub mismatches: Vec<(String, String, Option<String>)>,
}

impl AgentVerification {
    pub fn passed(&self) -> bool {
        self.token_uri.is_some() && self.mismatches.is_empty()
    }
}

/// Decode metadata bytes for display.
///
/// Empty → `""`; valid UTF-8 → the text; anything else → `0x`-prefixed hex.
/// Metadata content is caller-defined, so undecodable bytes are not an error.
pub fn decode_metadata(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) => text.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, len = value.len(), "Metadata is not UTF-8, rendering as hex");
            hex::encode_prefixed(value)
        }
    }
}

/// Client for the identity registry contract.
pub struct AgentRegistry<R> {
    rpc: Arc<R>,
    submitter: Arc<TxSubmitter<R>>,
    endpoint: ContractEndpoint,
}

impl<R> Clone for AgentRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            submitter: self.submitter.clone(),
            endpoint: self.endpoint,
        }
    }
}

impl<R: ChainRpc> AgentRegistry<R> {
    pub fn new(rpc: Arc<R>, submitter: Arc<TxSubmitter<R>>, endpoint: ContractEndpoint) -> Self {
        Self {
            rpc,
            submitter,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &ContractEndpoint {
        &self.endpoint
    }

    /// Register a new agent.
    ///
    /// With [`WaitMode::FireAndForget`] the agent ID is unknown and returned
    /// as `None`; otherwise it is read from the `Registered` event.
    pub async fn register_agent(
        &self,
        token_uri: &str,
        metadata: &[MetadataItem],
        wait: WaitMode,
    ) -> BlockchainResult<Registration> {
        tracing::info!(token_uri, metadata_count = metadata.len(), "Registering agent");

        let call = IIdentityRegistry::registerCall {
            tokenURI: token_uri.to_string(),
            metadata: metadata
                .iter()
                .map(|item| IIdentityRegistry::MetadataEntry {
                    key: item.key.clone(),
                    value: item.value.clone(),
                })
                .collect(),
        };

        let submission = self
            .submitter
            .submit(&self.endpoint, &call, SubmitOptions::new(wait))
            .await?;

        let agent_id = match submission.outcome() {
            Some(outcome) => Some(extract_registered_id(outcome)?),
            None => None,
        };
        if let Some(id) = agent_id {
            tracing::info!(agent_id = %id, tx_hash = %submission.tx_hash(), "Agent registered");
        }

        Ok(Registration {
            agent_id,
            tx_hash: submission.tx_hash(),
        })
    }

    /// Point an agent at a new registration file.
    pub async fn set_agent_uri(&self, agent_id: U256, new_uri: &str, wait: WaitMode) -> BlockchainResult<Submission> {
        let call = IIdentityRegistry::setAgentUriCall {
            agentId: agent_id,
            newUri: new_uri.to_string(),
        };
        self.submitter.submit(&self.endpoint, &call, SubmitOptions::new(wait)).await
    }

    /// Set one metadata entry on an agent.
    pub async fn set_metadata(&self, agent_id: U256, item: &MetadataItem, wait: WaitMode) -> BlockchainResult<Submission> {
        let call = IIdentityRegistry::setMetadataCall {
            agentId: agent_id,
            key: item.key.clone(),
            value: item.value.clone(),
        };
        self.submitter.submit(&self.endpoint, &call, SubmitOptions::new(wait)).await
    }

    /// Raw metadata bytes.
    pub async fn metadata(&self, agent_id: U256, key: &str) -> BlockchainResult<Bytes> {
        let call = IIdentityRegistry::getMetadataCall {
            agentId: agent_id,
            key: key.to_string(),
        };
        read(self.rpc.as_ref(), &self.endpoint, &call).await
    }

    /// Metadata rendered by [`decode_metadata`].
    pub async fn metadata_decoded(&self, agent_id: U256, key: &str) -> BlockchainResult<String> {
        let value = self.metadata(agent_id, key).await?;
        Ok(decode_metadata(&value))
    }

    pub async fn token_uri(&self, agent_id: U256) -> BlockchainResult<String> {
        let call = IIdentityRegistry::tokenURICall { tokenId: agent_id };
        read(self.rpc.as_ref(), &self.endpoint, &call).await
    }

    /// Compare the agent's token URI and metadata with `expected`.
    ///
    /// Lookup failures are recorded as mismatches rather than returned.
    pub async fn verify_agent(&self, agent_id: U256, expected: &[(&str, &str)]) -> AgentVerification {
        let mut verification = AgentVerification::default();

        match self.token_uri(agent_id).await {
            Ok(uri) => verification.token_uri = Some(uri),
            Err(e) => tracing::warn!(agent_id = %agent_id, error = %e, "Token URI lookup failed"),
        }

        for (key, want) in expected {
            match self.metadata_decoded(agent_id, key).await {
                Ok(actual) if actual == *want => {}
                Ok(actual) => {
                    tracing::warn!(agent_id = %agent_id, key, expected = want, actual = %actual, "Metadata mismatch");
                    verification
                        .mismatches
                        .push((key.to_string(), want.to_string(), Some(actual)));
                }
                Err(e) => {
                    tracing::warn!(agent_id = %agent_id, key, error = %e, "Metadata lookup failed");
                    verification
                        .mismatches
                        .push((key.to_string(), want.to_string(), None));
                }
            }
        }

        verification
    }
}
