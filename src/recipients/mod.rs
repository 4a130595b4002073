//! The multi-recipient orchestrator.
//!
//! Gathers PGP keys from a set of enterprise nodes and encrypts a payload so
//! that any one of them can read it.
pub mod endpoint;
pub mod fetch;

pub use endpoint::{node_key_endpoint, FetchConfig, FetchMode, DEFAULT_NODE_PORT, KEY_ENDPOINT_PATH};
pub use fetch::{aggregate_keys, collect_key_results, fetch_node_key, fetch_recipient_keys, NodeKeyResult};

use std::sync::Arc;
use tracing::info;

use crate::crypto::{encrypt_for_recipients_with, ArmoredPublicKey, KeyParsePolicy};
use crate::error::{CryptoError, Result};
use crate::net::Transport;
use crate::types::NodeDescriptor;

/// Fetches node keys over a shared transport and seals payloads for them.
#[derive(Clone)]
pub struct EnterpriseSealer {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
    parse_policy: KeyParsePolicy,
}

impl EnterpriseSealer {
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self {
            transport,
            config,
            parse_policy: KeyParsePolicy::default(),
        }
    }

    pub fn with_parse_policy(mut self, policy: KeyParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One result per node, in input order.
    pub async fn key_results(&self, nodes: &[NodeDescriptor]) -> Vec<NodeKeyResult> {
        collect_key_results(self.transport.as_ref(), nodes, &self.config).await
    }

    /// # Errors
    ///
    /// Returns [`CryptoError::NoKeysAvailable`] if every node failed.
    pub async fn fetch_keys(&self, nodes: &[NodeDescriptor]) -> Result<Vec<ArmoredPublicKey>> {
        fetch_recipient_keys(self.transport.as_ref(), nodes, &self.config).await
    }

    /// Encrypts `plaintext` for already known keys. The OpenPGP work runs on
    /// the blocking pool.
    pub async fn seal_for_keys(&self, plaintext: &str, keys: Vec<ArmoredPublicKey>) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let policy = self.parse_policy;

        tokio::task::spawn_blocking(move || encrypt_for_recipients_with(&plaintext, &keys, policy))
            .await
            .map_err(|e| CryptoError::Encryption(format!("encryption task failed: {}", e)))?
    }

    /// Fetches keys from `nodes` and encrypts `plaintext` for all that answered.
    ///
    /// # Errors
    ///
    /// Fails with [`CryptoError::NoKeysAvailable`] when no node answered, and
    /// otherwise with whatever [`encrypt_for_recipients_with`] reports.
    pub async fn seal(&self, plaintext: &str, nodes: &[NodeDescriptor]) -> Result<String> {
        let keys = self.fetch_keys(nodes).await?;
        info!("Sealing payload for {} enterprise node(s)", keys.len());
        self.seal_for_keys(plaintext, keys).await
    }
}
