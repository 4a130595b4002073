//! Fan-out of key requests to candidate nodes and aggregation of the results.
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::endpoint::{node_key_endpoint, FetchConfig, FetchMode};
use crate::crypto::ArmoredPublicKey;
use crate::error::{CryptoError, KeyFetchError, Result};
use crate::net::Transport;
use crate::types::{KeyEndpointResponse, NodeDescriptor};

/// Outcome of asking a single node for its key.
#[derive(Debug)]
pub struct NodeKeyResult {
    pub node: NodeDescriptor,
    pub outcome: Result<ArmoredPublicKey, KeyFetchError>,
}

impl NodeKeyResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Parses a key endpoint body into the armored key it carries.
fn parse_key_response(body: &[u8]) -> Result<ArmoredPublicKey, KeyFetchError> {
    let response: KeyEndpointResponse =
        serde_json::from_slice(body).map_err(|e| KeyFetchError::Malformed(e.to_string()))?;

    if !response.is_success() {
        let detail = match response.data {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(KeyFetchError::Status {
            status: response.status,
            detail,
        });
    }

    match response.data {
        serde_json::Value::String(armored) if !armored.trim().is_empty() => {
            Ok(ArmoredPublicKey::from(armored))
        }
        _ => Err(KeyFetchError::Malformed(
            "success response without a key payload".to_string(),
        )),
    }
}

/// Requests and parses one node's key.
pub async fn fetch_node_key<T>(
    transport: &T,
    node: &NodeDescriptor,
    config: &FetchConfig,
) -> Result<ArmoredPublicKey, KeyFetchError>
where
    T: Transport + ?Sized,
{
    let url = node_key_endpoint(node, config);

    let body = match config.per_node_timeout {
        Some(limit) => tokio::time::timeout(limit, transport.fetch(&url))
            .await
            .map_err(|_| KeyFetchError::Timeout(limit))??,
        None => transport.fetch(&url).await?,
    };

    parse_key_response(&body)
}

async fn fetch_logged<T>(transport: &T, node: &NodeDescriptor, config: &FetchConfig) -> NodeKeyResult
where
    T: Transport + ?Sized,
{
    let outcome = fetch_node_key(transport, node, config).await;
    match &outcome {
        Ok(_) => debug!("Fetched PGP key for {}", node.ip),
        Err(e) => warn!("Failed to fetch key for {}: {}", node.ip, e),
    }

    NodeKeyResult {
        node: node.clone(),
        outcome,
    }
}

/// Asks every node for its key and reports one result per node, in input
/// order. Individual failures are logged and recorded, never raised.
pub async fn collect_key_results<T>(
    transport: &T,
    nodes: &[NodeDescriptor],
    config: &FetchConfig,
) -> Vec<NodeKeyResult>
where
    T: Transport + ?Sized,
{
    match config.mode {
        FetchMode::Sequential => {
            let mut results = Vec::with_capacity(nodes.len());
            for node in nodes {
                results.push(fetch_logged(transport, node, config).await);
            }
            results
        }
        FetchMode::Concurrent => {
            join_all(nodes.iter().map(|node| fetch_logged(transport, node, config))).await
        }
    }
}

/// Keeps the keys from successful nodes.
///
/// # Errors
///
/// Returns [`CryptoError::NoKeysAvailable`] if no node produced a key.
pub fn aggregate_keys(results: Vec<NodeKeyResult>) -> Result<Vec<ArmoredPublicKey>> {
    let attempted = results.len();
    let keys: Vec<ArmoredPublicKey> = results
        .into_iter()
        .filter_map(|result| result.outcome.ok())
        .collect();

    if keys.is_empty() {
        return Err(CryptoError::NoKeysAvailable { attempted });
    }

    info!("Collected {} of {} enterprise node keys", keys.len(), attempted);
    Ok(keys)
}

/// Fetches recipient keys from `nodes`, tolerating individual node failures.
///
/// # Errors
///
/// Returns [`CryptoError::NoKeysAvailable`] if every node failed.
pub async fn fetch_recipient_keys<T>(
    transport: &T,
    nodes: &[NodeDescriptor],
    config: &FetchConfig,
) -> Result<Vec<ArmoredPublicKey>>
where
    T: Transport + ?Sized,
{
    aggregate_keys(collect_key_results(transport, nodes, config).await)
}
