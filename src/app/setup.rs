//! This module turns parsed arguments into configured library components.
use super::args::NodeArgs;
use anyhow::{bail, Context, Result};
use enterprise_seal::net::{HttpTransport, RetryPolicy};
use enterprise_seal::recipients::{FetchConfig, FetchMode};
use enterprise_seal::{EnterpriseSealer, NodeDescriptor};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Configures logging on stderr so stdout only carries results.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables debug output for
/// this crate.
pub fn configure_logging(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,enterprise_seal=debug"
    } else {
        "info"
    }
}

/// Resolves the node list, rejecting an empty one up front.
pub fn resolve_nodes(args: &NodeArgs) -> Result<Vec<NodeDescriptor>> {
    let nodes: Vec<NodeDescriptor> = args
        .nodes
        .iter()
        .map(|ip| ip.trim())
        .filter(|ip| !ip.is_empty())
        .map(NodeDescriptor::new)
        .collect();

    if nodes.is_empty() {
        bail!("No nodes given. Supply --node or set ENTERPRISE_SEAL_NODES.");
    }
    Ok(nodes)
}

/// Builds a sealer over an HTTP transport from the node arguments.
pub fn build_sealer(args: &NodeArgs) -> Result<EnterpriseSealer> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let retry = if args.retries == 0 {
        RetryPolicy::none()
    } else {
        RetryPolicy::with_retries(args.retries)
    };
    let transport = HttpTransport::new(timeout, retry).context("Failed to build HTTP client")?;

    let config = FetchConfig {
        default_port: args.port,
        // Covers the retry schedule as well as the request itself.
        per_node_timeout: Some(per_node_budget(timeout, args.retries)),
        mode: if args.concurrent {
            FetchMode::Concurrent
        } else {
            FetchMode::Sequential
        },
    };

    Ok(EnterpriseSealer::new(Arc::new(transport), config))
}

/// Time allowed for one node: every attempt at `timeout`, plus slack for backoff.
fn per_node_budget(timeout: Duration, retries: u32) -> Duration {
    timeout
        .saturating_mul(retries.saturating_add(1))
        .saturating_add(Duration::from_secs(5))
}

/// Returns `message`, or all of stdin when it is absent.
pub fn message_or_stdin(message: Option<String>) -> Result<String> {
    match message {
        Some(message) => Ok(message),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read message from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info_unless_verbose() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "info,enterprise_seal=debug");
    }

    #[test]
    fn per_node_budget_covers_every_attempt() {
        assert_eq!(per_node_budget(Duration::from_secs(10), 0), Duration::from_secs(15));
        assert_eq!(per_node_budget(Duration::from_secs(10), 2), Duration::from_secs(35));
    }

    #[test]
    fn per_node_budget_saturates_on_extreme_values() {
        assert_eq!(per_node_budget(Duration::from_secs(u64::MAX), u32::MAX), Duration::MAX);
    }

    #[test]
    fn build_sealer_accepts_extreme_timeouts_and_retries() {
        let args = NodeArgs {
            nodes: vec!["10.0.0.1".to_string()],
            port: 16127,
            timeout_secs: u64::MAX,
            retries: u32::MAX,
            concurrent: false,
        };

        let sealer = build_sealer(&args).unwrap();
        assert_eq!(sealer.config().per_node_timeout, Some(Duration::MAX));
    }
}
