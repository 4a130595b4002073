use std::time::Duration;

use crate::types::NodeDescriptor;

/// Port a node's key service listens on when the descriptor names none.
pub const DEFAULT_NODE_PORT: u16 = 16127;

/// Path of the armored PGP key on every node.
pub const KEY_ENDPOINT_PATH: &str = "/flux/pgp";

/// How per-node requests are scheduled. Result order follows the input
/// order in both modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Sequential,
    Concurrent,
}

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub default_port: u16,
    /// Abandon a node after this long; other nodes are unaffected.
    pub per_node_timeout: Option<Duration>,
    pub mode: FetchMode,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_NODE_PORT,
            per_node_timeout: None,
            mode: FetchMode::Sequential,
        }
    }
}

/// Whether `ip` already names a port. Bracketed IPv6 literals only count when
/// followed by `:port`.
fn has_explicit_port(ip: &str) -> bool {
    if ip.starts_with('[') {
        ip.contains("]:")
    } else {
        ip.contains(':')
    }
}

/// URL of `node`'s key endpoint.
pub fn node_key_endpoint(node: &NodeDescriptor, config: &FetchConfig) -> String {
    let ip = node.ip.trim();
    if has_explicit_port(ip) {
        format!("http://{}{}", ip, KEY_ENDPOINT_PATH)
    } else {
        format!("http://{}:{}{}", ip, config.default_port, KEY_ENDPOINT_PATH)
    }
}
