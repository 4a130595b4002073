use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "enterprise-seal")]
#[command(about = "Encrypt payloads for enterprise nodes")]
pub struct AppArgs {
    #[arg(short, long, global = true, help = "Enable debug logging for this tool")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch and print the PGP keys of the given nodes
    FetchKeys(NodeArgs),
    /// Encrypt a message for every node that returns a key
    Seal {
        #[command(flatten)]
        nodes: NodeArgs,

        #[arg(long, help = "Message to encrypt (read from stdin if omitted)")]
        message: Option<String>,

        #[arg(long, help = "Skip nodes whose key cannot be parsed instead of failing")]
        skip_malformed_keys: bool,
    },
    /// Wrap a symmetric key for an RSA recipient and build an envelope
    Envelope {
        #[arg(long, help = "Base64 SPKI RSA public key of the recipient")]
        spki: String,

        #[arg(long, env = "ENTERPRISE_SEAL_AES_KEY", help = "Base64 AES-256 key")]
        key: String,

        #[arg(long, help = "Message to encrypt (read from stdin if omitted)")]
        message: Option<String>,
    },
    /// Decrypt an envelope produced by `envelope`
    Open {
        #[arg(long, env = "ENTERPRISE_SEAL_AES_KEY", help = "Base64 AES-256 key")]
        key: String,

        #[arg(long, help = "Base64 envelope")]
        envelope: String,

        #[arg(
            long,
            default_value_t = 0,
            help = "Length of the wrapped-key prefix in bytes (0 if already stripped)"
        )]
        wrapped_key_len: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    #[arg(
        long = "node",
        env = "ENTERPRISE_SEAL_NODES",
        value_delimiter = ',',
        help = "Node address, optionally host:port (repeatable)"
    )]
    pub nodes: Vec<String>,

    #[arg(long, default_value_t = enterprise_seal::recipients::DEFAULT_NODE_PORT, help = "Port used when a node has none")]
    pub port: u16,

    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=3600),
        help = "Per-request timeout in seconds"
    )]
    pub timeout_secs: u64,

    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=100),
        help = "Transport-level retries per node"
    )]
    pub retries: u32,

    #[arg(long, help = "Query all nodes at once instead of one after another")]
    pub concurrent: bool,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
