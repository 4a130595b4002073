pub mod args;
mod commands;
mod setup;

pub use args::AppArgs;

use anyhow::Result;
use args::Command;

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    setup::configure_logging(args.verbose);

    match args.command {
        Command::FetchKeys(nodes) => commands::fetch_keys(nodes).await,
        Command::Seal {
            nodes,
            message,
            skip_malformed_keys,
        } => commands::seal(nodes, message, skip_malformed_keys).await,
        Command::Envelope { spki, key, message } => commands::envelope(&spki, &key, message),
        Command::Open {
            key,
            envelope,
            wrapped_key_len,
        } => commands::open(&key, &envelope, wrapped_key_len),
    }
}
