//! The main entry point for the enterprise-seal command-line tool.
mod app;

use anyhow::Result;

/// Parses the command line and runs the selected subcommand.
///
/// # Errors
///
/// Returns an error if the subcommand fails; nothing partial is printed to
/// stdout in that case.
#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
