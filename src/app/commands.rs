//! Handlers for each subcommand. Results go to stdout, diagnostics to stderr.
use super::args::NodeArgs;
use super::setup::{build_sealer, message_or_stdin, resolve_nodes};
use anyhow::Result;
use enterprise_seal::crypto::{
    decrypt_envelope, encrypt_envelope, import_recipient_key, split_envelope, wrap_symmetric_key,
    KeyParsePolicy, SymmetricKey,
};
use tracing::info;

pub async fn fetch_keys(args: NodeArgs) -> Result<()> {
    let nodes = resolve_nodes(&args)?;
    let sealer = build_sealer(&args)?;

    let results = sealer.key_results(&nodes).await;
    for result in &results {
        match &result.outcome {
            Ok(key) => println!("# {}\n{}", result.node.ip, key),
            Err(e) => eprintln!("# {}: {}", result.node.ip, e),
        }
    }

    let keys = enterprise_seal::recipients::aggregate_keys(results)?;
    info!("{} key(s) available", keys.len());
    Ok(())
}

pub async fn seal(args: NodeArgs, message: Option<String>, skip_malformed_keys: bool) -> Result<()> {
    let nodes = resolve_nodes(&args)?;
    let policy = if skip_malformed_keys {
        KeyParsePolicy::Skip
    } else {
        KeyParsePolicy::Abort
    };
    let sealer = build_sealer(&args)?.with_parse_policy(policy);

    let plaintext = message_or_stdin(message)?;
    let ciphertext = sealer.seal(&plaintext, &nodes).await?;
    println!("{}", ciphertext);
    Ok(())
}

pub fn envelope(spki: &str, key: &str, message: Option<String>) -> Result<()> {
    let recipient = import_recipient_key(spki)?;
    let symmetric_key = SymmetricKey::from_base64(key)?;

    let wrapped = wrap_symmetric_key(symmetric_key.as_ref(), &recipient)?;
    let plaintext = message_or_stdin(message)?;
    let envelope = encrypt_envelope(&plaintext, &symmetric_key, &wrapped)?;

    info!(
        "Envelope built; wrapped key occupies the first {} bytes",
        recipient.wrapped_key_len()
    );
    println!("{}", envelope);
    Ok(())
}

pub fn open(key: &str, envelope: &str, wrapped_key_len: usize) -> Result<()> {
    let symmetric_key = SymmetricKey::from_base64(key)?;

    let remainder = if wrapped_key_len == 0 {
        envelope.to_string()
    } else {
        split_envelope(envelope, wrapped_key_len)?.remainder_base64()
    };

    let plaintext = decrypt_envelope(&remainder, &symmetric_key)?;
    println!("{}", plaintext);
    Ok(())
}
