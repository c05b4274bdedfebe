//! `pushd deliver` - run one payload through the pipeline

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::output::{describe_outcome, format_output};
use crate::notification::RawPushPayload;

#[derive(Args)]
pub struct DeliverArgs {
    /// Payload JSON file (reads stdin when omitted)
    #[arg(long, short)]
    pub file: Option<PathBuf>,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
    /// Build the render request but don't render it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_deliver(args: DeliverArgs, config_path: Option<&Path>) -> Result<()> {
    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading payload {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading payload from stdin")?;
            buf
        }
    };

    let payload: RawPushPayload = serde_json::from_str(&raw).context("parsing push payload")?;
    let core = super::build_core(config_path, args.dry_run)?;

    let outcome = core.on_message(payload).await?;
    println!("{}", format_output(&outcome, args.json, describe_outcome));
    Ok(())
}
