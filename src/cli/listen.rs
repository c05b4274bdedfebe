//! `pushd listen` - stand-in for the transport callback
//!
//! Reads newline-delimited JSON payloads from stdin and hands each to the
//! delivery core on its own task, so near-simultaneous pushes really do
//! race through the router.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::output::{describe_outcome, describe_stats, format_output};
use crate::notification::{DeliveryCore, RawPushPayload};

#[derive(Args)]
pub struct ListenArgs {
    /// Build render requests but don't render them
    #[arg(long)]
    pub dry_run: bool,
    /// How often to purge expired dedup entries (seconds)
    #[arg(long, default_value = "60")]
    pub purge_interval: u64,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_listen(args: ListenArgs, config_path: Option<&Path>) -> Result<()> {
    let core = Arc::new(super::build_core(config_path, args.dry_run)?);
    info!(renderer = core.renderer_name(), "Listening for push payloads on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let mut purge = tokio::time::interval(Duration::from_secs(args.purge_interval.max(1)));
    purge.tick().await;

    let mut line_no = 0usize;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<RawPushPayload>(&line) {
                    Ok(payload) => {
                        tasks.spawn(handle_one(Arc::clone(&core), payload, args.json));
                    }
                    Err(e) => warn!(line = line_no, error = %e, "Skipping malformed payload"),
                }
            }
            _ = purge.tick() => {
                let purged = core.purge_expired();
                if purged > 0 {
                    debug!(purged, "Purged expired dedup entries");
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Delivery task failed");
                }
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Delivery task failed");
        }
    }

    let stats = core.stats();
    eprintln!("{}", format_output(&stats, args.json, describe_stats));
    Ok(())
}

async fn handle_one(core: Arc<DeliveryCore>, payload: RawPushPayload, json: bool) {
    // errors are logged inside the core; just report the outcome
    if let Ok(outcome) = core.on_message(payload).await {
        println!("{}", format_output(&outcome, json, describe_outcome));
    }
}
