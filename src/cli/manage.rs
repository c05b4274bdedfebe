//! Token, channel, history and config commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::path::Path;

use super::output::format_output;
use crate::config::{DeliveryConfig, RendererConfig};
use crate::notification::renderers::{JournalEntry, JournalRenderer};
use crate::notification::token::mask_token;
use crate::notification::ChannelSpec;

#[derive(Args)]
pub struct TokenArgs {
    /// Registration token handed out by the transport
    pub token: String,
}

/// Token refresh callback: record and persist the new token
pub fn handle_token(args: TokenArgs, config_path: Option<&Path>) -> Result<()> {
    let core = super::build_core(config_path, false)?;
    if core.on_new_token(&args.token) {
        core.tokens().save_to(&super::token_path(config_path))?;
        println!("token updated: {}", mask_token(args.token.trim()));
    } else {
        println!("token unchanged");
    }
    Ok(())
}

#[derive(Args)]
pub struct ChannelsArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/// Channels the host app must register at startup
pub fn handle_channels(args: ChannelsArgs, config_path: Option<&Path>) -> Result<()> {
    let config = DeliveryConfig::load(config_path)?;
    let specs: Vec<ChannelSpec> = config.channels.channel_specs().into_iter().cloned().collect();

    println!(
        "{}",
        format_output(&specs, args.json, |specs| {
            specs
                .iter()
                .map(|s| {
                    format!(
                        "{:<26} {:<8} {} (vibration: {:?}, sound: {}, badge: {}, lights: {})",
                        s.id, s.importance, s.name, s.vibration_pattern, s.sound, s.show_badge, s.enable_lights
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    );
    Ok(())
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Show the most recent N entries
    #[arg(long, short, default_value = "20")]
    pub limit: usize,
    /// One entry per notification slot (what is currently visible)
    #[arg(long)]
    pub slots: bool,
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_history(args: HistoryArgs, config_path: Option<&Path>) -> Result<()> {
    let config = DeliveryConfig::load(config_path)?;
    let path = match &config.renderer {
        RendererConfig::Journal { path: Some(path) } => path.clone(),
        _ => JournalRenderer::default_path(),
    };
    let journal = JournalRenderer::new(path);

    let entries: Vec<JournalEntry> = if args.slots {
        journal.active_slots().into_iter().take(args.limit).collect()
    } else {
        journal.read_recent(args.limit)
    };

    println!(
        "{}",
        format_output(&entries, args.json, |entries| {
            if entries.is_empty() {
                return "no notifications recorded".to_string();
            }
            entries
                .iter()
                .map(|e| {
                    format!(
                        "{} #{:<10} {:<26} {}: {}",
                        e.ts.format("%Y-%m-%d %H:%M:%S"),
                        e.notification_id,
                        e.channel_id,
                        e.title,
                        e.body
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    );
    Ok(())
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = DeliveryConfig::load(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(DeliveryConfig::default_path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            DeliveryConfig::default().save(&path)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
