//! Push Delivery CLI
//!
//! Feed push payloads through the notification delivery core

use anyhow::Result;
use clap::{Parser, Subcommand};
use push_delivery::cli::{
    handle_channels, handle_config, handle_deliver, handle_history, handle_listen, handle_token,
    ChannelsArgs, ConfigAction, DeliverArgs, HistoryArgs, ListenArgs, TokenArgs,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pushd")]
#[command(about = "Push Delivery - normalize, dedup, route and render push notifications")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/push-delivery/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver one payload (file or stdin)
    Deliver(DeliverArgs),
    /// Deliver newline-delimited payloads from stdin until EOF
    Listen(ListenArgs),
    /// Record a refreshed registration token
    Token(TokenArgs),
    /// List the channels the host must register
    Channels(ChannelsArgs),
    /// Show rendered notifications from the journal
    History(HistoryArgs),
    /// Show or initialize the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=debug pushd listen
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("push_delivery=info,pushd=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Deliver(args) => handle_deliver(args, config_path).await?,
        Commands::Listen(args) => handle_listen(args, config_path).await?,
        Commands::Token(args) => handle_token(args, config_path)?,
        Commands::Channels(args) => handle_channels(args, config_path)?,
        Commands::History(args) => handle_history(args, config_path)?,
        Commands::Config { action } => handle_config(action, config_path)?,
    }

    Ok(())
}
