//! CLI command handling

pub mod deliver;
pub mod listen;
pub mod manage;
pub mod output;

pub use deliver::*;
pub use listen::*;
pub use manage::*;
pub use output::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::DeliveryConfig;
use crate::notification::{DeliveryCore, DeliveryCoreBuilder, TokenRegistry};

/// Token file kept beside the selected config file
pub fn token_path(config_path: Option<&Path>) -> PathBuf {
    TokenRegistry::path_in(&DeliveryConfig::state_dir(config_path))
}

/// Load config and saved token, then build the core
pub fn build_core(config_path: Option<&Path>, dry_run: bool) -> Result<DeliveryCore> {
    let config = DeliveryConfig::load(config_path)?;

    let tokens = match TokenRegistry::load_from(&token_path(config_path)) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable token file");
            TokenRegistry::new()
        }
    };

    DeliveryCoreBuilder::from_config(config)
        .tokens(tokens)
        .dry_run(dry_run)
        .build()
}
