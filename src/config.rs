//! Static delivery configuration, loaded once at startup
//!
//! Stored as JSON at `~/.config/push-delivery/config.json`. Every field has a
//! default, so a partial file (or no file) is valid.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notification::channel::ChannelPolicy;
use crate::notification::deduplicator::{DEFAULT_DEDUP_CAPACITY, DEFAULT_DEDUP_WINDOW};
use crate::notification::pipeline::RenderFailurePolicy;
use crate::notification::renderers::WebhookConfig;

/// Which renderer presents dispatched notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RendererConfig {
    Console,
    Journal {
        /// Defaults to `notifications.jsonl` in the config dir
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    Webhook(WebhookConfig),
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig::Journal { path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Title used when neither the notification block nor data has one
    pub default_title: String,
    /// Body used when neither the notification block nor data has one
    pub default_body: String,
    pub dedup_window_secs: u64,
    pub dedup_cache_capacity: usize,
    /// Time bucket for content-derived ids
    pub id_bucket_secs: u64,
    pub channels: ChannelPolicy,
    pub render_failure: RenderFailurePolicy,
    pub renderer: RendererConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_title: "Notification".to_string(),
            default_body: "New notification".to_string(),
            dedup_window_secs: DEFAULT_DEDUP_WINDOW.as_secs(),
            dedup_cache_capacity: DEFAULT_DEDUP_CAPACITY,
            id_bucket_secs: 1,
            channels: ChannelPolicy::default(),
            render_failure: RenderFailurePolicy::default(),
            renderer: RendererConfig::default(),
        }
    }
}

/// `~/.config/push-delivery`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("push-delivery")
}

impl DeliveryConfig {
    pub fn default_path() -> PathBuf {
        config_dir().join("config.json")
    }

    /// Directory holding state that lives next to the config (token file)
    pub fn state_dir(path: Option<&Path>) -> PathBuf {
        match path.and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => config_dir(),
        }
    }

    /// Load from `path` (or the default location); missing file → defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Write as pretty JSON (atomic via temp file)
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let temp = path.with_extension("tmp");
        fs::write(&temp, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", temp.display()))?;
        fs::rename(&temp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dedup_cache_capacity == 0 {
            bail!("dedup_cache_capacity must be at least 1");
        }
        if self.id_bucket_secs == 0 {
            bail!("id_bucket_secs must be at least 1");
        }
        if self.channels.selector.trim().is_empty() {
            bail!("channels.selector must not be empty");
        }

        let mut seen_values = HashSet::new();
        for (value, spec) in &self.channels.rules {
            if !seen_values.insert(value.trim().to_lowercase()) {
                bail!("channel rule '{}' is defined more than once", value);
            }
            if spec.id.trim().is_empty() {
                bail!("channel rule '{}' has an empty channel id", value);
            }
        }
        if self.channels.fallback.id.trim().is_empty() {
            bail!("fallback channel has an empty id");
        }

        if let RendererConfig::Webhook(webhook) = &self.renderer {
            if webhook.url.trim().is_empty() {
                bail!("webhook renderer needs a url");
            }
        }
        Ok(())
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::{ChannelSpec, HIGH_IMPORTANCE_CHANNEL};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DeliveryConfig::default();
        assert_eq!(config.dedup_window(), Duration::from_secs(30));
        assert_eq!(config.dedup_cache_capacity, 200);
        assert_eq!(config.id_bucket_secs, 1);
        assert_eq!(config.render_failure, RenderFailurePolicy::Surface);
        assert!(config.channels.rules.contains_key("high"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_state_dir_follows_config_path() {
        assert_eq!(
            DeliveryConfig::state_dir(Some(Path::new("/srv/push/config.json"))),
            PathBuf::from("/srv/push")
        );
        assert_eq!(DeliveryConfig::state_dir(Some(Path::new("config.json"))), PathBuf::from("."));
        assert_eq!(DeliveryConfig::state_dir(None), config_dir());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = DeliveryConfig::load(Some(&dir.path().join("none.json"))).unwrap();
        assert_eq!(config, DeliveryConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "default_title": "Akhdem Li",
                "dedup_window_secs": 60,
                "render_failure": {"mode": "retry_once", "backoff_ms": 250},
                "renderer": {"kind": "console"}
            }"#,
        )
        .unwrap();

        let config = DeliveryConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_title, "Akhdem Li");
        assert_eq!(config.default_body, "New notification");
        assert_eq!(config.dedup_window_secs, 60);
        assert_eq!(config.render_failure, RenderFailurePolicy::RetryOnce { backoff_ms: 250 });
        assert_eq!(config.renderer, RendererConfig::Console);
        assert_eq!(config.channels.rules["high"].id, HIGH_IMPORTANCE_CHANNEL);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub/config.json");

        let mut config = DeliveryConfig::default();
        config.renderer = RendererConfig::Webhook(WebhookConfig::default());
        config.save(&path).unwrap();

        assert_eq!(DeliveryConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DeliveryConfig::default();
        config.dedup_cache_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = DeliveryConfig::default();
        config.id_bucket_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DeliveryConfig::default();
        config.channels.rules.insert("HIGH".to_string(), ChannelSpec::high_importance());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let mut config = DeliveryConfig::default();
        config.channels.fallback.id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"dedup_cache_capacity": 0}"#).unwrap();

        let err = DeliveryConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("dedup_cache_capacity"));
    }
}
