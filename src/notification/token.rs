//! Registration token registry
//!
//! The transport hands out a new device token on install and whenever it
//! rotates one. The latest token is what the app server needs to target this
//! device, so it is kept in memory and optionally persisted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub updated_at: DateTime<Utc>,
    /// How many times the token has changed during this registry's lifetime
    pub refresh_count: u64,
}

#[derive(Debug, Default)]
pub struct TokenRegistry {
    current: RwLock<Option<TokenRecord>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a refreshed token; returns `false` if it did not change
    pub fn update(&self, token: &str) -> bool {
        let token = token.trim();
        let mut current = self.current.write().unwrap_or_else(|p| p.into_inner());

        if current.as_ref().map(|r| r.token.as_str()) == Some(token) {
            return false;
        }

        let refresh_count = current.as_ref().map(|r| r.refresh_count + 1).unwrap_or(0);
        *current = Some(TokenRecord {
            token: token.to_string(),
            updated_at: Utc::now(),
            refresh_count,
        });
        true
    }

    pub fn current(&self) -> Option<TokenRecord> {
        self.current.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// `~/.config/push-delivery/token.json`
    pub fn default_path() -> PathBuf {
        Self::path_in(&crate::config::config_dir())
    }

    /// Token file inside `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join("token.json")
    }

    /// Persist the current token (atomic via temp file)
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let Some(record) = self.current() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let temp = path.with_extension("tmp");
        fs::write(&temp, serde_json::to_string_pretty(&record)?)
            .with_context(|| format!("writing {}", temp.display()))?;
        fs::rename(&temp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    /// Restore a registry from a saved token file; missing file → empty
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let record: TokenRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Self {
            current: RwLock::new(Some(record)),
        })
    }
}

/// Shorten a token for logs: first and last 6 characters
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_update_tracks_refreshes() {
        let registry = TokenRegistry::new();
        assert!(registry.current().is_none());

        assert!(registry.update("token-a"));
        assert_eq!(registry.current().unwrap().refresh_count, 0);

        assert!(!registry.update(" token-a "));
        assert!(registry.update("token-b"));

        let record = registry.current().unwrap();
        assert_eq!(record.token, "token-b");
        assert_eq!(record.refresh_count, 1);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/token.json");

        let registry = TokenRegistry::new();
        registry.update("abc123");
        registry.save_to(&path).unwrap();

        let loaded = TokenRegistry::load_from(&path).unwrap();
        assert_eq!(loaded.current().map(|r| r.token), Some("abc123".to_string()));
        // the restored token continues the refresh count
        assert!(loaded.update("def456"));
        assert_eq!(loaded.current().unwrap().refresh_count, 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let registry = TokenRegistry::load_from(&dir.path().join("none.json")).unwrap();
        assert!(registry.current().is_none());
    }

    #[test]
    fn test_save_without_token_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        TokenRegistry::new().save_to(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token("abcdef0123456789uvwxyz"), "abcdef…uvwxyz");
    }
}
