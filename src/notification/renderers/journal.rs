//! Journal renderer - appends rendered notifications to a JSONL file

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RenderDeliveryError;
use crate::notification::dispatcher::RenderRequest;
use crate::notification::importance::Importance;
use crate::notification::renderer::NotificationRenderer;

/// One rendered notification (JSONL line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub ts: DateTime<Utc>,
    pub notification_id: i32,
    pub intent_id: String,
    pub channel_id: String,
    pub importance: Importance,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JournalEntry {
    pub fn from_request(request: &RenderRequest) -> Self {
        Self {
            ts: Utc::now(),
            notification_id: request.notification_id,
            intent_id: request.intent_id.clone(),
            channel_id: request.channel_id.clone(),
            importance: request.importance,
            title: request.title.clone(),
            body: request.body.clone(),
            data: if request.data.is_empty() {
                None
            } else {
                serde_json::to_value(&request.data).ok()
            },
        }
    }
}

const MAX_ENTRIES: usize = 200;
const KEEP_AFTER_CLEANUP: usize = 100;
const CLEANUP_CHECK_INTERVAL: usize = 10;

/// File-backed notification journal (exclusive lock per write)
#[derive(Debug)]
pub struct JournalRenderer {
    path: PathBuf,
    write_count: Arc<AtomicUsize>,
}

impl JournalRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `~/.config/push-delivery/notifications.jsonl`
    pub fn default_path() -> PathBuf {
        crate::config::config_dir().join("notifications.jsonl")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry (with file lock)
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        append_locked(&self.path, entry)?;
        let count = self.write_count.fetch_add(1, Ordering::Relaxed);
        if count % CLEANUP_CHECK_INTERVAL == 0 {
            if let Err(e) = cleanup(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Journal cleanup failed");
            }
        }
        Ok(())
    }

    /// Last `n` entries in write order
    pub fn read_recent(&self, n: usize) -> Vec<JournalEntry> {
        let entries = read_all(&self.path);
        let start = entries.len().saturating_sub(n);
        entries[start..].to_vec()
    }

    /// Latest entry per notification slot, newest first
    ///
    /// A re-rendered intent reuses its slot, so this is what a user would
    /// currently see.
    pub fn active_slots(&self) -> Vec<JournalEntry> {
        let mut seen = std::collections::HashSet::new();
        read_all(&self.path)
            .into_iter()
            .rev()
            .filter(|entry| seen.insert(entry.notification_id))
            .collect()
    }
}

#[async_trait]
impl NotificationRenderer for JournalRenderer {
    fn name(&self) -> &str {
        "journal"
    }

    async fn render(&self, request: &RenderRequest) -> Result<(), RenderDeliveryError> {
        let entry = JournalEntry::from_request(request);
        let renderer = Self {
            path: self.path.clone(),
            write_count: Arc::clone(&self.write_count),
        };
        let notification_id = request.notification_id;

        // File locking blocks; keep it off the async workers
        let result = tokio::task::spawn_blocking(move || renderer.append(&entry))
            .await
            .map_err(|e| RenderDeliveryError::rejected("journal", notification_id, e.to_string()))?;

        match result {
            Ok(()) => {
                debug!(renderer = "journal", notification_id, "Notification recorded");
                Ok(())
            }
            Err(e) => Err(RenderDeliveryError::rejected("journal", notification_id, format!("{:#}", e))),
        }
    }
}

/// Sidecar lock file shared by appends and cleanup
///
/// Cleanup replaces the journal by rename, so locking the journal itself
/// would leave a waiting appender holding the unlinked file.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Take the journal lock; released when the returned file is dropped
fn lock_journal(path: &Path) -> Result<File> {
    use fs2::FileExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;
    Ok(lock)
}

fn append_locked(path: &Path, entry: &JournalEntry) -> Result<()> {
    let _lock = lock_journal(path)?;

    // opened only after locking, so a finished cleanup's rename is visible
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(entry)?)?;
    Ok(())
}

/// Parse JSONL, skipping lines that are not valid entries (bad UTF-8 included)
fn parse_entries(reader: impl BufRead) -> Vec<JournalEntry> {
    reader
        .split(b'\n')
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_slice(&line).ok())
        .collect()
}

fn read_all(path: &Path) -> Vec<JournalEntry> {
    match File::open(path) {
        Ok(file) => parse_entries(BufReader::new(file)),
        Err(_) => Vec::new(),
    }
}

/// Keep the most recent entries once the journal grows past the limit
fn cleanup(path: &Path) -> Result<()> {
    let _lock = lock_journal(path)?;
    cleanup_locked(path)
}

/// Caller holds the journal lock
fn cleanup_locked(path: &Path) -> Result<()> {
    let entries = read_all(path);
    if entries.len() <= MAX_ENTRIES {
        return Ok(());
    }

    let start = entries.len().saturating_sub(KEEP_AFTER_CLEANUP);
    let temp_path = path.with_extension("tmp");
    {
        let mut temp_file = File::create(&temp_path)?;
        for entry in &entries[start..] {
            writeln!(temp_file, "{}", serde_json::to_string(entry)?)?;
        }
    }

    // Atomic replace
    fs::rename(&temp_path, path)?;
    Ok(())
}
