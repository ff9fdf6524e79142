//! Session persistence.
//!
//! A session is one record `{config, result, chat, timestamp}` that is fully
//! overwritten on every save, read once at startup, and removed on reset.
//! [`DebouncedStore`] coalesces bursts of saves into a single write.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::model::{ChatMessage, GeneratedExam, GeneratorConfig};

/// Session identifier used when none is configured.
pub const DEFAULT_SESSION_ID: &str = "examforge_session_v2";

/// Everything persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub config: GeneratorConfig,
    #[serde(default)]
    pub result: Option<GeneratedExam>,
    /// Coaching conversation, oldest turn first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(config: GeneratorConfig, result: Option<GeneratedExam>) -> Self {
        Self {
            config,
            result,
            chat: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Persistence port. `save` is idempotent and overwrites the whole record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
    async fn load(&self) -> Result<Option<SessionSnapshot>>;
    async fn clear(&self) -> Result<()>;
}

/// Stores the session as `<dir>/<session_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    session_id: String,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            session_id: session_id.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.session_id))
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", self.session_id))
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let json =
            serde_json::to_vec_pretty(snapshot).context("failed to serialize session")?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, self.path())
            .await
            .with_context(|| format!("failed to replace {}", self.path().display()))?;
        tracing::debug!(session = %self.session_id, bytes = json.len(), "session saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<SessionSnapshot>> {
        let path = self.path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse session {}", path.display()))?;
        Ok(Some(snapshot))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(self.path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path().display())),
        }
    }
}

/// Default directory for session files.
pub fn default_session_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| Path::new(&home).join(".local/share/examforge"))
        .unwrap_or_else(|| PathBuf::from(".examforge"))
}

/// A scheduled write that can still be called off during its quiet period.
struct PendingWrite {
    handle: JoinHandle<()>,
    cancel: Arc<Notify>,
}

/// Coalesces saves: each `schedule` restarts the quiet period and only the
/// latest snapshot is written when it elapses.
///
/// A write that has started is never cancelled. `flush` and `clear` wait
/// for it, and writes are serialized so the newest snapshot lands last.
pub struct DebouncedStore {
    inner: Arc<dyn SessionStore>,
    delay: Duration,
    pending: Arc<Mutex<Option<SessionSnapshot>>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    task: Mutex<Option<PendingWrite>>,
}

impl DebouncedStore {
    pub fn new(inner: Arc<dyn SessionStore>, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            pending: Arc::new(Mutex::new(None)),
            writer: Arc::new(tokio::sync::Mutex::new(())),
            task: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &Arc<dyn SessionStore> {
        &self.inner
    }

    /// Queue `snapshot` for writing after the quiet period.
    pub fn schedule(&self, snapshot: SessionSnapshot) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);

        let inner = Arc::clone(&self.inner);
        let pending = Arc::clone(&self.pending);
        let writer = Arc::clone(&self.writer);
        let cancel = Arc::new(Notify::new());
        let cancelled = Arc::clone(&cancel);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled.notified() => return,
            }
            let _write = writer.lock().await;
            let snapshot = pending.lock().unwrap_or_else(|e| e.into_inner()).take();
            if let Some(snapshot) = snapshot {
                if let Err(e) = inner.save(&snapshot).await {
                    tracing::warn!(error = %e, "failed to save session");
                }
            }
        });

        let previous = self
            .task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(PendingWrite { handle, cancel });
        if let Some(previous) = previous {
            previous.cancel.notify_one();
        }
    }

    /// Call off a write still in its quiet period and wait for one that
    /// already started.
    async fn settle(&self) {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.cancel.notify_one();
            if let Err(e) = task.handle.await {
                tracing::warn!(error = %e, "session writer task failed");
            }
        }
    }

    /// Write any pending snapshot now.
    pub async fn flush(&self) -> Result<()> {
        self.settle().await;
        let _write = self.writer.lock().await;
        let snapshot = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        match snapshot {
            Some(snapshot) => self.inner.save(&snapshot).await,
            None => Ok(()),
        }
    }

    /// Drop any pending write and remove the stored session.
    pub async fn clear(&self) -> Result<()> {
        self.settle().await;
        let _write = self.writer.lock().await;
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        self.inner.clear().await
    }
}
