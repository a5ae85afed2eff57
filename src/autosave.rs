// Debounced autosave
// Each edit restarts a per-page timer; only the latest state is written when it fires.
// Writes for one page run one at a time, in the order their timers fired.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::commands::page::writePage;
use crate::directory::Directory;
use crate::error::{FolioError, Result};
use crate::models::{Block, PageMetadata, SessionSettings};

/// Snapshot of the saver for the UI's "saving..." indicator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutosaveStatus {
    pub pending: usize,
    pub completedSaves: u64,
    pub lastSavedPath: Option<String>,
    pub lastError: Option<String>,
}

struct PendingSave {
    generation: u64,
    token: CancellationToken,
    blocks: Vec<Block>,
    metadata: Option<PageMetadata>,
}

/// State shared with the timer tasks
struct Shared {
    root: Arc<dyn Directory>,
    pending: Mutex<HashMap<String, PendingSave>>,
    status: Mutex<AutosaveStatus>,
    writeLocks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

pub struct AutoSaver {
    shared: Arc<Shared>,
    delay: Duration,
    generation: AtomicU64,
}

impl AutoSaver {
    pub fn new(root: Arc<dyn Directory>, delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                root,
                pending: Mutex::new(HashMap::new()),
                status: Mutex::new(AutosaveStatus::default()),
                writeLocks: Mutex::new(HashMap::new()),
            }),
            delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Saver using the delay stored in the session settings
    pub fn fromSettings(root: Arc<dyn Directory>, settings: &SessionSettings) -> Self {
        Self::new(root, Duration::from_millis(settings.autosaveDelayMs))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue the latest state of a page, replacing any save still waiting for it.
    /// Must be called from inside a tokio runtime.
    pub fn schedule(&self, path: &str, blocks: Vec<Block>, metadata: Option<PageMetadata>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();

        let replaced = self.shared.pending.lock().insert(
            path.to_string(),
            PendingSave {
                generation,
                token: token.clone(),
                blocks,
                metadata,
            },
        );
        if let Some(previous) = replaced {
            previous.token.cancel();
            tracing::trace!("[AutoSaver::schedule] Restarted timer for {}", path);
        }

        let shared = self.shared.clone();
        let delay = self.delay;
        let path = path.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            // Only the newest edit for this path may write
            let save = {
                let mut pending = shared.pending.lock();
                match pending.get(&path) {
                    Some(s) if s.generation == generation => pending.remove(&path),
                    _ => None,
                }
            };
            if let Some(save) = save {
                let _ = shared.runSave(path, save).await;
            }
        });
    }

    /// Write every waiting save now. Returns the first failure, after attempting all.
    pub async fn flush(&self) -> Result<()> {
        let drained: Vec<(String, PendingSave)> = self.shared.pending.lock().drain().collect();
        let mut firstError = None;
        for (path, save) in drained {
            save.token.cancel();
            if let Err(e) = self.shared.runSave(path, save).await {
                firstError.get_or_insert(e);
            }
        }
        match firstError {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop every waiting save without writing
    pub fn cancelAll(&self) {
        let drained: Vec<(String, PendingSave)> = self.shared.pending.lock().drain().collect();
        for (path, save) in drained {
            save.token.cancel();
            tracing::debug!("[AutoSaver::cancelAll] Dropped pending save for {}", path);
        }
    }

    pub fn status(&self) -> AutosaveStatus {
        let mut status = self.shared.status.lock().clone();
        status.pending = self.shared.pending.lock().len();
        status
    }
}

impl Shared {
    fn writeLock(&self, path: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.writeLocks.lock().entry(path.to_string()).or_default().clone()
    }

    async fn runSave(&self, path: String, save: PendingSave) -> Result<()> {
        let lock = self.writeLock(&path);
        let _writing = lock.lock().await;

        let root = self.root.clone();
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || {
            writePage(root.as_ref(), &target, &save.blocks, save.metadata.as_ref())
        })
        .await
        .map_err(|e| FolioError::Io(std::io::Error::other(e)))
        .and_then(|r| r);

        let mut status = self.status.lock();
        match &result {
            Ok(()) => {
                status.completedSaves += 1;
                status.lastSavedPath = Some(path.clone());
                status.lastError = None;
                tracing::debug!("[AutoSaver] Saved {}", path);
            }
            Err(e) => {
                status.lastError = Some(e.to_string());
                tracing::error!("[AutoSaver] Failed to save {}: {}", path, e);
            }
        }
        result
    }
}
