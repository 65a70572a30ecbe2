use crate::utils::error::{Result, SliceError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "slice-";

/// Counts acquisitions and releases so callers can check they stay paired.
#[derive(Debug, Default)]
pub struct WorkspaceStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl WorkspaceStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    stats: Arc<WorkspaceStats>,
}

impl WorkspaceManager {
    pub fn new(root: Option<&Path>) -> Self {
        Self {
            root: root
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir),
            stats: Arc::new(WorkspaceStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<WorkspaceStats> {
        Arc::clone(&self.stats)
    }

    /// Creates `<root>/slice-XXXXXX/{input,output}`.
    pub fn acquire(&self) -> Result<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|source| SliceError::WorkspaceError {
                message: format!("cannot create workspace under {}", self.root.display()),
                source,
            })?;

        let path = dir.path().to_path_buf();
        // 從這裡開始 Drop 會負責清理
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        let workspace = Workspace {
            input: path.join("input"),
            output: path.join("output"),
            path,
            dir: Some(dir),
            stats: Arc::clone(&self.stats),
        };

        for sub in [&workspace.input, &workspace.output] {
            std::fs::create_dir_all(sub).map_err(|source| SliceError::WorkspaceError {
                message: format!("cannot create {}", sub.display()),
                source,
            })?;
        }

        tracing::debug!("📁 Acquired workspace {}", workspace.path.display());
        Ok(workspace)
    }
}

/// One request's private directory tree. Removed exactly once: by `release`
/// or, failing that, when dropped.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    input: PathBuf,
    output: PathBuf,
    dir: Option<TempDir>,
    stats: Arc<WorkspaceStats>,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn input_dir(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => tracing::debug!("🧹 Released workspace {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Workspace {} was already gone", self.path.display())
            }
            Err(e) => tracing::warn!(
                "⚠️ Failed to remove workspace {}: {}",
                self.path.display(),
                e
            ),
        }
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release_inner();
    }
}
