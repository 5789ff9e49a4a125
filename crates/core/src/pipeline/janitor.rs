use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ScriptcastError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed { attempts: u32 },
    AlreadyClean,
    GaveUp { attempts: u32 },
}

/// Deletes a file. Split out so lock contention can be simulated.
pub trait FileRemover: Send + Sync {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Errors meaning another handle still holds the file.
fn is_locked(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ResourceBusy
    )
}

/// Owns the one transient audio file a session may leave behind.
pub struct ResourceJanitor {
    pending: Option<PathBuf>,
    policy: RetryPolicy,
    remover: Box<dyn FileRemover>,
}

impl Default for ResourceJanitor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl ResourceJanitor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_remover(policy, Box::new(FsRemover))
    }

    pub fn with_remover(policy: RetryPolicy, remover: Box<dyn FileRemover>) -> Self {
        Self {
            pending: None,
            policy,
            remover,
        }
    }

    pub fn pending(&self) -> Option<&Path> {
        self.pending.as_deref()
    }

    /// Records `path` as the pending file. A different previously pending
    /// file is cleaned first.
    pub async fn schedule_cleanup(&mut self, path: PathBuf) {
        if let Some(previous) = self.pending.take() {
            if previous != path {
                self.cleanup(&previous).await;
            }
        }
        self.pending = Some(path);
    }

    /// Cleans the pending file, if any.
    pub async fn flush(&mut self) -> Option<CleanupOutcome> {
        let path = self.pending.take()?;
        Some(self.cleanup(&path).await)
    }

    /// Best-effort delete. Retries only while the file looks locked and
    /// never reports failure to the caller beyond the returned outcome.
    pub async fn cleanup(&self, path: &Path) -> CleanupOutcome {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.remover.remove(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), attempts, "removed transient file");
                    return CleanupOutcome::Removed { attempts };
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return if attempts == 1 {
                        CleanupOutcome::AlreadyClean
                    } else {
                        CleanupOutcome::Removed { attempts }
                    };
                }
                Err(e) if is_locked(&e) && attempts < self.policy.max_attempts => {
                    tracing::debug!(path = %path.display(), attempts, error = %e, "file busy, retrying");
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(e) => {
                    let warning = ScriptcastError::CleanupExhausted {
                        path: path.to_path_buf(),
                        attempts,
                    };
                    tracing::warn!(kind = ?warning.kind(), error = %e, "{warning}");
                    return CleanupOutcome::GaveUp { attempts };
                }
            }
        }
    }
}
