//! Deferred deletion of temporary upload files.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Schedules best-effort deletion of temporary files after a fixed delay.
///
/// The delay leaves room for any in-flight response streaming that still
/// references the files. Deletion is advisory: a missing file is fine and
/// failures are logged, never propagated.
#[derive(Debug, Clone)]
pub struct Reaper {
    delay: Duration,
}

impl Reaper {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Register the paths for deferred deletion.
    ///
    /// Fire-and-forget: the returned handle never blocks the response path.
    /// Tests construct the reaper with a zero delay and await the handle to
    /// assert cleanup without waiting out a real delay.
    pub fn schedule(&self, paths: Vec<PathBuf>) -> JoinHandle<()> {
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            for path in paths {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => tracing::debug!("reaped temporary file {}", path.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!("failed to reap {}: {e}", path.display());
                    }
                }
            }
        })
    }
}
