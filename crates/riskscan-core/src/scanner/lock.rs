use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Serializes scans that share a target directory.
///
/// File-based tools write to a fixed report path per target, so two
/// concurrent scans of one target would race on those files.
#[derive(Debug, Default)]
pub struct TargetLocks {
    inner: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl TargetLocks {
    pub async fn acquire(&self, target: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(target.to_path_buf()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of targets currently scanned or waited on.
    pub fn active(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}
