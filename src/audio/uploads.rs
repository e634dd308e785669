//! Temporary locators for user-supplied files.
//!
//! Every uploaded file gets an opaque `upload://<id>/<name>` locator that the
//! loader resolves back to a path. Revoking a locator is the release of the
//! track's temporary resource; it succeeds at most once per locator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const SCHEME: &str = "upload://";

#[derive(Debug, Default)]
struct UploadTable {
    next_id: u64,
    entries: HashMap<String, PathBuf>,
    revoked: u64,
}

/// Shared table of live upload locators (cheap to clone)
#[derive(Debug, Clone, Default)]
pub struct UploadStore {
    inner: Arc<Mutex<UploadTable>>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, UploadTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `locator` uses the upload scheme
    pub fn is_upload_locator(locator: &str) -> bool {
        locator.starts_with(SCHEME)
    }

    /// Register `path` and return its new locator
    pub fn create(&self, path: &Path) -> String {
        let mut table = self.table();
        table.next_id += 1;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string());
        let locator = format!("{}{}/{}", SCHEME, table.next_id, name);
        table.entries.insert(locator.clone(), path.to_path_buf());
        locator
    }

    /// Resolve a live locator back to its file path
    pub fn resolve(&self, locator: &str) -> Option<PathBuf> {
        self.table().entries.get(locator).cloned()
    }

    /// Release a locator. Returns false if it was unknown or already revoked.
    pub fn revoke(&self, locator: &str) -> bool {
        let mut table = self.table();
        if table.entries.remove(locator).is_some() {
            table.revoked += 1;
            true
        } else {
            false
        }
    }

    /// Release every live locator (teardown)
    pub fn revoke_all(&self) -> usize {
        let mut table = self.table();
        let count = table.entries.len();
        table.entries.clear();
        table.revoked += count as u64;
        count
    }

    /// Number of live locators
    pub fn live_count(&self) -> usize {
        self.table().entries.len()
    }

    /// Total number of successful revocations
    pub fn revoked_count(&self) -> u64 {
        self.table().revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let store = UploadStore::new();
        let a = store.create(Path::new("/music/a.mp3"));
        let b = store.create(Path::new("/music/a.mp3"));

        assert!(UploadStore::is_upload_locator(&a));
        assert_ne!(a, b); // Same file twice = two distinct uploads
        assert!(a.ends_with("/a.mp3"));
        assert_eq!(store.resolve(&a), Some(PathBuf::from("/music/a.mp3")));
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_revoke_only_once() {
        let store = UploadStore::new();
        let a = store.create(Path::new("a.wav"));

        assert!(store.revoke(&a));
        assert!(!store.revoke(&a));
        assert_eq!(store.revoked_count(), 1);
        assert_eq!(store.resolve(&a), None);
    }

    #[test]
    fn test_revoke_all() {
        let store = UploadStore::new();
        store.create(Path::new("a.wav"));
        store.create(Path::new("b.wav"));

        assert_eq!(store.revoke_all(), 2);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.revoke_all(), 0);
    }
}
