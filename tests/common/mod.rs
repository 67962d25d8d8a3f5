// In-memory platform used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use ma_media_helper::error::PlatformError;
use ma_media_helper::platform::traits::MediaPlatform;

#[derive(Default)]
pub struct FakePlatform {
    pub files: Mutex<HashMap<PathBuf, Bytes>>,
    pub write_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
    /// When set, writes wait for a permit before completing.
    write_gate: Option<Arc<Semaphore>>,
    /// When set, existence queries wait for a permit before answering.
    exists_gate: Option<Arc<Semaphore>>,
    fail_writes: Mutex<Option<String>>,
    fail_exists: Mutex<Option<String>>,
    deny_permission: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes block until `release_writes` is called.
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let platform = Self {
            write_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (Arc::new(platform), gate)
    }

    /// Existence queries block until permits are added to the returned semaphore.
    pub fn gated_exists() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let platform = Self {
            exists_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (Arc::new(platform), gate)
    }

    pub fn fail_writes_with(&self, reason: &str) {
        *self.fail_writes.lock() = Some(reason.to_string());
    }

    pub fn clear_write_failure(&self) {
        *self.fail_writes.lock() = None;
    }

    pub fn fail_exists_with(&self, reason: &str) {
        *self.fail_exists.lock() = Some(reason.to_string());
    }

    pub fn clear_exists_failure(&self) {
        *self.fail_exists.lock() = None;
    }

    /// Put a file in place without going through the helper.
    pub fn insert_externally(&self, path: &Path, payload: &'static [u8]) {
        self.files.lock().insert(path.to_path_buf(), Bytes::from_static(payload));
    }

    pub fn deny_permission(&self) {
        self.deny_permission.store(true, Ordering::SeqCst);
    }

    /// Simulate a deletion that happens outside the helper.
    pub fn delete_externally(&self, path: &Path) {
        self.files.lock().remove(path);
    }

    pub fn contents(&self, path: &Path) -> Option<Bytes> {
        self.files.lock().get(path).cloned()
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn exists_queries(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaPlatform for FakePlatform {
    async fn write_file(&self, path: &Path, payload: Bytes) -> Result<(), PlatformError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.write_gate {
            gate.acquire()
                .await
                .map_err(|e| PlatformError::new(e.to_string()))?
                .forget();
        }
        if let Some(reason) = self.fail_writes.lock().clone() {
            return Err(PlatformError::new(reason));
        }
        self.files.lock().insert(path.to_path_buf(), payload);
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> Result<bool, PlatformError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.exists_gate {
            gate.acquire()
                .await
                .map_err(|e| PlatformError::new(e.to_string()))?
                .forget();
        }
        if let Some(reason) = self.fail_exists.lock().clone() {
            return Err(PlatformError::new(reason));
        }
        Ok(self.files.lock().contains_key(path))
    }

    async fn storage_permission_granted(&self) -> bool {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        !self.deny_permission.load(Ordering::SeqCst)
    }
}
