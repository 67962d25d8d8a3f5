use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PlatformError;

#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Write `payload` to `path`, replacing any existing content.
    async fn write_file(&self, path: &Path, payload: Bytes) -> Result<(), PlatformError>;
    async fn file_exists(&self, path: &Path) -> Result<bool, PlatformError>;
    async fn storage_permission_granted(&self) -> bool {
        true
    }
}
