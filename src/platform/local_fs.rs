use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use super::traits::MediaPlatform;
use crate::error::PlatformError;

/// Writes straight to the local file system with `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalFsPlatform;

impl LocalFsPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaPlatform for LocalFsPlatform {
    async fn write_file(&self, path: &Path, payload: Bytes) -> Result<(), PlatformError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                warn!("create_dir_all failed dir={} err={}", parent.display(), e);
                PlatformError::from(e)
            })?;
        }

        tokio::fs::write(path, &payload).await.map_err(|e| {
            warn!("write failed path={} err={}", path.display(), e);
            PlatformError::from(e)
        })?;

        debug!("wrote {} bytes to {}", payload.len(), path.display());
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> Result<bool, PlatformError> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}
