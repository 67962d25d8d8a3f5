// Bridge facade: the download and exists operations the Flutter host calls.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::HelperConfig;
use crate::engine::coordinator::TransferCoordinator;
use crate::engine::index::ExistenceIndex;
use crate::engine::stats::{StatsCollector, StatsSnapshot};
use crate::engine::transfer::{TransferReceipt, TransferRequest, TransferState};
use crate::error::HelperError;
use crate::platform::local_fs::LocalFsPlatform;
use crate::platform::traits::MediaPlatform;
use crate::storage::resolver::{StoragePathResolver, StorageRoot};

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A validated download request: filename plus decoded payload bytes.
#[derive(Debug, Clone)]
pub struct DownloadAudioRequest {
    pub filename: String,
    pub payload: Bytes,
}

impl DownloadAudioRequest {
    /// Decode a base64 payload. Line breaks and other ASCII whitespace are ignored;
    /// an empty string decodes to an empty payload.
    pub fn from_base64(filename: impl Into<String>, base64: &str) -> Result<Self, HelperError> {
        let filename = filename.into();
        let compact: String = base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let payload = LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|e| HelperError::InvalidPayload {
                filename: filename.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            filename,
            payload: Bytes::from(payload),
        })
    }
}

/// Public entry point. Holds handles to the engine components; state lives in them.
pub struct MediaFileHelper {
    platform: Arc<dyn MediaPlatform>,
    resolver: Arc<StoragePathResolver>,
    index: Arc<ExistenceIndex>,
    coordinator: Arc<TransferCoordinator>,
    stats: Arc<StatsCollector>,
}

impl MediaFileHelper {
    pub fn new(config: &HelperConfig, platform: Arc<dyn MediaPlatform>) -> Self {
        let resolver = Arc::new(StoragePathResolver::from_config(config));
        let stats = Arc::new(StatsCollector::new());
        let index = Arc::new(ExistenceIndex::new(
            Arc::clone(&platform),
            Arc::clone(&resolver),
            Arc::clone(&stats),
            config.existence_ttl(),
        ));
        let coordinator = Arc::new(TransferCoordinator::new(
            Arc::clone(&platform),
            Arc::clone(&resolver),
            Arc::clone(&index),
            Arc::clone(&stats),
            config.write_policy,
        ));

        debug!("media helper storage root {:?}", resolver.root());

        Self {
            platform,
            resolver,
            index,
            coordinator,
            stats,
        }
    }

    /// Helper backed by the local file system.
    pub fn with_local_fs(config: &HelperConfig) -> Self {
        Self::new(config, Arc::new(LocalFsPlatform::new()))
    }

    /// Decode `base64_payload` and write it under `filename`. Resolves to the
    /// absolute path of the stored file.
    pub async fn download_audio_file(
        &self,
        filename: &str,
        base64_payload: &str,
    ) -> Result<String, HelperError> {
        self.resolver.resolve(filename)?;
        let request = DownloadAudioRequest::from_base64(filename, base64_payload)?;
        let receipt = self.download(request).await?;
        Ok(receipt.path.to_string_lossy().into_owned())
    }

    /// Typed form of [`Self::download_audio_file`].
    pub async fn download(
        &self,
        request: DownloadAudioRequest,
    ) -> Result<TransferReceipt, HelperError> {
        self.resolver.resolve(&request.filename)?;
        self.ensure_permission().await?;

        let pending = self
            .coordinator
            .download(TransferRequest::new(request.filename, request.payload))?;
        pending.outcome().await
    }

    pub async fn exists(&self, filename: &str) -> Result<bool, HelperError> {
        self.resolver.resolve(filename)?;
        self.ensure_permission().await?;
        self.index.check_exists(filename).await
    }

    /// Path of `filename` if it exists, `None` otherwise.
    pub async fn locate(&self, filename: &str) -> Result<Option<String>, HelperError> {
        let path = self.resolver.resolve(filename)?;
        if self.exists(filename).await? {
            Ok(Some(path.to_string_lossy().into_owned()))
        } else {
            Ok(None)
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn storage_root(&self) -> &StorageRoot {
        self.resolver.root()
    }

    pub fn transfer_state(&self, filename: &str) -> Option<TransferState> {
        self.coordinator.state(filename)
    }

    async fn ensure_permission(&self) -> Result<(), HelperError> {
        if self.platform.storage_permission_granted().await {
            Ok(())
        } else {
            warn!("storage permission refused");
            Err(HelperError::PermissionDenied)
        }
    }
}
