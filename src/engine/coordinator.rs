// Transfer coordinator: one platform write per filename at a time; concurrent callers share it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::index::ExistenceIndex;
use super::stats::StatsCollector;
use super::transfer::{
    PendingTransfer, TransferReceipt, TransferRequest, TransferResult, TransferState,
};
use crate::config::WritePolicy;
use crate::error::HelperError;
use crate::platform::traits::MediaPlatform;
use crate::storage::resolver::StoragePathResolver;

struct TransferSlot {
    state: TransferState,
    outcome: watch::Receiver<Option<TransferResult>>,
}

type TransferMap = Arc<Mutex<HashMap<String, TransferSlot>>>;

pub struct TransferCoordinator {
    platform: Arc<dyn MediaPlatform>,
    resolver: Arc<StoragePathResolver>,
    index: Arc<ExistenceIndex>,
    stats: Arc<StatsCollector>,
    transfers: TransferMap,
    write_policy: WritePolicy,
}

impl TransferCoordinator {
    pub fn new(
        platform: Arc<dyn MediaPlatform>,
        resolver: Arc<StoragePathResolver>,
        index: Arc<ExistenceIndex>,
        stats: Arc<StatsCollector>,
        write_policy: WritePolicy,
    ) -> Self {
        Self {
            platform,
            resolver,
            index,
            stats,
            transfers: Arc::new(Mutex::new(HashMap::new())),
            write_policy,
        }
    }

    /// Start (or join) the transfer for `request.filename`.
    ///
    /// Returns immediately; the write runs on a spawned task and always runs to
    /// completion, even if every caller drops its `PendingTransfer`. Must be
    /// called from within a tokio runtime.
    pub fn download(&self, request: TransferRequest) -> Result<PendingTransfer, HelperError> {
        let path = self.resolver.resolve(&request.filename)?;
        let filename = request.filename.clone();

        let (tx, rx) = {
            let mut transfers = self.transfers.lock();
            if let Some(slot) = transfers.get(&filename) {
                if slot.state.is_active() {
                    self.stats.record_joined();
                    debug!("joining in-flight transfer for {}", filename);
                    return Ok(PendingTransfer::new(filename, true, slot.outcome.clone()));
                }
            }
            let (tx, rx) = watch::channel(None);
            transfers.insert(
                filename.clone(),
                TransferSlot {
                    state: TransferState::Pending,
                    outcome: rx.clone(),
                },
            );
            (tx, rx)
        };

        let mut guard = TransferGuard {
            filename: filename.clone(),
            transfers: Arc::clone(&self.transfers),
            index: Arc::clone(&self.index),
            stats: Arc::clone(&self.stats),
            outcome: Some(tx),
        };
        self.stats.increment_transfers();

        let platform = Arc::clone(&self.platform);
        let stats = Arc::clone(&self.stats);
        let write_policy = self.write_policy;

        tokio::spawn(async move {
            Self::set_state(&guard.transfers, &request.filename, TransferState::InFlight);

            let result =
                Self::run_transfer(platform.as_ref(), &stats, write_policy, &request, path).await;

            match &result {
                Ok(receipt) => info!(
                    "transfer {} succeeded path={} bytes={} written={} elapsed_ms={}",
                    request.filename,
                    receipt.path.display(),
                    receipt.bytes_written,
                    receipt.written,
                    request.requested_at.elapsed().as_millis()
                ),
                Err(e) => {
                    stats.record_failed();
                    warn!("transfer {} failed: {}", request.filename, e);
                }
            }

            guard.publish(result);
        });

        Ok(PendingTransfer::new(filename, false, rx))
    }

    async fn run_transfer(
        platform: &dyn MediaPlatform,
        stats: &StatsCollector,
        write_policy: WritePolicy,
        request: &TransferRequest,
        path: PathBuf,
    ) -> TransferResult {
        if write_policy == WritePolicy::KeepExisting && platform.file_exists(&path).await? {
            debug!("{} already present, keeping existing file", request.filename);
            return Ok(TransferReceipt {
                filename: request.filename.clone(),
                path,
                bytes_written: 0,
                written: false,
            });
        }

        let len = request.payload.len() as u64;
        platform.write_file(&path, request.payload.clone()).await?;
        stats.record_write(len);

        Ok(TransferReceipt {
            filename: request.filename.clone(),
            path,
            bytes_written: len,
            written: true,
        })
    }

    fn set_state(transfers: &TransferMap, filename: &str, state: TransferState) {
        if let Some(slot) = transfers.lock().get_mut(filename) {
            slot.state = state;
        }
    }

    /// Current state for `filename`, if any transfer has been recorded.
    pub fn state(&self, filename: &str) -> Option<TransferState> {
        self.transfers
            .lock()
            .get(filename)
            .map(|slot| slot.state.clone())
    }
}

/// Bookkeeping for one spawned transfer. Publishing retires the slot; if the
/// task ends without publishing (the platform panicked, or the runtime shut
/// down mid-write) the drop retires it instead and waiters see `Abandoned`.
struct TransferGuard {
    filename: String,
    transfers: TransferMap,
    index: Arc<ExistenceIndex>,
    stats: Arc<StatsCollector>,
    outcome: Option<watch::Sender<Option<TransferResult>>>,
}

impl TransferGuard {
    fn publish(&mut self, result: TransferResult) {
        let terminal = match &result {
            Ok(_) => TransferState::Succeeded,
            Err(e) => TransferState::Failed(e.to_string()),
        };
        self.retire(terminal);
        if let Some(tx) = self.outcome.take() {
            tx.send_replace(Some(result));
        }
    }

    /// Runs before the outcome is visible: a caller that sees it can check
    /// existence against the platform and start a fresh transfer.
    fn retire(&self, terminal: TransferState) {
        self.stats.decrement_transfers();
        self.index.invalidate(&self.filename);
        self.transfers.lock().remove(&self.filename);
        debug!("transfer {} retired as {:?}", self.filename, terminal);
    }
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        if self.outcome.is_some() {
            warn!("transfer {} ended without an outcome", self.filename);
            self.stats.record_failed();
            self.retire(TransferState::Failed("abandoned".to_string()));
        }
    }
}
