use std::path::PathBuf;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::watch;

use crate::error::HelperError;

/// One download call: write `payload` under `filename`.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub filename: String,
    pub payload: Bytes,
    pub requested_at: Instant,
}

impl TransferRequest {
    pub fn new(filename: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            payload: payload.into(),
            requested_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    InFlight,
    Succeeded,
    Failed(String),
}

impl TransferState {
    /// Pending and in-flight transfers accept joiners.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InFlight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub filename: String,
    pub path: PathBuf,
    pub bytes_written: u64,
    /// `false` when the write policy kept an existing file.
    pub written: bool,
}

pub type TransferResult = Result<TransferReceipt, HelperError>;

/// The pending result of a download. Every caller attached to the same
/// transfer observes the same outcome.
#[derive(Debug)]
pub struct PendingTransfer {
    filename: String,
    joined: bool,
    outcome: watch::Receiver<Option<TransferResult>>,
}

impl PendingTransfer {
    pub(crate) fn new(
        filename: String,
        joined: bool,
        outcome: watch::Receiver<Option<TransferResult>>,
    ) -> Self {
        Self {
            filename,
            joined,
            outcome,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether this call attached to a transfer that was already running.
    pub fn joined(&self) -> bool {
        self.joined
    }

    /// Wait for the transfer to resolve.
    pub async fn outcome(mut self) -> TransferResult {
        let published = match self.outcome.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        published.unwrap_or_else(|| Err(HelperError::Abandoned(self.filename)))
    }
}
