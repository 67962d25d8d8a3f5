// Typed failures surfaced to bridge callers.

use thiserror::Error;

use crate::config::PERMISSION_DENIED_ERROR;

/// Failure reported by the platform collaborator. The reason is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PlatformError {
    pub reason: String,
}

impl PlatformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for PlatformError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Every error a caller of the helper can observe.
///
/// The type is `Clone` because a single transfer outcome is fanned out to
/// every caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    /// The filename was rejected before any I/O.
    #[error("invalid filename {filename:?}: {reason}")]
    InvalidFilename {
        filename: String,
        reason: &'static str,
    },

    /// The base64 payload could not be decoded.
    #[error("invalid payload for {filename:?}: {reason}")]
    InvalidPayload { filename: String, reason: String },

    /// The platform write failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The platform existence query failed on a cache miss.
    #[error("existence check failed for {filename:?}: {source}")]
    ExistenceCheck {
        filename: String,
        source: PlatformError,
    },

    #[error("storage permission denied")]
    PermissionDenied,

    /// The bridge received an action it does not implement.
    #[error("unsupported action {0:?}")]
    UnknownAction(String),

    /// The bridge arguments did not match the action's signature.
    #[error("invalid arguments for {action}: {reason}")]
    InvalidArguments { action: String, reason: String },

    /// The transfer task went away without publishing an outcome.
    #[error("transfer for {0:?} ended without an outcome")]
    Abandoned(String),
}

impl HelperError {
    pub(crate) fn invalid_filename(filename: &str, reason: &'static str) -> Self {
        Self::InvalidFilename {
            filename: filename.to_string(),
            reason,
        }
    }

    /// Stable numeric code used in bridge error replies.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidFilename { .. } => 1,
            Self::InvalidPayload { .. } => 2,
            Self::Platform(_) => 3,
            Self::ExistenceCheck { .. } => 4,
            Self::UnknownAction(_) => 5,
            Self::Abandoned(_) => 6,
            Self::InvalidArguments { .. } => 7,
            Self::PermissionDenied => PERMISSION_DENIED_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_reason_is_verbatim() {
        let err = HelperError::from(PlatformError::new("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.code(), 3);
    }

    #[test]
    fn test_permission_denied_code() {
        assert_eq!(HelperError::PermissionDenied.code(), 20);
    }
}
