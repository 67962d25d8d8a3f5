// Dynamic bridge entry: validates `(action, args)` calls into typed requests and
// serializes their results.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::media_file_api::MediaFileHelper;
use crate::error::HelperError;

pub const ACTION_DOWNLOAD_AUDIO_FILE: &str = "downloadAudioFile";
pub const ACTION_EXISTS: &str = "exists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    DownloadAudioFile { filename: String, base64: String },
    Exists { filename: String },
}

impl BridgeCall {
    /// Validate a positional argument array against the action's signature.
    pub fn parse(action: &str, args: &Value) -> Result<Self, HelperError> {
        let args = args.as_array().ok_or_else(|| HelperError::InvalidArguments {
            action: action.to_string(),
            reason: "arguments must be an array".to_string(),
        })?;

        match action {
            ACTION_DOWNLOAD_AUDIO_FILE => Ok(Self::DownloadAudioFile {
                filename: string_arg(action, args, 0)?,
                base64: string_arg(action, args, 1)?,
            }),
            ACTION_EXISTS => Ok(Self::Exists {
                filename: string_arg(action, args, 0)?,
            }),
            other => Err(HelperError::UnknownAction(other.to_string())),
        }
    }
}

fn string_arg(action: &str, args: &[Value], index: usize) -> Result<String, HelperError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(HelperError::InvalidArguments {
            action: action.to_string(),
            reason: format!("argument {} must be a string, got {}", index, other),
        }),
        None => Err(HelperError::InvalidArguments {
            action: action.to_string(),
            reason: format!("missing argument {}", index),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeReply {
    Ok { value: Value },
    Error { code: i32, message: String },
}

impl From<Result<Value, HelperError>> for BridgeReply {
    fn from(result: Result<Value, HelperError>) -> Self {
        match result {
            Ok(value) => Self::Ok { value },
            Err(e) => Self::Error {
                code: e.code(),
                message: e.to_string(),
            },
        }
    }
}

impl MediaFileHelper {
    /// Run a dynamic bridge call. Never panics on bad input; every failure is a reply.
    pub async fn execute(&self, action: &str, args: &Value) -> BridgeReply {
        debug!("bridge call action={}", action);
        let result = match BridgeCall::parse(action, args) {
            Ok(call) => self.dispatch(call).await,
            Err(e) => Err(e),
        };
        BridgeReply::from(result)
    }

    /// Same as [`Self::execute`] with JSON text in and out.
    pub async fn execute_json(&self, action: &str, args_json: &str) -> String {
        let reply = match serde_json::from_str::<Value>(args_json) {
            Ok(args) => self.execute(action, &args).await,
            Err(e) => BridgeReply::from(Err(HelperError::InvalidArguments {
                action: action.to_string(),
                reason: e.to_string(),
            })),
        };
        serde_json::to_string(&reply)
            .unwrap_or_else(|e| format!(r#"{{"status":"error","code":-1,"message":"{}"}}"#, e))
    }

    async fn dispatch(&self, call: BridgeCall) -> Result<Value, HelperError> {
        match call {
            BridgeCall::DownloadAudioFile { filename, base64 } => self
                .download_audio_file(&filename, &base64)
                .await
                .map(Value::String),
            BridgeCall::Exists { filename } => self.exists(&filename).await.map(Value::Bool),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_download() {
        let call = BridgeCall::parse(ACTION_DOWNLOAD_AUDIO_FILE, &json!(["a.mp3", "QUJD"])).unwrap();
        assert_eq!(
            call,
            BridgeCall::DownloadAudioFile {
                filename: "a.mp3".to_string(),
                base64: "QUJD".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            BridgeCall::parse(ACTION_EXISTS, &json!([42])),
            Err(HelperError::InvalidArguments { .. })
        ));
        assert!(matches!(
            BridgeCall::parse(ACTION_DOWNLOAD_AUDIO_FILE, &json!(["a.mp3"])),
            Err(HelperError::InvalidArguments { .. })
        ));
        assert!(matches!(
            BridgeCall::parse(ACTION_EXISTS, &json!({"filename": "a.mp3"})),
            Err(HelperError::InvalidArguments { .. })
        ));
        assert!(matches!(
            BridgeCall::parse("record", &json!([])),
            Err(HelperError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_reply_serialization() {
        let ok = BridgeReply::from(Ok(Value::Bool(true)));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "ok", "value": true})
        );

        let err = BridgeReply::from(Err(HelperError::PermissionDenied));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "code": 20, "message": "storage permission denied"})
        );
    }
}
