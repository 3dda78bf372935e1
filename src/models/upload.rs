use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 上传状态标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UploadStatus {
    Uploaded,
    Failed,
    /// 服务端返回的其他状态（如 `REJECTED`）
    Other(String),
}

impl UploadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            UploadStatus::Uploaded => "UPLOADED",
            UploadStatus::Failed => "FAILED",
            UploadStatus::Other(tag) => tag,
        }
    }
}

impl From<String> for UploadStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "UPLOADED" => UploadStatus::Uploaded,
            "FAILED" => UploadStatus::Failed,
            _ => UploadStatus::Other(value),
        }
    }
}

impl From<UploadStatus> for String {
    fn from(value: UploadStatus) -> Self {
        value.as_str().to_string()
    }
}

/// 上传结果，流水线不会自动重试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub status: UploadStatus,
    /// 服务端原始响应
    #[serde(default)]
    pub payload: JsonValue,
}

impl UploadResult {
    pub fn new(status: UploadStatus, payload: JsonValue) -> Self {
        Self { status, payload }
    }

    pub fn is_uploaded(&self) -> bool {
        self.status == UploadStatus::Uploaded
    }
}
