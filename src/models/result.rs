use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FormError;
use crate::models::artifact::RunArtifacts;
use crate::models::upload::UploadResult;

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Fetching,
    Sampling,
    DetailFetch,
    Building,
    Converting,
    Uploading,
    Done,
    Failed,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowState::Fetching => "Fetching",
            FlowState::Sampling => "Sampling",
            FlowState::DetailFetch => "DetailFetch",
            FlowState::Building => "Building",
            FlowState::Converting => "Converting",
            FlowState::Uploading => "Uploading",
            FlowState::Done => "Done",
            FlowState::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

impl FlowState {
    /// 与序列化形式一致的大写代码，如 `DETAIL_FETCH`
    pub fn code(&self) -> &'static str {
        match self {
            FlowState::Fetching => "FETCHING",
            FlowState::Sampling => "SAMPLING",
            FlowState::DetailFetch => "DETAIL_FETCH",
            FlowState::Building => "BUILDING",
            FlowState::Converting => "CONVERTING",
            FlowState::Uploading => "UPLOADING",
            FlowState::Done => "DONE",
            FlowState::Failed => "FAILED",
        }
    }
}

/// 写入磁盘的表格表单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDocument {
    pub path: PathBuf,
    pub question_rows: usize,
    pub choice_rows: usize,
}

/// 一次运行的结果描述
///
/// 编排层不会向外抛出运行期错误，所有失败都记录在 `error` / `error_msg` 中。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResult {
    pub run_id: String,
    pub xlsx_file: String,
    pub odk_file: String,
    pub error: bool,
    pub error_msg: String,
    pub state: FlowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<FlowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadResult>,
}

impl FormResult {
    pub fn new(artifacts: &RunArtifacts) -> Self {
        Self {
            run_id: artifacts.run_id.clone(),
            xlsx_file: artifacts.xlsx_path.to_string_lossy().to_string(),
            odk_file: artifacts.odk_path.to_string_lossy().to_string(),
            error: false,
            error_msg: String::new(),
            state: FlowState::Fetching,
            failed_stage: None,
            error_kind: None,
            upload: None,
        }
    }

    /// 标记成功完成
    pub fn done(mut self) -> Self {
        self.state = FlowState::Done;
        self
    }

    /// 标记在某个阶段失败
    pub fn failed(mut self, stage: FlowState, err: &FormError) -> Self {
        self.state = FlowState::Failed;
        self.failed_stage = Some(stage);
        self.error = true;
        self.error_kind = Some(err.kind().to_string());
        self.error_msg = err.to_string();
        self
    }

    pub fn is_success(&self) -> bool {
        !self.error && self.state == FlowState::Done
    }
}
