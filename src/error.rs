use thiserror::Error;

/// 表单生成流水线错误类型
///
/// 每个组件只抛出属于自己的错误种类，编排层不做二次解释，
/// 只记录错误发生在哪个阶段。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    /// 筛选条件不合法（在任何 I/O 之前失败）
    #[error("筛选条件不合法: {reason}")]
    InvalidFilter { reason: String },

    /// 题库或上传服务不可用 / 返回非成功响应
    #[error("上游服务不可用 ({endpoint}): status={status:?}, {message}")]
    UpstreamUnavailable {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// 可用题目数量不足（少于或恰好等于请求数量）
    #[error("可用题目不足: 请求 {requested} 道, 题库仅有 {available} 道")]
    InsufficientQuestions { requested: usize, available: usize },

    /// 没有注册该题型的表单策略
    #[error("不支持的题型: {q_type}")]
    UnsupportedQuestionType { q_type: String },

    /// 表格文件生成失败
    #[error("表单文件生成失败 ({path}): {message}")]
    FormBuildFailed { path: String, message: String },

    /// 外部转换工具执行失败
    #[error("XForm 转换失败: {message}")]
    ConversionFailed { message: String },

    /// 表单上传失败
    #[error("表单上传失败: {message}")]
    UploadFailed { message: String },
}

impl FormError {
    /// 稳定的错误种类标签，用于日志和结果描述
    pub fn kind(&self) -> &'static str {
        match self {
            FormError::InvalidFilter { .. } => "INVALID_FILTER",
            FormError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            FormError::InsufficientQuestions { .. } => "INSUFFICIENT_QUESTIONS",
            FormError::UnsupportedQuestionType { .. } => "UNSUPPORTED_QUESTION_TYPE",
            FormError::FormBuildFailed { .. } => "FORM_BUILD_FAILED",
            FormError::ConversionFailed { .. } => "CONVERSION_FAILED",
            FormError::UploadFailed { .. } => "UPLOAD_FAILED",
        }
    }
}

// ========== 便捷构造函数 ==========

impl FormError {
    /// 创建筛选条件错误
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        FormError::InvalidFilter {
            reason: reason.into(),
        }
    }

    /// 创建上游服务错误
    pub fn upstream(endpoint: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        FormError::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// 创建表单生成错误
    pub fn build_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        FormError::FormBuildFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 创建转换错误
    pub fn conversion_failed(message: impl Into<String>) -> Self {
        FormError::ConversionFailed {
            message: message.into(),
        }
    }

    /// 创建上传错误
    pub fn upload_failed(message: impl Into<String>) -> Self {
        FormError::UploadFailed {
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 流水线组件结果类型
pub type Result<T> = std::result::Result<T, FormError>;
