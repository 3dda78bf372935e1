use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};

/// 题型标签（统一为大写，如 `MCQ`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QuestionType(String);

impl QuestionType {
    pub const MCQ: &'static str = "MCQ";

    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_uppercase())
    }

    pub fn mcq() -> Self {
        Self::new(Self::MCQ)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuestionType {
    fn default() -> Self {
        Self::mcq()
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.0
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 用户提交的筛选条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFilter {
    #[serde(default)]
    pub boards: Vec<String>,
    #[serde(default)]
    pub grades: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// 能力点 / 知识点（对应题库的 `topic`）
    #[serde(default)]
    pub competencies: Vec<String>,
    #[serde(default, alias = "qType")]
    pub q_type: QuestionType,
    #[serde(alias = "randomQuestionsCount")]
    pub random_questions_count: usize,
    /// 表单标题（写入 settings 表）
    #[serde(default, alias = "formTitle", skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
}

impl FormFilter {
    /// 校验筛选条件，必须在任何网络或文件操作之前调用
    pub fn validate(&self) -> Result<()> {
        if self.random_questions_count == 0 {
            return Err(FormError::invalid_filter("随机题目数量必须大于 0"));
        }

        let has_dimension = [
            &self.boards,
            &self.grades,
            &self.subjects,
            &self.competencies,
        ]
        .iter()
        .any(|values| values.iter().any(|v| !v.trim().is_empty()));

        if !has_dimension {
            return Err(FormError::invalid_filter(
                "boards / grades / subjects / competencies 至少需要一项",
            ));
        }

        Ok(())
    }
}
