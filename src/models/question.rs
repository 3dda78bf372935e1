use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// 题库搜索结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// 题库报告的可用题目总数
    pub total_available: usize,
    /// 本次返回的题目 ID
    pub identifiers: Vec<String>,
}

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// 题库中的选项值（通常为 0 开始的索引）
    pub value: String,
    /// 选项内容（原始 HTML）
    pub label: String,
    pub is_correct: bool,
}

/// 媒体引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: Option<String>,
    pub src: String,
    pub media_type: Option<String>,
}

impl MediaRef {
    /// `src` 的文件名部分
    pub fn file_name(&self) -> Option<&str> {
        self.src
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }
}

/// 题目详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub identifier: String,
    pub q_type: String,
    /// 题干（原始 HTML，渲染前需要清洗）
    pub stem: String,
    pub options: Vec<AnswerOption>,
    pub media: Vec<MediaRef>,
}

impl QuestionDetail {
    /// 从题库返回的单个题目 JSON 解析
    ///
    /// 优先读取 `editorState`，缺失时退回 `body` + `interactions` + `responseDeclaration`。
    pub fn from_value(item: &JsonValue) -> Option<Self> {
        let identifier = item.get("identifier")?.as_str()?.to_string();
        let q_type = item
            .get("qType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let editor_state = item.get("editorState");

        let stem = editor_state
            .and_then(|s| s.get("question"))
            .and_then(|v| v.as_str())
            .or_else(|| item.get("body").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();

        let mut options = editor_state
            .and_then(|s| s.get("options"))
            .and_then(|v| v.as_array())
            .map(|opts| parse_editor_options(opts))
            .unwrap_or_default();

        if options.is_empty() {
            options = parse_interaction_options(item);
        }

        let media = item
            .get("media")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| {
                        Some(MediaRef {
                            id: m.get("id").and_then(|v| v.as_str()).map(String::from),
                            src: m.get("src")?.as_str()?.to_string(),
                            media_type: m.get("type").and_then(|v| v.as_str()).map(String::from),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            identifier,
            q_type,
            stem,
            options,
            media,
        })
    }

    /// 被标记为正确的选项数量
    pub fn correct_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_correct).count()
    }
}

/// 解析题目详情接口的完整响应（`result.questions[]`）
pub fn parse_question_details(payload: &JsonValue) -> Vec<QuestionDetail> {
    payload
        .get("result")
        .and_then(|r| r.get("questions"))
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(QuestionDetail::from_value).collect())
        .unwrap_or_default()
}

/// 按抽样顺序重新排列题目详情
///
/// 详情接口不保证返回顺序，这里按 ID 关联；缺失的 ID 直接跳过，并返回缺失列表。
pub fn order_by_identifiers(
    details: Vec<QuestionDetail>,
    identifiers: &[String],
) -> (Vec<QuestionDetail>, Vec<String>) {
    let mut by_id: HashMap<String, QuestionDetail> = details
        .into_iter()
        .map(|d| (d.identifier.clone(), d))
        .collect();

    let mut ordered = Vec::with_capacity(identifiers.len());
    let mut missing = Vec::new();
    for id in identifiers {
        match by_id.remove(id) {
            Some(detail) => ordered.push(detail),
            None => missing.push(id.clone()),
        }
    }
    (ordered, missing)
}

fn parse_editor_options(opts: &[JsonValue]) -> Vec<AnswerOption> {
    opts.iter()
        .enumerate()
        .map(|(idx, opt)| {
            let value = opt.get("value");
            AnswerOption {
                value: value
                    .and_then(|v| v.get("value"))
                    .map(value_to_string)
                    .unwrap_or_else(|| idx.to_string()),
                label: value
                    .and_then(|v| v.get("body"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                is_correct: opt.get("answer").and_then(|v| v.as_bool()).unwrap_or(false),
            }
        })
        .collect()
}

fn parse_interaction_options(item: &JsonValue) -> Vec<AnswerOption> {
    let correct = correct_response_values(item);

    item.get("interactions")
        .and_then(|i| i.get("response1"))
        .and_then(|r| r.get("options"))
        .and_then(|v| v.as_array())
        .map(|opts| {
            opts.iter()
                .enumerate()
                .map(|(idx, opt)| {
                    let value = opt
                        .get("value")
                        .map(value_to_string)
                        .unwrap_or_else(|| idx.to_string());
                    AnswerOption {
                        is_correct: correct.contains(&value),
                        label: opt
                            .get("label")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        value,
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `responseDeclaration.response1.correctResponse.value` 可能是数字、字符串或数组
fn correct_response_values(item: &JsonValue) -> Vec<String> {
    let value = item
        .get("responseDeclaration")
        .and_then(|r| r.get("response1"))
        .and_then(|r| r.get("correctResponse"))
        .and_then(|r| r.get("value"));

    match value {
        Some(JsonValue::Array(values)) => values.iter().map(value_to_string).collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(v) => vec![value_to_string(v)],
    }
}

fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
