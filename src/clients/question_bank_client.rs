/// 题库 API 客户端
///
/// 封装所有与 QuML 题库相关的调用逻辑：筛选搜索和批量详情查询。
use crate::config::Config;
use crate::error::{FormError, Result};
use crate::models::filter::FormFilter;
use crate::models::question::{parse_question_details, QuestionDetail, SearchOutcome};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// 题库能力
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// 按筛选条件搜索，返回可用总数和题目 ID
    async fn search(&self, filter: &FormFilter) -> Result<SearchOutcome>;

    /// 按 ID 批量查询详情，返回顺序不保证与输入一致
    async fn fetch_details(&self, identifiers: &[String]) -> Result<Vec<QuestionDetail>>;
}

/// 题库 API 客户端
pub struct QuestionBankClient {
    http: reqwest::Client,
    search_url: String,
    details_url: String,
}

impl QuestionBankClient {
    /// 创建新的题库客户端
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            search_url: config.question_bank_url.clone(),
            details_url: config.question_details_url.clone(),
        })
    }

    /// 构建搜索请求体
    pub fn build_search_body(filter: &FormFilter) -> Value {
        json!({
            "request": {
                "filters": {
                    "se_boards": filter.boards,
                    "gradeLevel": filter.grades,
                    "subject": filter.subjects,
                    "qType": filter.q_type.as_str(),
                    "topic": filter.competencies,
                }
            }
        })
    }

    /// 构建详情请求体
    pub fn build_details_body(identifiers: &[String]) -> Value {
        json!({
            "request": {
                "search": {
                    "identifier": identifiers,
                }
            }
        })
    }

    /// 提取搜索结果：`result.count` 和 `result.Question[].identifier`
    pub fn parse_search_response(result: &Value) -> SearchOutcome {
        let result = result.get("result");

        let total_available = result
            .and_then(|r| r.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let identifiers = result
            .and_then(|r| r.get("Question"))
            .and_then(|v| v.as_array())
            .map(|questions| {
                questions
                    .iter()
                    .filter_map(|q| q.get("identifier").and_then(|v| v.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        SearchOutcome {
            total_available,
            identifiers,
        }
    }

    /// 发送 JSON POST 请求，只接受 2xx 响应
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!("POST {} Payload: {}", url, body);

        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("题库请求失败 ({}): {}", url, e);
                FormError::upstream(url, e.status().map(|s| s.as_u16()), e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("题库返回错误响应 ({}): {} {}", url, status, text);
            return Err(FormError::upstream(url, Some(status.as_u16()), text));
        }

        response.json::<Value>().await.map_err(|e| {
            warn!("题库响应解析失败 ({}): {}", url, e);
            FormError::upstream(url, Some(status.as_u16()), format!("响应解析失败: {}", e))
        })
    }
}

#[async_trait]
impl QuestionBank for QuestionBankClient {
    async fn search(&self, filter: &FormFilter) -> Result<SearchOutcome> {
        let body = Self::build_search_body(filter);
        let result = self.post_json(&self.search_url, &body).await?;
        let outcome = Self::parse_search_response(&result);

        debug!(
            "搜索结果: count={}, 返回 {} 个 ID",
            outcome.total_available,
            outcome.identifiers.len()
        );

        Ok(outcome)
    }

    async fn fetch_details(&self, identifiers: &[String]) -> Result<Vec<QuestionDetail>> {
        let body = Self::build_details_body(identifiers);
        let result = self.post_json(&self.details_url, &body).await?;
        Ok(parse_question_details(&result))
    }
}
