/// ODK Aggregate 上传客户端
///
/// 把 XForm 及其媒体文件以 multipart 方式提交到 `formUpload` 接口。
use crate::config::Config;
use crate::error::{FormError, Result};
use crate::models::upload::{UploadResult, UploadStatus};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 表单上传能力
#[async_trait]
pub trait FormUploader: Send + Sync {
    async fn upload_form(&self, xform_path: &Path, media_paths: &[PathBuf]) -> Result<UploadResult>;
}

/// Aggregate 上传客户端
pub struct AggregateUploader {
    http: reqwest::Client,
    upload_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl AggregateUploader {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            upload_url: Self::upload_url(&config.aggregate_url),
            username: config.aggregate_username.clone(),
            password: config.aggregate_password.clone(),
        })
    }

    /// `<base>/formUpload`
    pub fn upload_url(base_url: &str) -> String {
        format!("{}/formUpload", base_url.trim_end_matches('/'))
    }

    /// 读取文件构建 multipart 片段
    async fn file_part(path: &Path, mime: &str) -> Result<Part> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            FormError::upload_failed(format!("无法读取文件 {}: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| FormError::upload_failed(format!("无效的 MIME 类型 {}: {}", mime, e)))
    }
}

#[async_trait]
impl FormUploader for AggregateUploader {
    async fn upload_form(&self, xform_path: &Path, media_paths: &[PathBuf]) -> Result<UploadResult> {
        info!(
            "📤 上传表单: {} (媒体文件 {} 个)",
            xform_path.display(),
            media_paths.len()
        );

        let mut form = Form::new().part(
            "form_def_file",
            Self::file_part(xform_path, "application/xml").await?,
        );
        for media in media_paths {
            form = form.part("datafile", Self::file_part(media, "application/octet-stream").await?);
        }

        let mut request = self.http.post(&self.upload_url).multipart(form);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            warn!("上传请求失败 ({}): {}", self.upload_url, e);
            FormError::upload_failed(format!("{}: {}", self.upload_url, e))
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("上传响应: {} {}", status, body);

        let payload: Value = json!({
            "httpStatus": status.as_u16(),
            "body": body,
        });

        if status.is_success() {
            Ok(UploadResult::new(UploadStatus::Uploaded, payload))
        } else {
            warn!("⚠️ Aggregate 拒绝了表单: {}", status);
            Ok(UploadResult::new(UploadStatus::Failed, payload))
        }
    }
}
