use crate::models::filter::FormFilter;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 一个待处理的表单生成请求（一个 TOML 文件）
#[derive(Debug, Clone)]
pub struct FormRequest {
    /// 文件名（不含扩展名），仅用于日志
    pub name: String,
    pub filter: FormFilter,
    pub file_path: Option<String>,
}

/// 从 TOML 文件加载筛选条件
pub async fn load_toml_to_form_request(toml_file_path: &Path) -> Result<FormRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let filter: FormFilter = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    Ok(FormRequest {
        name: toml_file_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
        filter,
        file_path: Some(toml_file_path.to_string_lossy().to_string()),
    })
}

/// 从文件夹中加载所有 TOML 请求，按文件名排序
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<FormRequest>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut requests = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_toml_to_form_request(&path).await {
            Ok(request) => {
                tracing::info!(
                    "成功加载请求: {} 题 ({})",
                    request.filter.random_questions_count,
                    request.filter.q_type
                );
                requests.push(request);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(requests)
}
