//! 批量请求处理器 - 编排层
//!
//! 负责应用生命周期：加载请求、控制并发、记录结果、输出统计。

use crate::config::Config;
use crate::models::loaders::{load_all_toml_files, FormRequest};
use crate::models::result::FormResult;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_requests_loaded, log_startup, print_final_stats,
};
use crate::workflow::FormFlow;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<FormFlow>,
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// `阶段/错误类型` → 失败次数，如 `SAMPLING/INSUFFICIENT_QUESTIONS`
    pub failures_by_stage: BTreeMap<String, usize>,
    /// 未能写入结果日志的结果数
    pub unrecorded: usize,
}

impl ProcessingStats {
    fn record_failure(&mut self, label: &str) {
        self.failed += 1;
        *self.failures_by_stage.entry(label.to_string()).or_insert(0) += 1;
    }
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        for dir in [&config.xlsx_root, &config.odk_root] {
            fs::create_dir_all(dir).with_context(|| format!("无法创建目录: {}", dir))?;
        }

        let flow = FormFlow::from_config(&config)?;
        Ok(Self::with_flow(config, flow))
    }

    /// 使用自定义流程创建（测试用）
    pub fn with_flow(config: Config, flow: FormFlow) -> Self {
        Self {
            config,
            flow: Arc::new(flow),
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        info!("\n📁 正在扫描待处理的请求...");
        let requests = load_all_toml_files(&self.config.request_folder).await?;

        if requests.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_requests_loaded(requests.len(), self.config.max_concurrent_runs);

        let stats = self.process_all(requests).await;
        print_final_stats(&stats, &self.config.result_log_file);

        Ok(stats)
    }

    /// 分批并发处理所有请求
    ///
    /// 单个请求的任何失败（包括结果日志写入失败）只计入统计，不中断批次
    pub async fn process_all(&self, requests: Vec<FormRequest>) -> ProcessingStats {
        let max_concurrent = self.config.max_concurrent_runs.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let total = requests.len();
        let total_batches = (total + max_concurrent - 1) / max_concurrent;
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (batch_idx, batch) in requests.chunks(max_concurrent).enumerate() {
            let batch_start = batch_idx * max_concurrent;
            log_batch_start(batch_idx + 1, total_batches, batch);

            let mut handles = Vec::with_capacity(batch.len());
            for (offset, request) in batch.iter().enumerate() {
                let request_index = batch_start + offset + 1;
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("[请求 {}] 无法获取并发许可: {}", request_index, e);
                        stats.record_failure("TASK/NO_PERMIT");
                        continue;
                    }
                };
                let flow = Arc::clone(&self.flow);
                let request = request.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    let outcome = flow.run(&request.filter).await;
                    (request, outcome)
                });
                handles.push((request_index, handle));
            }

            // 必须等完本批所有任务，中途不能返回
            let mut batch_success = 0;
            let mut batch_failures = Vec::new();
            for (request_index, handle) in handles {
                match handle.await {
                    Ok((request, Ok(result))) => {
                        if let Err(e) = self.append_result(&request, &result) {
                            error!("[请求 {}] ❌ 结果日志写入失败: {:#}", request_index, e);
                            stats.unrecorded += 1;
                        }
                        if result.is_success() {
                            batch_success += 1;
                            cleanup_file(request.file_path.as_deref(), request_index);
                        } else {
                            error!(
                                "[请求 {}] ❌ {} 处理失败: {}",
                                request_index, request.name, result.error_msg
                            );
                            let label = failure_label(&result);
                            stats.record_failure(&label);
                            batch_failures.push(label);
                        }
                    }
                    Ok((request, Err(e))) => {
                        error!("[请求 {}] ❌ {} 被拒绝: {}", request_index, request.name, e);
                        let label = format!("REJECTED/{}", e.kind());
                        stats.record_failure(&label);
                        batch_failures.push(label);
                    }
                    Err(e) => {
                        error!("[请求 {}] 任务执行失败: {}", request_index, e);
                        let label = "TASK/JOIN_ERROR".to_string();
                        stats.record_failure(&label);
                        batch_failures.push(label);
                    }
                }
            }

            stats.success += batch_success;
            log_batch_complete(batch_idx + 1, batch_success, &batch_failures);
        }

        stats
    }

    /// 追加一行 JSON 结果到结果日志
    fn append_result(&self, request: &FormRequest, result: &FormResult) -> Result<()> {
        let line = serde_json::json!({
            "request": request.name,
            "finishedAt": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "result": result,
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.result_log_file)
            .with_context(|| format!("无法打开结果日志: {}", self.config.result_log_file))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// 失败结果的 `阶段/错误类型` 标签
fn failure_label(result: &FormResult) -> String {
    let stage = result
        .failed_stage
        .map(|stage| stage.code().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let kind = result.error_kind.as_deref().unwrap_or("UNKNOWN");
    format!("{}/{}", stage, kind)
}

/// 删除已成功处理的请求文件，失败的请求保留以便重跑
fn cleanup_file(file_path: Option<&str>, request_index: usize) {
    let Some(file_path) = file_path else {
        return;
    };

    if !Path::new(file_path).exists() {
        warn!("[请求 {}] ⚠️ 文件不存在: {}", request_index, file_path);
        return;
    }

    match fs::remove_file(file_path) {
        Ok(()) => info!("[请求 {}] 🗑️ 已删除请求文件: {}", request_index, file_path),
        Err(e) => warn!("[请求 {}] ⚠️ 无法删除请求文件 {}: {}", request_index, file_path, e),
    }
}
