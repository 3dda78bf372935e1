/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::loaders::FormRequest;
use crate::orchestrator::ProcessingStats;
use tracing::{info, warn};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - QuML → ODK 表单生成");
    info!("📊 最大并发数: {}", config.max_concurrent_runs);
    info!("📂 xlsx 目录: {}", config.xlsx_root);
    info!("📂 xml 目录: {}", config.odk_root);
    info!(
        "📤 上传到 Aggregate: {}",
        if config.upload_forms { "开启" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录请求加载信息
///
/// # 参数
/// - `total`: 请求总数
/// - `max_concurrent`: 最大并发数
pub fn log_requests_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待处理的请求", total);
    info!("📋 将以每批 {} 个的方式处理", max_concurrent);
}

/// 记录批次开始信息，逐个列出本批请求的题型和题目数
pub fn log_batch_start(batch_num: usize, total_batches: usize, batch: &[FormRequest]) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批 ({} 个请求)", batch_num, total_batches, batch.len());
    for request in batch {
        info!(
            "  • {} → {} × {}{}",
            request.name,
            request.filter.q_type,
            request.filter.random_questions_count,
            request
                .filter
                .form_title
                .as_deref()
                .map(|t| format!(" 《{}》", t))
                .unwrap_or_default()
        );
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
///
/// `failures` 为本批失败请求的 `阶段/错误类型` 标签
pub fn log_batch_complete(batch_num: usize, forms_generated: usize, failures: &[String]) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 生成表单 {}/{}",
        batch_num,
        forms_generated,
        forms_generated + failures.len()
    );
    if !failures.is_empty() {
        info!("  失败: {}", failures.join(", "));
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息，失败按阶段和错误类型分组
pub fn print_final_stats(stats: &ProcessingStats, result_log_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 表单生成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("❌ 失败: {}", stats.failed);
    for (label, count) in &stats.failures_by_stage {
        info!("   {:<36} {}", label, count);
    }
    info!("{}", "=".repeat(60));
    if stats.unrecorded > 0 {
        warn!(
            "⚠️ {} 条结果未能写入结果日志: {}",
            stats.unrecorded, result_log_file
        );
    } else {
        info!("\n结果已保存至: {}", result_log_file);
    }
}
