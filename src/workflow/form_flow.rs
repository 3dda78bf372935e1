//! 表单生成流程 - 流程层
//!
//! 核心职责：定义"一次表单生成"的完整流程
//!
//! 流程顺序：
//! 1. 题库搜索 → 随机抽样 → 详情查询
//! 2. 生成 xlsx 表单 → xls2xform 转换
//! 3. 上传到 Aggregate（可通过配置关闭）
//!
//! 任何阶段失败都直接进入 `Failed`，不在流程内部重试。

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::{AggregateUploader, FormUploader, QuestionBank, QuestionBankClient};
use crate::config::Config;
use crate::error::{FormError, Result};
use crate::infrastructure::{FormConverter, Xls2XformConverter};
use crate::models::filter::FormFilter;
use crate::models::question::{order_by_identifiers, QuestionDetail};
use crate::models::result::{FlowState, FormResult};
use crate::services::{FormStrategy, FormStrategyRegistry, RandomSampler};
use crate::workflow::run_ctx::RunCtx;

/// 表单生成流程
///
/// - 编排五个阶段并负责短路
/// - 不持有运行间共享的可变状态（随机源除外）
/// - 运行期错误全部写入 `FormResult`，不向外抛出
pub struct FormFlow {
    question_bank: Arc<dyn QuestionBank>,
    sampler: RandomSampler,
    strategies: FormStrategyRegistry,
    converter: Arc<dyn FormConverter>,
    uploader: Arc<dyn FormUploader>,
    upload_forms: bool,
    xlsx_root: PathBuf,
    odk_root: PathBuf,
    media_root: Option<PathBuf>,
}

impl FormFlow {
    /// 使用真实的题库、转换器和上传客户端创建
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config,
            Arc::new(QuestionBankClient::new(config)?),
            Arc::new(Xls2XformConverter::from_config(config)),
            Arc::new(AggregateUploader::new(config)?),
        ))
    }

    pub fn new(
        config: &Config,
        question_bank: Arc<dyn QuestionBank>,
        converter: Arc<dyn FormConverter>,
        uploader: Arc<dyn FormUploader>,
    ) -> Self {
        Self {
            question_bank,
            sampler: RandomSampler::from_config(config),
            strategies: FormStrategyRegistry::with_defaults(config),
            converter,
            uploader,
            upload_forms: config.upload_forms,
            xlsx_root: PathBuf::from(&config.xlsx_root),
            odk_root: PathBuf::from(&config.odk_root),
            media_root: config.media_root.as_ref().map(PathBuf::from),
        }
    }

    pub fn with_sampler(mut self, sampler: RandomSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_strategies(mut self, strategies: FormStrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    /// 执行一次完整流程
    ///
    /// 只有筛选条件不合法或题型不支持时返回 `Err`（均发生在任何 I/O 之前），
    /// 其余失败都体现在返回的 `FormResult` 中。
    pub async fn run(&self, filter: &FormFilter) -> Result<FormResult> {
        filter.validate()?;
        let strategy = self.strategies.get(&filter.q_type)?;

        let ctx = RunCtx::new(&self.xlsx_root, &self.odk_root);
        info!(
            "{} 🚀 开始生成表单 (题型: {}, 题目数: {})",
            ctx, filter.q_type, filter.random_questions_count
        );

        let mut result = FormResult::new(&ctx.artifacts);
        let mut state = FlowState::Fetching;

        let media = match self.generate(&ctx, filter, strategy, &mut state).await {
            Ok(media) => media,
            Err(e) => return Ok(self.fail(&ctx, result, state, e)),
        };

        if !self.upload_forms {
            info!("{} 上传已关闭，跳过上传阶段", ctx);
            return Ok(self.finish(&ctx, result.done()));
        }

        state = FlowState::Uploading;
        match self
            .uploader
            .upload_form(&ctx.artifacts.odk_path, &media)
            .await
        {
            Ok(upload) if upload.is_uploaded() => {
                info!("{} ✓ 表单上传成功", ctx);
                result.upload = Some(upload);
                Ok(self.finish(&ctx, result.done()))
            }
            Ok(upload) => {
                let err = FormError::upload_failed(format!(
                    "Form Upload Failed! (状态: {})",
                    upload.status.as_str()
                ));
                warn!("{} ⚠️ 上传结果: {:?}", ctx, upload.payload);
                result.upload = Some(upload);
                Ok(self.fail(&ctx, result, state, err))
            }
            Err(e) => Ok(self.fail(&ctx, result, state, e)),
        }
    }

    /// 前五个阶段：搜索 → 抽样 → 详情 → 构建 → 转换
    ///
    /// 返回需要随表单上传的本地媒体文件
    async fn generate(
        &self,
        ctx: &RunCtx,
        filter: &FormFilter,
        strategy: Arc<dyn FormStrategy>,
        state: &mut FlowState,
    ) -> Result<Vec<PathBuf>> {
        // ========== 阶段 1: 题库搜索 ==========
        *state = FlowState::Fetching;
        info!("{} 🔍 正在搜索题库...", ctx);
        let outcome = self.question_bank.search(filter).await?;
        info!(
            "{} ✓ 题库报告 {} 道可用题目，返回 {} 个 ID",
            ctx,
            outcome.total_available,
            outcome.identifiers.len()
        );

        // ========== 阶段 2: 随机抽样 ==========
        *state = FlowState::Sampling;
        let sample = self
            .sampler
            .sample(&outcome.identifiers, filter.random_questions_count)?;
        info!(
            "{} 🎲 随机抽取题目 ({}/{})",
            ctx,
            sample.len(),
            outcome.identifiers.len()
        );

        // ========== 阶段 3: 详情查询 ==========
        *state = FlowState::DetailFetch;
        let details = self.question_bank.fetch_details(&sample).await?;
        let (details, missing) = order_by_identifiers(details, &sample);
        if !missing.is_empty() {
            warn!("{} ⚠️ 题库未返回以下题目的详情: {:?}", ctx, missing);
        }
        debug!("{} 获取到 {} 道题目详情", ctx, details.len());

        // ========== 阶段 4: 生成表格表单 ==========
        *state = FlowState::Building;
        let (doc, details) = {
            let filter = filter.clone();
            let output_path = ctx.artifacts.xlsx_path.clone();
            tokio::task::spawn_blocking(move || {
                strategy
                    .create_form(&details, &filter, &output_path)
                    .map(|doc| (doc, details))
            })
            .await
            .map_err(|e| {
                FormError::build_failed(
                    ctx.artifacts.xlsx_path.to_string_lossy(),
                    format!("表单构建任务异常: {}", e),
                )
            })??
        };
        debug!(
            "{} 表单已写入 {} ({} 道题, {} 个选项)",
            ctx,
            doc.path.display(),
            doc.question_rows,
            doc.choice_rows
        );

        // ========== 阶段 5: 转换为 XForm ==========
        *state = FlowState::Converting;
        self.converter
            .convert(&doc.path, &ctx.artifacts.odk_path)
            .await?;

        Ok(self.local_media(&details))
    }

    /// 题目引用的、已存在于本地媒体目录中的文件
    fn local_media(&self, details: &[QuestionDetail]) -> Vec<PathBuf> {
        let Some(media_root) = &self.media_root else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        details
            .iter()
            .flat_map(|d| d.media.iter())
            .filter_map(|m| m.file_name())
            .filter(|name| seen.insert(name.to_string()))
            .map(|name| media_root.join(name))
            .filter(|path| path.exists())
            .collect()
    }

    fn fail(&self, ctx: &RunCtx, result: FormResult, stage: FlowState, err: FormError) -> FormResult {
        error!("{} ❌ 阶段 {} 失败 [{}]: {}", ctx, stage, err.kind(), err);
        result.failed(stage, &err)
    }

    fn finish(&self, ctx: &RunCtx, result: FormResult) -> FormResult {
        info!("{} ✅ 表单生成完成", ctx);
        info!("{} xlsx: {}", ctx, result.xlsx_file);
        info!("{} xml: {}", ctx, result.odk_file);
        result
    }
}
