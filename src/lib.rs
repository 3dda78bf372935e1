//! # QuML to ODK
//!
//! 从 QuML 题库随机抽取选择题，生成 ODK XForm 表单，并可选上传到 ODK Aggregate
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源（xls2xform 子进程），只暴露能力
//! - `Xls2XformConverter` - 唯一的子进程调用者，提供 convert() 能力
//!
//! ### ② 业务能力层（Services / Clients）
//! - `clients/` - 题库搜索与详情查询、Aggregate 上传
//! - `services/` - 随机抽样、按题型生成表格表单
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次表单生成"的完整流程
//! - `RunCtx` - 上下文封装（运行 ID + 产物路径）
//! - `FormFlow` - 流程编排（搜索 → 抽样 → 详情 → 构建 → 转换 → 上传）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量请求处理器，管理并发和结果记录
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{FormError, Result};
pub use models::{FlowState, FormFilter, FormResult, QuestionType};
pub use orchestrator::{App, ProcessingStats};
pub use workflow::{FormFlow, RunCtx};
