//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度：
//! - 扫描请求目录，加载所有 TOML 筛选请求
//! - 用 Semaphore 控制同时运行的流水线数量
//! - 每次运行交给 `workflow::FormFlow`，产物按运行 ID 隔离，互不干扰
//! - 记录结果日志并输出统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<FormRequest>)
//!     ↓
//! workflow::FormFlow (处理单个 FormFilter)
//!     ↓
//! services / clients (抽样、表单构建、题库、上传)
//!     ↓
//! infrastructure (xls2xform 子进程)
//! ```

pub mod batch_processor;

pub use batch_processor::{App, ProcessingStats};
