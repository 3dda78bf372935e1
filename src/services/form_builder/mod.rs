//! 表单构建服务 - 业务能力层
//!
//! 按题型选择表单策略，每种题型一个实现；新增题型只需注册新策略。

pub mod mcq;
pub mod sanitize;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{FormError, Result};
use crate::models::filter::{FormFilter, QuestionType};
use crate::models::question::QuestionDetail;
use crate::models::result::FormDocument;

pub use mcq::McqFormStrategy;
pub use sanitize::clean_html;

/// 表单策略
///
/// 把题目详情渲染为表格表单并写入 `output_path`
///
/// 实现是同步的文件 I/O，由流程放到阻塞线程池中执行
pub trait FormStrategy: Send + Sync {
    fn question_type(&self) -> QuestionType;

    fn create_form(
        &self,
        details: &[QuestionDetail],
        filter: &FormFilter,
        output_path: &Path,
    ) -> Result<FormDocument>;
}

/// 题型 → 策略 注册表
#[derive(Default)]
pub struct FormStrategyRegistry {
    strategies: HashMap<QuestionType, Arc<dyn FormStrategy>>,
}

impl FormStrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册内置策略
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(McqFormStrategy::new(config.nbsp_as_line_break)));
        registry
    }

    /// 注册策略，同一题型后注册的覆盖先注册的
    pub fn register(&mut self, strategy: Box<dyn FormStrategy>) {
        self.strategies
            .insert(strategy.question_type(), Arc::from(strategy));
    }

    /// 查找策略
    pub fn get(&self, q_type: &QuestionType) -> Result<Arc<dyn FormStrategy>> {
        self.strategies
            .get(q_type)
            .cloned()
            .ok_or_else(|| FormError::UnsupportedQuestionType {
                q_type: q_type.to_string(),
            })
    }

    pub fn supported_types(&self) -> Vec<&QuestionType> {
        self.strategies.keys().collect()
    }
}
