//! 运行上下文
//!
//! 封装"这是哪一次运行、产物写到哪里"这一信息

use std::fmt::Display;
use std::path::Path;

use crate::models::artifact::RunArtifacts;

/// 单次流水线运行的上下文
#[derive(Debug, Clone)]
pub struct RunCtx {
    pub artifacts: RunArtifacts,
}

impl RunCtx {
    /// 生成新的运行 ID
    pub fn new(xlsx_root: impl AsRef<Path>, odk_root: impl AsRef<Path>) -> Self {
        Self {
            artifacts: RunArtifacts::new(xlsx_root, odk_root),
        }
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short: String = self.artifacts.run_id.chars().take(8).collect();
        write!(f, "[运行 {}]", short)
    }
}
