use std::path::{Path, PathBuf};

use uuid::Uuid;

/// 一次流水线运行的所有产物路径
///
/// 两个文件共用同一个运行 ID 作为文件名，只有根目录和扩展名不同。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub run_id: String,
    pub xlsx_path: PathBuf,
    pub odk_path: PathBuf,
}

impl RunArtifacts {
    /// 生成新的运行 ID 并派生产物路径
    pub fn new(xlsx_root: impl AsRef<Path>, odk_root: impl AsRef<Path>) -> Self {
        Self::with_run_id(Uuid::new_v4().to_string(), xlsx_root, odk_root)
    }

    pub fn with_run_id(
        run_id: impl Into<String>,
        xlsx_root: impl AsRef<Path>,
        odk_root: impl AsRef<Path>,
    ) -> Self {
        let run_id = run_id.into();
        Self {
            xlsx_path: xlsx_root.as_ref().join(format!("{}.xlsx", run_id)),
            odk_path: odk_root.as_ref().join(format!("{}.xml", run_id)),
            run_id,
        }
    }
}
