//! XForm 转换器 - 基础设施层
//!
//! 持有外部转换程序（`xls2xform`），只暴露"把表格转换为 XForm"的能力。
//! 所有调用失败（找不到程序、权限、超时、非零退出）都归一为 `ConversionFailed`。

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{FormError, Result};

/// 表单转换能力
#[async_trait]
pub trait FormConverter: Send + Sync {
    async fn convert(&self, input_path: &Path, output_path: &Path) -> Result<()>;
}

/// 调用外部 `xls2xform` 命令的转换器
///
/// 职责：
/// - 启动子进程并等待结束（单次尝试，不重试）
/// - 超时或提前返回时子进程随句柄一起被杀掉
/// - 失败时删除不完整的输出文件
pub struct Xls2XformConverter {
    program: String,
    /// 放在两个路径参数之前的固定参数（如 `-m pyxform.xls2xform`）
    leading_args: Vec<String>,
    timeout: Duration,
}

impl Xls2XformConverter {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.converter_program.clone(),
            Duration::from_secs(config.converter_timeout_secs),
        )
        .with_args(config.converter_args.iter().cloned())
    }

    async fn run_child(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        let child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(input_path)
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FormError::conversion_failed(format!("无法启动 {}: {}", self.program, e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(FormError::conversion_failed(format!(
                    "等待 {} 结束失败: {}",
                    self.program, e
                )))
            }
            Err(_) => {
                return Err(FormError::conversion_failed(format!(
                    "{} 超时 ({} 秒)",
                    self.program,
                    self.timeout.as_secs()
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} stdout: {}", self.program, stdout.trim());

        if !output.status.success() {
            return Err(FormError::conversion_failed(format!(
                "{} 退出状态 {}: {}",
                self.program,
                output.status,
                diagnostic(&stderr, &stdout)
            )));
        }

        if !output_path.exists() {
            return Err(FormError::conversion_failed(format!(
                "{} 执行成功但未生成输出文件 {}",
                self.program,
                output_path.display()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl FormConverter for Xls2XformConverter {
    async fn convert(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!(
            "🔄 转换表单: {} → {}",
            input_path.display(),
            output_path.display()
        );

        match self.run_child(input_path, output_path).await {
            Ok(()) => {
                info!("✓ XForm 已生成: {}", output_path.display());
                Ok(())
            }
            Err(e) => {
                error!("❌ {}", e);
                remove_partial_output(output_path).await;
                Err(e)
            }
        }
    }
}

/// 优先使用 stderr，为空时退回 stdout
fn diagnostic<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim()
    } else {
        stderr
    }
}

async fn remove_partial_output(output_path: &Path) {
    if output_path.exists() {
        match tokio::fs::remove_file(output_path).await {
            Ok(()) => debug!("已删除不完整的输出文件: {}", output_path.display()),
            Err(e) => error!("无法删除输出文件 {}: {}", output_path.display(), e),
        }
    }
}
