//! 交换文件
//!
//! 一次命令调用使用的临时 DXF 文件。分配时即登记删除：
//! 显式 `close` 删除并报告错误，其余退出路径由 `Drop` 删除。

use crate::dxf_io::INTERCHANGE_EXTENSION;
use crate::error::FileError;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// 文件名前缀
const FILE_PREFIX: &str = "linecopy-";

/// 临时交换文件
#[derive(Debug)]
pub struct InterchangeFile {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl InterchangeFile {
    /// 在系统临时目录分配
    pub fn allocate() -> Result<Self, FileError> {
        Self::allocate_in(std::env::temp_dir())
    }

    /// 在指定目录分配
    pub fn allocate_in(directory: impl AsRef<Path>) -> Result<Self, FileError> {
        let guard = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(&format!(".{}", INTERCHANGE_EXTENSION))
            .tempfile_in(directory)?
            .into_temp_path();
        let path = guard.to_path_buf();
        tracing::debug!("Allocated interchange file {}", path.display());
        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 所在目录
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// 不含扩展名的文件名
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// 删除文件
    pub fn close(mut self) -> Result<(), FileError> {
        if let Some(guard) = self.guard.take() {
            guard.close()?;
            tracing::debug!("Removed interchange file {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for InterchangeFile {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            match guard.close() {
                Ok(()) => tracing::debug!("Removed interchange file {}", self.path.display()),
                Err(e) => tracing::warn!(
                    "Failed to remove interchange file {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}
