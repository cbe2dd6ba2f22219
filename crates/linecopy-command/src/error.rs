//! 命令错误定义

use linecopy_core::element::ElementId;
use linecopy_core::view::ViewKind;
use linecopy_file::FileError;
use std::path::PathBuf;
use thiserror::Error;

/// 前置条件不满足，此时尚未开启事务
#[derive(Error, Debug)]
pub enum PreconditionFailed {
    #[error("There is no active view")]
    NoActiveView,

    #[error("The active view must be a 2D view, found {}", .0.name())]
    NotTwoDimensionalView(ViewKind),

    #[error("Element {0} does not exist")]
    ElementMissing(ElementId),

    #[error("Could not determine a location for element {0}")]
    NoAnchor(ElementId),
}

/// 宿主的导出/导入/移动等操作失败，事务已回滚
#[derive(Error, Debug)]
pub enum ExternalOperationFailed {
    #[error("Failed to allocate the interchange file: {0}")]
    Allocate(#[source] FileError),

    #[error("Failed to duplicate the view: {0}")]
    DuplicateView(#[source] FileError),

    #[error("Failed to isolate the element: {0}")]
    Isolate(#[source] FileError),

    #[error("Export failed: {0}")]
    Export(#[source] FileError),

    #[error("Export wrote {} instead of {}", .written.display(), .expected.display())]
    UnexpectedExportPath { expected: PathBuf, written: PathBuf },

    #[error("Import failed: {0}")]
    Import(#[source] FileError),

    #[error("Import produced no element")]
    ImportProducedNoElement,

    #[error("Failed to move the imported element: {0}")]
    Move(#[source] FileError),

    #[error("Transaction failed: {0}")]
    Transaction(#[source] FileError),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Precondition(#[from] PreconditionFailed),

    #[error(transparent)]
    External(#[from] ExternalOperationFailed),
}
