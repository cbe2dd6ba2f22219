//! 隔离导出
//!
//! 复制当前视图得到临时视图，临时隔离目标元素，再把临时视图导出为交换文件。
//! 临时视图的删除在创建时登记到事务，提交前执行。

use crate::error::ExternalOperationFailed;
use crate::session::EditingSession;
use crate::transaction::Transaction;
use linecopy_core::element::ElementId;
use linecopy_core::view::ViewId;
use linecopy_file::{ExportOptions, InterchangeFile, ViewDuplicateOption};
use std::path::PathBuf;

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedView {
    /// 临时视图（提交前删除）
    pub scratch_view: ViewId,
    pub path: PathBuf,
}

/// 导出只显示 `element` 的 `active_view` 副本到交换文件 `target`
pub fn export_isolated<S: EditingSession>(
    tx: &mut Transaction<'_, S>,
    active_view: ViewId,
    element: ElementId,
    target: &InterchangeFile,
) -> Result<ExportedView, ExternalOperationFailed> {
    let scratch_view = tx
        .duplicate_view(active_view, ViewDuplicateOption::Duplicate)
        .map_err(ExternalOperationFailed::DuplicateView)?;
    tx.defer(move |session| {
        session.delete_view(scratch_view)?;
        tracing::debug!("Deleted scratch view {}", scratch_view);
        Ok(())
    });

    tx.isolate_element_temporary(scratch_view, element)
        .map_err(ExternalOperationFailed::Isolate)?;

    let written = tx
        .export_view(
            scratch_view,
            target.directory(),
            &target.base_name(),
            &ExportOptions::default(),
        )
        .map_err(ExternalOperationFailed::Export)?;

    if written != target.path() {
        return Err(ExternalOperationFailed::UnexpectedExportPath {
            expected: target.path().to_path_buf(),
            written,
        });
    }

    tracing::info!(
        "Exported element {} through scratch view {} to {}",
        element,
        scratch_view,
        written.display()
    );

    Ok(ExportedView {
        scratch_view,
        path: written,
    })
}
