//! 宿主接口
//!
//! 命令通过 `EditingSession` 访问编辑会话，通过 `ElementPicker` 让用户拾取元素。
//! `Document` 直接实现 `EditingSession`。

use linecopy_core::element::{Element, ElementId};
use linecopy_core::math::Vector3;
use linecopy_core::view::{View, ViewId};
use linecopy_file::dxf_io;
use linecopy_file::{Document, ExportOptions, FileError, ImportOptions, ViewDuplicateOption};
use std::path::{Path, PathBuf};

/// 编辑会话
pub trait EditingSession {
    /// 当前视图
    fn active_view(&self) -> Option<&View>;

    fn element(&self, id: ElementId) -> Option<&Element>;

    // ========== 事务 ==========

    fn begin_transaction(&mut self, name: &str) -> Result<(), FileError>;

    fn commit_transaction(&mut self) -> Result<(), FileError>;

    fn rollback_transaction(&mut self) -> Result<(), FileError>;

    // ========== 视图 ==========

    fn duplicate_view(&mut self, view: ViewId, option: ViewDuplicateOption) -> Result<ViewId, FileError>;

    /// 在视图中临时隔离单个元素
    fn isolate_element_temporary(&mut self, view: ViewId, element: ElementId) -> Result<(), FileError>;

    fn delete_view(&mut self, view: ViewId) -> Result<(), FileError>;

    // ========== 导出/导入 ==========

    /// 导出视图到 `directory/base_name` 加格式扩展名，返回写出的路径
    fn export_view(
        &self,
        view: ViewId,
        directory: &Path,
        base_name: &str,
        options: &ExportOptions,
    ) -> Result<PathBuf, FileError>;

    /// 导入文件，返回新元素（没有可导入内容时为 None）
    fn import_file(
        &mut self,
        path: &Path,
        options: &ImportOptions,
        view: ViewId,
    ) -> Result<Option<ElementId>, FileError>;

    // ========== 元素修改 ==========

    fn is_pinned(&self, id: ElementId) -> Result<bool, FileError> {
        self.element(id)
            .map(|e| e.pinned)
            .ok_or(FileError::ElementNotFound(id))
    }

    fn set_pinned(&mut self, id: ElementId, pinned: bool) -> Result<(), FileError>;

    fn move_element(&mut self, id: ElementId, offset: &Vector3) -> Result<(), FileError>;
}

/// 交互式元素拾取
pub trait ElementPicker {
    /// 拾取一个元素，用户取消时返回 None
    fn pick_element(&mut self, prompt: &str) -> Option<ElementId>;
}

/// 预设结果的拾取器（脚本与测试使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetPicker(pub Option<ElementId>);

impl ElementPicker for PresetPicker {
    fn pick_element(&mut self, prompt: &str) -> Option<ElementId> {
        tracing::debug!("{} -> {:?}", prompt, self.0);
        self.0.take()
    }
}

impl EditingSession for Document {
    fn active_view(&self) -> Option<&View> {
        Document::active_view(self)
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        Document::element(self, id)
    }

    fn begin_transaction(&mut self, name: &str) -> Result<(), FileError> {
        Document::begin_transaction(self, name)
    }

    fn commit_transaction(&mut self) -> Result<(), FileError> {
        Document::commit_transaction(self)
    }

    fn rollback_transaction(&mut self) -> Result<(), FileError> {
        Document::rollback_transaction(self)
    }

    fn duplicate_view(&mut self, view: ViewId, option: ViewDuplicateOption) -> Result<ViewId, FileError> {
        Document::duplicate_view(self, view, option)
    }

    fn isolate_element_temporary(&mut self, view: ViewId, element: ElementId) -> Result<(), FileError> {
        self.isolate_temporary(view, &[element])
    }

    fn delete_view(&mut self, view: ViewId) -> Result<(), FileError> {
        self.remove_view(view).map(|_| ())
    }

    fn export_view(
        &self,
        view: ViewId,
        directory: &Path,
        base_name: &str,
        options: &ExportOptions,
    ) -> Result<PathBuf, FileError> {
        dxf_io::export_view(self, view, directory, base_name, options)
    }

    fn import_file(
        &mut self,
        path: &Path,
        options: &ImportOptions,
        view: ViewId,
    ) -> Result<Option<ElementId>, FileError> {
        dxf_io::import_into(self, path, options, view)
    }

    fn set_pinned(&mut self, id: ElementId, pinned: bool) -> Result<(), FileError> {
        Document::set_pinned(self, id, pinned)
    }

    fn move_element(&mut self, id: ElementId, offset: &Vector3) -> Result<(), FileError> {
        Document::move_element(self, id, offset)
    }
}
