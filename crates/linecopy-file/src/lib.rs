//! LineCopy 文件处理
//!
//! 支持：
//! - 内存文档模型（元素、视图、事务）
//! - `.dxf` 交换文件导出/导入
//! - 临时交换文件的分配与清理
//! - `.lcd` 原生格式

pub mod document;
pub mod dxf_io;
pub mod error;
pub mod interchange;
pub mod native;

pub use document::{Document, DocumentMetadata, DocumentSettings, ViewDuplicateOption};
pub use dxf_io::{ExportOptions, ImportOptions, ImportPlacement, ImportUnits, SolidExport};
pub use error::FileError;
pub use interchange::InterchangeFile;
