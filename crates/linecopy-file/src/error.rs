//! 文件与文档操作错误定义

use linecopy_core::element::ElementId;
use linecopy_core::view::ViewId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("DXF error: {0}")]
    Dxf(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("View not found: {0}")]
    ViewNotFound(ViewId),

    #[error("Element {0} is pinned and cannot be moved")]
    ElementPinned(ElementId),

    #[error("Transaction error: {0}")]
    Transaction(String),
}
