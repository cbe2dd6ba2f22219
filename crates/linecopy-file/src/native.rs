//! 原生文档格式（.lcd）
//!
//! 16 字节文件头 + Zstd 压缩的 MessagePack 文档内容。

use crate::document::{Document, DocumentMetadata, DocumentSettings, Model};
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数 "LCPY"
const MAGIC: &[u8; 4] = b"LCPY";

/// 当前文件格式版本
const FORMAT_VERSION: u32 = 1;

/// Zstd 压缩级别
const COMPRESSION_LEVEL: i32 = 3;

/// 文件头
#[derive(Debug, PartialEq, Eq)]
struct FileHeader {
    version: u32,
    /// 元素数量（用于快速预览，不参与校验）
    element_count: u32,
    compressed_size: u32,
}

impl FileHeader {
    fn write(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        writer.write_all(MAGIC)?;
        for field in [self.version, self.element_count, self.compressed_size] {
            writer.write_all(&field.to_le_bytes())?;
        }
        Ok(())
    }

    fn read(reader: &mut impl Read) -> Result<Self, FileError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a LineCopy document".to_string(),
            ));
        }

        let mut next = || -> Result<u32, FileError> {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        };

        Ok(Self {
            version: next()?,
            element_count: next()?,
            compressed_size: next()?,
        })
    }
}

/// 可序列化的文档内容
#[derive(Serialize, Deserialize)]
struct FileContent {
    metadata: DocumentMetadata,
    settings: DocumentSettings,
    model: Model,
}

/// 保存文档，存在未提交的事务时拒绝保存
pub fn save(document: &Document, path: &Path) -> Result<(), FileError> {
    if document.in_transaction() {
        return Err(FileError::Transaction(
            "cannot save while a transaction is open".to_string(),
        ));
    }

    let content = FileContent {
        metadata: document.metadata.clone(),
        settings: document.settings.clone(),
        model: document.model.clone(),
    };

    let msgpack_data = rmp_serde::to_vec(&content)?;
    let compressed_data = zstd::encode_all(msgpack_data.as_slice(), COMPRESSION_LEVEL)?;

    let header = FileHeader {
        version: FORMAT_VERSION,
        element_count: document.element_count() as u32,
        compressed_size: compressed_data.len() as u32,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    header.write(&mut writer)?;
    writer.write_all(&compressed_data)?;
    writer.flush()?;

    tracing::info!(
        "Saved {} elements, {} views to {} ({} bytes compressed)",
        document.element_count(),
        document.view_count(),
        path.display(),
        compressed_data.len()
    );

    Ok(())
}

/// 加载文档
pub fn load(path: &Path) -> Result<Document, FileError> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = FileHeader::read(&mut reader)?;

    if header.version > FORMAT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "File version {} is newer than supported version {}",
            header.version, FORMAT_VERSION
        )));
    }

    let mut compressed_data = vec![0u8; header.compressed_size as usize];
    reader.read_exact(&mut compressed_data)?;
    let msgpack_data = zstd::decode_all(compressed_data.as_slice())?;
    let content: FileContent = rmp_serde::from_slice(&msgpack_data)?;

    let mut document = Document::new();
    document.metadata = content.metadata;
    document.settings = content.settings;
    document.model = content.model;

    tracing::info!(
        "Loaded {} elements, {} views from {}",
        document.element_count(),
        document.view_count(),
        path.display()
    );

    Ok(document)
}
