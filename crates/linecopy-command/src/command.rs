//! 复制为线命令
//!
//! 流程：
//! 1. 检查当前视图为二维视图
//! 2. 拾取元素并解析锚点（失败时不创建文件、不开启事务）
//! 3. 分配交换文件，开启事务
//! 4. 隔离导出 -> 导入 -> 放置到锚点 -> 提交
//!
//! 任一外部操作失败都回滚整个事务；交换文件在所有退出路径上删除。

use crate::error::{CommandError, ExternalOperationFailed, PreconditionFailed};
use crate::export::export_isolated;
use crate::placement::import_and_place;
use crate::session::{EditingSession, ElementPicker};
use crate::transaction::Transaction;
use linecopy_core::anchor::{AnchorPoint, AnchorResolver};
use linecopy_core::element::ElementId;
use linecopy_core::view::ViewId;
use linecopy_file::InterchangeFile;
use std::path::PathBuf;

/// 注册到宿主的命令名
pub const COMMAND_NAME: &str = "COPYASLINES";

/// 命令别名
pub const COMMAND_ALIASES: &[&str] = &["CAL"];

/// 事务名称
pub const TRANSACTION_NAME: &str = "Copy Element As Lines";

const PICK_PROMPT: &str = "选择要复制为线的元素:";

/// 命令执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// 成功，返回新建的元素
    Succeeded(ElementId),
    /// 用户取消拾取
    Cancelled,
    /// 失败，附带给用户的消息
    Failed(String),
}

/// 复制为线命令
#[derive(Debug, Clone, Default)]
pub struct CopyAsLines {
    resolver: AnchorResolver,
    /// 交换文件目录（默认系统临时目录）
    scratch_dir: Option<PathBuf>,
}

impl CopyAsLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: AnchorResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// 执行命令并把结果转换为宿主的结果/消息
    pub fn execute<S, P>(&self, session: &mut S, picker: &mut P) -> CommandResult
    where
        S: EditingSession,
        P: ElementPicker + ?Sized,
    {
        match self.run(session, picker) {
            Ok(Some(id)) => CommandResult::Succeeded(id),
            Ok(None) => CommandResult::Cancelled,
            Err(e) => {
                tracing::error!("{} failed: {}", COMMAND_NAME, e);
                CommandResult::Failed(e.to_string())
            }
        }
    }

    /// 执行命令，用户取消时返回 `Ok(None)`
    pub fn run<S, P>(&self, session: &mut S, picker: &mut P) -> Result<Option<ElementId>, CommandError>
    where
        S: EditingSession,
        P: ElementPicker + ?Sized,
    {
        let view = session.active_view().ok_or(PreconditionFailed::NoActiveView)?;
        if !view.is_2d() {
            return Err(PreconditionFailed::NotTwoDimensionalView(view.kind).into());
        }
        let active_view = view.id;

        let Some(picked) = picker.pick_element(PICK_PROMPT) else {
            tracing::info!("{} cancelled", COMMAND_NAME);
            return Ok(None);
        };

        let element = session
            .element(picked)
            .ok_or(PreconditionFailed::ElementMissing(picked))?;
        let anchor = self
            .resolver
            .resolve(element)
            .ok_or(PreconditionFailed::NoAnchor(picked))?;
        tracing::info!(
            "Anchor for element {} from {}: ({:.4}, {:.4}, {:.4})",
            picked,
            anchor.source.name(),
            anchor.point.x,
            anchor.point.y,
            anchor.point.z
        );

        let file = match &self.scratch_dir {
            Some(dir) => InterchangeFile::allocate_in(dir),
            None => InterchangeFile::allocate(),
        }
        .map_err(ExternalOperationFailed::Allocate)?;

        let created = Self::round_trip(session, &file, active_view, picked, &anchor)?;

        if let Err(e) = file.close() {
            tracing::warn!("Interchange file cleanup failed: {}", e);
        }

        tracing::info!("{} created element {} from element {}", COMMAND_NAME, created, picked);
        Ok(Some(created))
    }

    /// 事务内的导出、导入和放置；失败时显式回滚
    fn round_trip<S: EditingSession>(
        session: &mut S,
        file: &InterchangeFile,
        active_view: ViewId,
        element: ElementId,
        anchor: &AnchorPoint,
    ) -> Result<ElementId, ExternalOperationFailed> {
        let mut tx = Transaction::begin(session, TRANSACTION_NAME)
            .map_err(ExternalOperationFailed::Transaction)?;

        let staged = export_isolated(&mut tx, active_view, element, file)
            .and_then(|exported| import_and_place(&mut *tx, &exported.path, anchor, active_view));

        match staged {
            Ok(created) => {
                tx.commit().map_err(ExternalOperationFailed::Transaction)?;
                Ok(created)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::error!("Rollback after '{}' failed: {}", e, rollback);
                }
                Err(e)
            }
        }
    }
}

/// 命令名或别名是否指向本命令（不区分大小写）
pub fn matches_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case(COMMAND_NAME)
        || COMMAND_ALIASES.iter().any(|alias| input.eq_ignore_ascii_case(alias))
}
