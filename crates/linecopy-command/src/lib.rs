//! LineCopy 命令
//!
//! 把单个元素在当前二维视图中的投影复制为线：
//! 隔离导出到交换文件，重新导入，并放置到元素的锚点。
//! 整个过程在一个事务中完成，失败时回滚。

pub mod command;
pub mod error;
pub mod export;
pub mod placement;
pub mod session;
pub mod transaction;

pub use command::{matches_command, CommandResult, CopyAsLines, COMMAND_ALIASES, COMMAND_NAME};
pub use error::{CommandError, ExternalOperationFailed, PreconditionFailed};
pub use session::{EditingSession, ElementPicker, PresetPicker};
pub use transaction::Transaction;
