//! 交互层入口。
//!
//! 包含 TUI 与无 UI（旧 CLI）两套交互实现，共用 [`view`] 中的展示模型。

pub mod noui;
pub mod tui;
pub mod view;

use crate::catalog::SearchMode;

/// Start-up choices taken from the command line and config.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub mode: SearchMode,
    /// Searched immediately after start-up.
    pub query: Option<String>,
}
