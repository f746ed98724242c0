//! 基础设施：配置、日志与 JSON 字段提取。

pub mod config;
pub mod context;
pub mod json_extract;
pub mod logging;
