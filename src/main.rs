//! Book Finder：Open Library 图书检索终端客户端。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/JSON 字段提取等基础设施
//! - `catalog`：检索请求、响应解码、封面
//! - `search`：搜索状态机与请求调度
//! - `ui`：TUI 与无 UI（old cli）两套交互

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::Path;

mod base_system;
mod catalog;
mod search;
mod ui;

use base_system::config::load_or_create_with_base;
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use catalog::SearchMode;
use tracing::info;
use ui::LaunchOptions;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "book-finder")]
#[command(about = "Search the Open Library catalog from the terminal")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 使用逐行交互的旧版 CLI（读屏友好）
    #[arg(long, default_value_t = false)]
    old_cli: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 数据目录路径（存放 config.yml 和 logs）
    #[arg(long)]
    data_dir: Option<String>,

    /// 初始搜索模式：title / author / subject
    #[arg(long)]
    mode: Option<String>,

    /// 启动后立即搜索
    #[arg(long)]
    query: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("Book Finder v{VERSION}");
        return Ok(());
    }

    let data_dir = cli.data_dir.as_deref().map(Path::new);
    let config = load_or_create_with_base::<Config>(None, data_dir).context("load config")?;
    let old_cli = cli.old_cli || config.old_cli;

    let log = init_logging(cli.debug, !old_cli, data_dir)?;
    info!(target: "startup", "当前版本: v{VERSION}");
    info!(target: "startup", "日志目录: {}", log.logs_dir().display());

    let launch = LaunchOptions {
        mode: cli
            .mode
            .as_deref()
            .map_or_else(|| config.initial_mode(), SearchMode::from_label),
        query: cli.query,
    };
    info!(
        target: "startup",
        "目录: {}, 封面: {}, 初始模式: {}",
        config.catalog_root(),
        config.covers_root(),
        launch.mode
    );

    if old_cli {
        ui::noui::run(&config, launch)
    } else {
        ui::tui::run(config, launch)
    }
}

fn init_logging(debug: bool, broadcast: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
        console: false,
        broadcast_to_ui: broadcast,
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
