//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};
use crate::catalog::SearchMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 程序配置
    #[serde(default = "default_false")]
    pub old_cli: bool,
    #[serde(default = "default_mode")]
    pub default_mode: String,
    #[serde(default = "default_true")]
    pub show_covers: bool,

    // 网络配置
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,
    #[serde(default = "default_covers_base_url")]
    pub covers_base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // 搜索行为
    #[serde(default = "default_true")]
    pub discard_stale_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            old_cli: default_false(),
            default_mode: default_mode(),
            show_covers: default_true(),
            catalog_base_url: default_catalog_base_url(),
            covers_base_url: default_covers_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            discard_stale_responses: default_true(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 8] = [
            FieldMeta {
                name: "old_cli",
                description: "Use the line-based interface instead of the TUI",
            },
            FieldMeta {
                name: "default_mode",
                description: "Initial search mode: [title, author, subject]",
            },
            FieldMeta {
                name: "show_covers",
                description: "Download cover thumbnails and draw them as ASCII art",
            },
            FieldMeta {
                name: "catalog_base_url",
                description: "Catalog root, used for search.json and record links",
            },
            FieldMeta {
                name: "covers_base_url",
                description: "Cover image service root",
            },
            FieldMeta {
                name: "request_timeout",
                description: "Request timeout in seconds, 0 waits indefinitely",
            },
            FieldMeta {
                name: "user_agent",
                description: "User-Agent header sent to the catalog",
            },
            FieldMeta {
                name: "discard_stale_responses",
                description: "Drop responses of searches superseded by a newer one\n(false: the last response to arrive wins)",
            },
        ];
        &FIELDS
    }
}

impl Config {
    pub fn initial_mode(&self) -> SearchMode {
        SearchMode::from_label(&self.default_mode)
    }

    /// `None` means no timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }

    pub fn catalog_root(&self) -> &str {
        self.catalog_base_url.trim_end_matches('/')
    }

    pub fn covers_root(&self) -> &str {
        self.covers_base_url.trim_end_matches('/')
    }
}

fn default_false() -> bool {
    false
}

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    "title".to_string()
}

fn default_catalog_base_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_covers_base_url() -> String {
    "https://covers.openlibrary.org".to_string()
}

fn default_request_timeout() -> u64 {
    0
}

fn default_user_agent() -> String {
    format!("book-finder/{}", env!("CARGO_PKG_VERSION"))
}
