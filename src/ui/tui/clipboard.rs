//! 剪贴板读取（Ctrl+V 粘贴到搜索框）。
//!
//! Desktop goes through arboard (`clipboard-arboard`); Android shells out to
//! Termux's `termux-clipboard-get`.

use anyhow::Result;

/// Clipboard text as a single search line, or `None` when there is nothing usable.
pub(super) fn get_text() -> Result<Option<String>> {
    Ok(backend::read()?.and_then(|raw| normalize(&raw)))
}

/// Collapse line breaks; blank text counts as empty.
fn normalize(raw: &str) -> Option<String> {
    let text = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(all(feature = "clipboard", target_os = "android"))]
mod backend {
    use std::process::Command;

    use anyhow::{Context, Result, bail};

    pub(super) fn read() -> Result<Option<String>> {
        let output = match Command::new("termux-clipboard-get").output() {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("run termux-clipboard-get"),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("termux-clipboard-get failed: {}", stderr.trim());
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

#[cfg(all(
    feature = "clipboard",
    feature = "clipboard-arboard",
    not(target_os = "android")
))]
mod backend {
    use anyhow::{Context, Result};

    pub(super) fn read() -> Result<Option<String>> {
        let mut clip = arboard::Clipboard::new().context("init clipboard")?;
        let text = clip.get_text().context("get clipboard text")?;
        Ok(Some(text))
    }
}

#[cfg(any(
    not(feature = "clipboard"),
    all(not(target_os = "android"), not(feature = "clipboard-arboard"))
))]
mod backend {
    use anyhow::Result;

    pub(super) fn read() -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn normalize_joins_lines_and_drops_blank() {
        assert_eq!(
            normalize("  Harry Potter\r\nand the Goblet \n\n"),
            Some("Harry Potter and the Goblet".to_string())
        );
        assert_eq!(normalize(" \n\t"), None);
        assert_eq!(normalize(""), None);
    }
}
