//! 封面缓存：失败的封面不重试；结果刷新时释放不再显示的封面。

use std::collections::{HashMap, HashSet};
use std::thread;

use anyhow::Result;
use tracing::{debug, warn};

use super::{App, WorkerMsg};
use crate::catalog::covers::{CoverSize, cover_url, fetch_cover, image_to_ascii};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum CoverSlot {
    Pending,
    Ready(Vec<String>),
    Failed,
}

#[derive(Debug, Default)]
pub(super) struct CoverCache {
    enabled: bool,
    slots: HashMap<(u64, CoverSize), CoverSlot>,
}

impl CoverCache {
    pub(super) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: HashMap::new(),
        }
    }

    /// Mark a cover as requested. Returns `true` only the first time.
    pub(super) fn claim(&mut self, id: u64, size: CoverSize) -> bool {
        if !self.enabled || self.slots.contains_key(&(id, size)) {
            return false;
        }
        self.slots.insert((id, size), CoverSlot::Pending);
        true
    }

    pub(super) fn finish(&mut self, id: u64, size: CoverSize, result: Result<Vec<String>>) {
        let slot = match result {
            Ok(lines) if !lines.is_empty() => CoverSlot::Ready(lines),
            Ok(_) => CoverSlot::Failed,
            Err(err) => {
                warn!(target: "cover", "封面 {id} 加载失败: {err:#}");
                CoverSlot::Failed
            }
        };
        self.slots.insert((id, size), slot);
    }

    /// Drop loaded art for covers no longer on screen.
    ///
    /// Pending and failed slots stay, so in-flight fetches land and failures
    /// are still never retried. Dropped art is fetched again if it reappears.
    pub(super) fn retain_art(&mut self, shown: &HashSet<u64>) {
        let before = self.slots.len();
        self.slots
            .retain(|(id, _), slot| !matches!(slot, CoverSlot::Ready(_)) || shown.contains(id));
        let dropped = before - self.slots.len();
        if dropped > 0 {
            debug!(target: "cover", "释放 {dropped} 张封面缓存");
        }
    }

    /// ASCII art for a loaded cover; `None` means draw the placeholder.
    pub(super) fn lines(&self, id: u64, size: CoverSize) -> Option<&[String]> {
        match self.slots.get(&(id, size)) {
            Some(CoverSlot::Ready(lines)) => Some(lines),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(super) fn slot(&self, id: u64, size: CoverSize) -> Option<&CoverSlot> {
        self.slots.get(&(id, size))
    }
}

/// Queue thumbnails for the current results and the large cover for the overlay.
pub(super) fn request_visible(app: &mut App) {
    let mut wanted: Vec<(u64, CoverSize)> = app
        .state
        .results()
        .iter()
        .filter_map(|b| b.summary.cover_id)
        .map(|id| (id, CoverSize::Medium))
        .collect();
    if let Some(id) = app.state.overlay_book().and_then(|b| b.summary.cover_id) {
        wanted.push((id, CoverSize::Large));
    }

    for (id, size) in wanted {
        if app.covers.claim(id, size) {
            spawn_fetch(app, id, size);
        }
    }
}

fn spawn_fetch(app: &App, id: u64, size: CoverSize) {
    let url = cover_url(app.config.covers_root(), id, size);
    let timeout = app.config.request_timeout();
    let tx = app.worker_tx.clone();
    debug!(target: "cover", "GET {url}");
    thread::spawn(move || {
        let (max_w, max_h) = size.ascii_bounds();
        let result = fetch_cover(&url, timeout).map(|img| image_to_ascii(&img, max_w, max_h));
        let _ = tx.send(WorkerMsg::CoverDone { id, size, result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn each_cover_is_claimed_once() {
        let mut cache = CoverCache::new(true);
        assert!(cache.claim(42, CoverSize::Medium));
        assert!(!cache.claim(42, CoverSize::Medium));
        assert!(cache.claim(42, CoverSize::Large));
        assert_eq!(cache.slot(42, CoverSize::Medium), Some(&CoverSlot::Pending));
        assert!(cache.lines(42, CoverSize::Medium).is_none());
    }

    #[test]
    fn failed_cover_is_not_retried() {
        let mut cache = CoverCache::new(true);
        assert!(cache.claim(7, CoverSize::Medium));
        cache.finish(7, CoverSize::Medium, Err(anyhow!("HTTP 404")));
        assert_eq!(cache.slot(7, CoverSize::Medium), Some(&CoverSlot::Failed));
        assert!(!cache.claim(7, CoverSize::Medium));
        assert!(cache.lines(7, CoverSize::Medium).is_none());
    }

    #[test]
    fn loaded_cover_returns_lines() {
        let mut cache = CoverCache::new(true);
        cache.claim(9, CoverSize::Large);
        cache.finish(9, CoverSize::Large, Ok(vec!["@@".into(), "##".into()]));
        assert_eq!(
            cache.lines(9, CoverSize::Large),
            Some(&["@@".to_string(), "##".to_string()][..])
        );

        cache.claim(10, CoverSize::Large);
        cache.finish(10, CoverSize::Large, Ok(Vec::new()));
        assert_eq!(cache.slot(10, CoverSize::Large), Some(&CoverSlot::Failed));
    }

    #[test]
    fn art_for_hidden_covers_is_released() {
        let mut cache = CoverCache::new(true);
        for id in [1, 2, 3] {
            cache.claim(id, CoverSize::Medium);
        }
        cache.finish(1, CoverSize::Medium, Ok(vec!["@".into()]));
        cache.finish(2, CoverSize::Medium, Ok(vec!["#".into()]));
        cache.claim(4, CoverSize::Medium);
        cache.finish(4, CoverSize::Medium, Err(anyhow!("HTTP 404")));

        cache.retain_art(&HashSet::from([2]));
        assert!(cache.slot(1, CoverSize::Medium).is_none());
        assert!(cache.lines(2, CoverSize::Medium).is_some());
        assert_eq!(cache.slot(3, CoverSize::Medium), Some(&CoverSlot::Pending));
        assert!(!cache.claim(4, CoverSize::Medium));
        assert!(cache.claim(1, CoverSize::Medium));
    }

    #[test]
    fn new_results_release_previous_covers() {
        let mut app = super::super::testing::app_with(serde_json::json!({
            "docs": [{"key": "/works/OL1W", "title": "Dune", "cover_i": 11}]
        }));
        app.covers = CoverCache::new(true);
        app.covers.claim(99, CoverSize::Medium);
        app.covers.finish(99, CoverSize::Medium, Ok(vec!["old".into()]));
        app.covers.claim(11, CoverSize::Medium);
        app.covers.finish(11, CoverSize::Medium, Ok(vec!["new".into()]));

        super::super::testing::search_now(&mut app, "dune");
        assert!(app.covers.lines(99, CoverSize::Medium).is_none());
        assert!(app.covers.lines(11, CoverSize::Medium).is_some());
    }

    #[test]
    fn disabled_cache_never_claims() {
        let mut cache = CoverCache::new(false);
        assert!(!cache.claim(1, CoverSize::Medium));
        assert!(cache.slot(1, CoverSize::Medium).is_none());
    }
}
