//! Cover images and record links.
//!
//! Covers are fetched once and turned into ASCII art for the terminal. A
//! failed load is reported to the caller, which substitutes a placeholder.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, GenericImageView, imageops::FilterType};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, HeaderMap, HeaderValue};

/// Shown wherever a cover is absent or failed to load.
pub const PLACEHOLDER_GLYPH: &str = "📚";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverSize {
    /// Card thumbnail.
    Medium,
    /// Detail overlay.
    Large,
}

impl CoverSize {
    fn suffix(self) -> &'static str {
        match self {
            Self::Medium => "M",
            Self::Large => "L",
        }
    }

    /// ASCII art bounds (columns, rows) for this size.
    pub fn ascii_bounds(self) -> (u32, u32) {
        match self {
            Self::Medium => (10, 5),
            Self::Large => (24, 14),
        }
    }
}

/// `{covers}/b/id/{id}-M.jpg`
pub fn cover_url(covers_base: &str, cover_id: u64, size: CoverSize) -> String {
    format!(
        "{}/b/id/{}-{}.jpg",
        covers_base.trim_end_matches('/'),
        cover_id,
        size.suffix()
    )
}

/// Canonical catalog page for a record key such as `/works/OL45804W`.
pub fn record_url(catalog_base: &str, key: &str) -> String {
    let base = catalog_base.trim_end_matches('/');
    if key.starts_with('/') {
        format!("{base}{key}")
    } else {
        format!("{base}/{key}")
    }
}

/// Download and decode a cover image.
pub fn fetch_cover(url: &str, timeout: Option<Duration>) -> Result<DynamicImage> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("image/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let client = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("init cover client")?;

    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("cover request returned HTTP {}", status.as_u16()));
    }
    let bytes = resp.bytes().context("read cover body")?;
    image::load_from_memory(&bytes).context("decode cover")
}

/// Render an image as luminance ASCII art fitting `max_w` x `max_h` cells.
///
/// Terminal cells are about twice as tall as wide, so rows are halved.
pub fn image_to_ascii(img: &DynamicImage, max_w: u32, max_h: u32) -> Vec<String> {
    const PALETTE: &[u8] = b" .:-=+*#%@";
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || max_w == 0 || max_h == 0 {
        return Vec::new();
    }

    let mut target_w = max_w.min(w);
    let mut target_h = (h as u64 * target_w as u64 / (2 * w as u64)).max(1) as u32;
    if target_h > max_h {
        target_h = max_h;
        target_w = ((w as u64 * 2 * target_h as u64) / h as u64).clamp(1, max_w as u64) as u32;
    }

    let gray = img
        .resize_exact(target_w, target_h, FilterType::Triangle)
        .to_luma8();
    (0..gray.height())
        .map(|y| {
            (0..gray.width())
                .map(|x| {
                    let v = gray.get_pixel(x, y)[0] as f32 / 255.0;
                    let idx = (v * (PALETTE.len() as f32 - 1.0)).round() as usize;
                    *PALETTE.get(idx).unwrap_or(&b' ') as char
                })
                .collect()
        })
        .collect()
}
