//! Front-end independent view models for cards and the detail overlay.
//!
//! Every block is optional: a field that is absent in the record produces no
//! line at all.

use crate::catalog::covers::{CoverSize, cover_url, record_url};
use crate::catalog::{BookDetail, BookSummary};
use crate::search::{Phase, UiState};

pub const APP_TITLE: &str = "Book Finder";
pub const TAGLINE: &str = "Discover your next great read from millions of books";
pub const IDLE_HINT: &str = "Start searching to discover amazing books!";
pub const IDLE_EXAMPLES: &str =
    "Try searching for \"Harry Potter\", \"Stephen King\", or \"Science Fiction\"";
pub const DETAIL_TITLE: &str = "Book Details";
pub const LINK_LABEL: &str = "View on Open Library →";

const CARD_TITLE_LINES: usize = 2;
const CARD_AUTHORS: usize = 2;
const DETAIL_LANGUAGES: usize = 3;
const DETAIL_PUBLISHERS: usize = 3;
const DETAIL_SUBJECTS: usize = 10;

/// What the results area shows for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsBody {
    /// Never searched: the idle hint.
    Hint,
    Spinner,
    Cards,
    /// Empty or failed search; the error line carries the message.
    Nothing,
}

pub fn results_body(state: &UiState) -> ResultsBody {
    if !state.has_searched() {
        return ResultsBody::Hint;
    }
    match state.phase() {
        Phase::Loading => ResultsBody::Spinner,
        Phase::SuccessNonEmpty => ResultsBody::Cards,
        Phase::Idle | Phase::SuccessEmpty | Phase::Failure => ResultsBody::Nothing,
    }
}

pub fn found_banner(count: usize) -> String {
    format!("Found {count} books")
}

pub fn input_placeholder(state: &UiState) -> String {
    format!("Search by {}...", state.mode().label().to_lowercase())
}

pub fn button_label(state: &UiState) -> &'static str {
    if state.is_loading() {
        "Searching..."
    } else {
        "Search"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub cover_id: Option<u64>,
    pub cover_url: Option<String>,
    pub title_lines: Vec<String>,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
}

impl CardView {
    /// `title_width` is the column budget the title is wrapped to.
    pub fn build(book: &BookSummary, covers_base: &str, title_width: usize) -> Self {
        let authors = (!book.author_names.is_empty()).then(|| {
            book.author_names
                .iter()
                .take(CARD_AUTHORS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        });

        Self {
            cover_id: book.cover_id,
            cover_url: book
                .cover_id
                .map(|id| cover_url(covers_base, id, CoverSize::Medium)),
            title_lines: clamp_lines(book.display_title(), title_width, CARD_TITLE_LINES),
            authors,
            year: book.first_publish_year.map(|y| y.to_string()),
            rating: book.ratings_average.map(|r| format!("{} / 5", fixed_point(r, 1))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub cover_id: Option<u64>,
    pub cover_url: Option<String>,
    pub authors: Option<String>,
    pub first_published: Option<String>,
    pub pages: Option<String>,
    pub languages: Option<String>,
    pub rating: Option<String>,
    pub publishers: Option<String>,
    pub isbn: Option<String>,
    pub subjects: Vec<String>,
    pub link: Option<String>,
}

impl DetailView {
    pub fn build(book: &BookDetail, catalog_base: &str, covers_base: &str) -> Self {
        let s = &book.summary;
        Self {
            title: s.display_title().to_string(),
            cover_id: s.cover_id,
            cover_url: s
                .cover_id
                .map(|id| cover_url(covers_base, id, CoverSize::Large)),
            authors: join_non_empty(&s.author_names, usize::MAX),
            first_published: s.first_publish_year.map(|y| y.to_string()),
            pages: book.page_count.map(|p| p.to_string()),
            languages: join_non_empty(&book.languages, DETAIL_LANGUAGES)
                .map(|l| l.to_uppercase()),
            rating: s.ratings_average.map(|r| format!("{} / 5", fixed_point(r, 2))),
            publishers: join_non_empty(&book.publishers, DETAIL_PUBLISHERS),
            isbn: book.isbns.first().cloned(),
            subjects: book
                .subjects
                .iter()
                .take(DETAIL_SUBJECTS)
                .cloned()
                .collect(),
            link: book.key().map(|key| record_url(catalog_base, key)),
        }
    }

    /// Labelled facts in display order, skipping absent ones.
    pub fn facts(&self) -> Vec<(&'static str, &str)> {
        [
            ("Author(s)", &self.authors),
            ("First Published", &self.first_published),
            ("Pages", &self.pages),
            ("Languages", &self.languages),
            ("Rating", &self.rating),
            ("Publishers", &self.publishers),
            ("ISBN", &self.isbn),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

/// Fixed-point formatting where an exact half rounds away from zero.
///
/// `format!` rounds exact binary ties to even (4.125 -> "4.12"); ratings are
/// shown the conventional way (4.125 -> "4.13").
fn fixed_point(value: f64, digits: usize) -> String {
    let exact = format!("{value:.64}");
    let tail = exact
        .find('.')
        .and_then(|dot| exact.get(dot + 1 + digits..))
        .unwrap_or("");
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{value:.digits$}");
    }
    let scale = 10f64.powi(digits as i32);
    format!("{:.digits$}", (value * scale).round() / scale)
}

fn join_non_empty(items: &[String], limit: usize) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Wrap `text` to `width` columns and keep at most `max_lines`, marking the cut with `…`.
pub fn clamp_lines(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if text.is_empty() || max_lines == 0 {
        return Vec::new();
    }
    let width = width.max(2);
    let mut lines: Vec<String> = textwrap::wrap(text, width)
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let keep = width.saturating_sub(1);
        let mut cut: String = last.chars().take(keep).collect();
        cut.truncate(cut.trim_end().len());
        cut.push('…');
        *last = cut;
    }
    lines
}
