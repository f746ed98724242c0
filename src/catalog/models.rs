//! Catalog record types and their defensive decoding from `search.json` docs.

use std::fmt;

use serde_json::Value;

use crate::base_system::json_extract::{
    JsonMap, pick_f64, pick_i64, pick_positive, pick_string, pick_string_list,
};

/// Which catalog field a query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Title,
    Author,
    Subject,
    /// Free-text search; the fallback for unrecognized mode labels.
    FreeText,
}

impl SearchMode {
    /// Modes offered in the mode selector, in display order.
    pub const SELECTABLE: [SearchMode; 3] =
        [SearchMode::Title, SearchMode::Author, SearchMode::Subject];

    /// Parse a config/CLI label. Unknown labels map to [`SearchMode::FreeText`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "author" => Self::Author,
            "subject" => Self::Subject,
            _ => Self::FreeText,
        }
    }

    /// Query parameter name understood by `search.json`.
    pub fn param(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Subject => "subject",
            Self::FreeText => "q",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Subject => "Subject",
            Self::FreeText => "Anything",
        }
    }

    /// Next selectable mode, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Title => Self::Author,
            Self::Author => Self::Subject,
            Self::Subject | Self::FreeText => Self::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Title | Self::FreeText => Self::Subject,
            Self::Author => Self::Title,
            Self::Subject => Self::Author,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

/// A validated search request. Only constructible with non-blank text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    mode: SearchMode,
}

impl Query {
    /// Returns `None` when `text` is empty after trimming.
    pub fn new(text: &str, mode: SearchMode) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            mode,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

/// Fields shown on a result card. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSummary {
    /// Catalog path such as `/works/OL82563W`.
    pub key: Option<String>,
    pub title: Option<String>,
    pub author_names: Vec<String>,
    pub first_publish_year: Option<i64>,
    pub ratings_average: Option<f64>,
    pub cover_id: Option<u64>,
}

/// Full record shown in the detail overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDetail {
    pub summary: BookSummary,
    pub publishers: Vec<String>,
    pub subjects: Vec<String>,
    pub page_count: Option<u64>,
    pub isbns: Vec<String>,
    pub languages: Vec<String>,
}

impl BookSummary {
    fn from_map(map: &JsonMap) -> Self {
        Self {
            key: pick_string(map, "key"),
            title: pick_string(map, "title"),
            author_names: pick_string_list(map, "author_name"),
            // BC years come through as negatives
            first_publish_year: pick_i64(map, "first_publish_year").filter(|y| *y != 0),
            ratings_average: pick_f64(map, "ratings_average").filter(|r| *r != 0.0),
            cover_id: pick_positive(map, "cover_i"),
        }
    }

    /// Title for display; an absent title renders as empty.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

impl BookDetail {
    /// Decode one `docs[]` entry. Anything that is not an object yields an empty record.
    pub fn from_doc(doc: &Value) -> Self {
        let Some(map) = doc.as_object() else {
            return Self::default();
        };
        Self {
            summary: BookSummary::from_map(map),
            publishers: pick_string_list(map, "publisher"),
            subjects: pick_string_list(map, "subject"),
            page_count: pick_positive(map, "number_of_pages_median"),
            isbns: pick_string_list(map, "isbn"),
            languages: pick_string_list(map, "language"),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.summary.key.as_deref()
    }
}

/// Pull the `docs` array out of a search response, in source order.
///
/// A missing or non-array `docs` field is an empty result, not an error.
pub fn parse_search_response(data: &Value) -> Vec<BookDetail> {
    data.get("docs")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().map(BookDetail::from_doc).collect())
        .unwrap_or_default()
}
