//! Open Library catalog access: record types, search requests and covers.

pub mod client;
pub mod covers;
pub mod models;

pub use client::{CatalogClient, FetchError};
pub use models::{BookDetail, BookSummary, Query, SearchMode};
