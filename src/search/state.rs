//! Search UI state and its single update function.
//!
//! All mutation goes through [`update`]: front ends translate user input and
//! worker completions into [`Action`]s and perform the returned [`Effect`].
//!
//! Lifecycle: `Idle -> Loading -> {SuccessNonEmpty, SuccessEmpty, Failure}`;
//! any state may re-enter `Loading`. The detail overlay is visible only when a
//! book is selected and the state is not `Loading`.

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{BookDetail, FetchError, Query, SearchMode};

/// User-facing errors. The display text is what the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a search term")]
    EmptyQuery,
    #[error("No books found. Try a different search term.")]
    EmptyResultSet,
    #[error("Something went wrong. Please check your connection and try again.")]
    RequestFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    SuccessNonEmpty,
    SuccessEmpty,
    Failure,
}

/// How a search was started. The button is disabled while loading, the
/// input commit (Enter) is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Button,
    Commit,
}

/// What to do with a completion that belongs to a superseded search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    #[default]
    Discard,
    /// Whatever arrives last overwrites the results.
    LastWriterWins,
}

impl StalePolicy {
    pub fn from_discard_flag(discard: bool) -> Self {
        if discard {
            Self::Discard
        } else {
            Self::LastWriterWins
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCompletion {
    pub generation: u64,
    pub outcome: Result<Vec<BookDetail>, FetchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    EditQuery(String),
    SetMode(SearchMode),
    Submit(Trigger),
    FetchFinished(FetchCompletion),
    /// Card activation, by index into the current results.
    Select(usize),
    CloseDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchTicket),
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    query: String,
    mode: SearchMode,
    results: Vec<BookDetail>,
    phase: Phase,
    error: Option<SearchError>,
    has_searched: bool,
    selected: Option<usize>,
    generation: u64,
    policy: StalePolicy,
}

impl UiState {
    pub fn new(mode: SearchMode, policy: StalePolicy) -> Self {
        Self {
            mode,
            policy,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn results(&self) -> &[BookDetail] {
        &self.results
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<SearchError> {
        self.error
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_book(&self) -> Option<&BookDetail> {
        self.selected.and_then(|idx| self.results.get(idx))
    }

    /// The overlay is layered over every state except `Loading`.
    pub fn overlay_book(&self) -> Option<&BookDetail> {
        if self.is_loading() {
            None
        } else {
            self.selected_book()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the search button accepts activation.
    pub fn can_submit(&self) -> bool {
        !self.is_loading()
    }

    fn submit(&mut self, trigger: Trigger) -> Option<Effect> {
        if self.is_loading() && trigger == Trigger::Button {
            debug!(target: "search", "搜索按钮在加载中被禁用，忽略");
            return None;
        }

        let Some(query) = Query::new(&self.query, self.mode) else {
            // an error banner during Loading would break loading/error exclusivity
            if !self.is_loading() {
                self.error = Some(SearchError::EmptyQuery);
            }
            return None;
        };

        self.phase = Phase::Loading;
        self.error = None;
        self.has_searched = true;
        self.generation += 1;
        info!(
            target: "search",
            "开始搜索 #{}: {}={:?}",
            self.generation,
            query.mode(),
            query.text()
        );
        Some(Effect::Fetch(FetchTicket {
            generation: self.generation,
            query,
        }))
    }

    fn finish(&mut self, completion: FetchCompletion) {
        if completion.generation != self.generation && self.policy == StalePolicy::Discard {
            debug!(
                target: "search",
                "丢弃过期响应 #{} (当前 #{})",
                completion.generation,
                self.generation
            );
            return;
        }

        let selected_key = self
            .selected_book()
            .and_then(|b| b.key().map(str::to_string));

        match completion.outcome {
            Ok(results) => {
                if results.is_empty() {
                    self.phase = Phase::SuccessEmpty;
                    self.error = Some(SearchError::EmptyResultSet);
                } else {
                    self.phase = Phase::SuccessNonEmpty;
                    self.error = None;
                }
                self.results = results;
            }
            Err(err) => {
                debug!(target: "search", "搜索失败 #{}: {err}", completion.generation);
                self.phase = Phase::Failure;
                self.error = Some(SearchError::RequestFailed);
                self.results.clear();
            }
        }

        // keep the selection only if the same record came back
        self.selected = selected_key.and_then(|key| {
            self.results
                .iter()
                .position(|b| b.key() == Some(key.as_str()))
        });
    }
}

/// Apply one action. Returns the side effect the caller must perform, if any.
pub fn update(state: &mut UiState, action: Action) -> Option<Effect> {
    match action {
        Action::EditQuery(text) => {
            state.query = text;
            None
        }
        Action::SetMode(mode) => {
            state.mode = mode;
            None
        }
        Action::Submit(trigger) => state.submit(trigger),
        Action::FetchFinished(completion) => {
            state.finish(completion);
            None
        }
        Action::Select(idx) => {
            if !state.is_loading() && idx < state.results.len() {
                state.selected = Some(idx);
            }
            None
        }
        Action::CloseDetail => {
            state.selected = None;
            None
        }
    }
}
