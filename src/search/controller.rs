//! Runs the fetches that [`update`] asks for.
//!
//! The front ends either block on [`SearchController::search`] (line mode) or
//! hand the ticket to a worker thread via [`SearchController::spawn`] and feed
//! the completion back through their own channel (TUI).

use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use super::state::{Action, Effect, FetchCompletion, FetchTicket, Phase, Trigger, UiState, update};
use crate::catalog::CatalogClient;

#[derive(Clone)]
pub struct SearchController {
    client: CatalogClient,
}

impl SearchController {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    /// Submit and wait for the result on the calling thread.
    pub fn search(&self, state: &mut UiState, trigger: Trigger) -> Phase {
        if let Some(Effect::Fetch(ticket)) = update(state, Action::Submit(trigger)) {
            let completion = self.execute(&ticket);
            update(state, Action::FetchFinished(completion));
        }
        state.phase()
    }

    pub fn execute(&self, ticket: &FetchTicket) -> FetchCompletion {
        let started = Instant::now();
        let outcome = self.client.fetch(&ticket.query);
        match &outcome {
            Ok(books) => info!(
                target: "search",
                "搜索 #{} 完成: {} 条结果, 耗时 {} ms",
                ticket.generation,
                books.len(),
                started.elapsed().as_millis()
            ),
            Err(err) => warn!(target: "search", "搜索 #{} 失败: {err}", ticket.generation),
        }
        FetchCompletion {
            generation: ticket.generation,
            outcome,
        }
    }

    /// Fetch on a background thread and pass the completion to `on_done`.
    pub fn spawn<F>(&self, ticket: FetchTicket, on_done: F)
    where
        F: FnOnce(FetchCompletion) + Send + 'static,
    {
        let controller = self.clone();
        thread::spawn(move || on_done(controller.execute(&ticket)));
    }
}
