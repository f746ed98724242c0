pub mod controller;
pub mod state;

pub use controller::SearchController;
pub use state::{
    Action, Effect, FetchCompletion, FetchTicket, Phase, SearchError, StalePolicy, Trigger,
    UiState, update,
};
