//! Debounced search
//!
//! Turns text-box edits into at most one search per pause in typing, runs it
//! through the executor and response interpreter, and hands successful
//! results to the [`ResultStore`](crate::store::ResultStore). Results that
//! arrive after a newer search was issued are dropped.

mod controller;

pub use controller::{SearchController, SearchSettings, search_results};

use crate::client::TransportError;
use crate::response::ErrorDocument;

/// Outcome of one issued search, broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Results stored and visible
    Completed { seq: u64, query: String, count: usize },

    /// A newer search was issued before this one answered
    Stale { seq: u64, query: String },

    /// Nothing was stored
    Failed {
        seq: u64,
        query: String,
        reason: SearchFailure,
    },
}

impl SearchEvent {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Completed { seq, .. } | Self::Stale { seq, .. } | Self::Failed { seq, .. } => {
                *seq
            }
        }
    }

    pub fn query(&self) -> &str {
        match self {
            Self::Completed { query, .. }
            | Self::Stale { query, .. }
            | Self::Failed { query, .. } => query,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchFailure {
    Transport(TransportError),
    Server(ErrorDocument),
    Store(String),
}

impl std::fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(error) => write!(f, "{}", error),
            Self::Server(error) => write!(f, "{} (code {})", error.message_friendly, error.code),
            Self::Store(message) => write!(f, "storage error: {}", message),
        }
    }
}
