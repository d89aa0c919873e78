use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SearchEvent, SearchFailure};
use crate::client::{Executor, RequestContext};
use crate::endpoint::{Operation, SearchType};
use crate::observability::Metrics;
use crate::response::{ErrorDocument, ResponseInterpreter};
use crate::store::ResultStore;

const EVENT_CAPACITY: usize = 32;

/// Search timing and target
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub search_type: SearchType,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            search_type: SearchType::AlbumTitle,
        }
    }
}

#[derive(Default)]
struct SearchSession {
    /// Bumped on every keystroke; a timer only fires if it still matches
    generation: u64,
    pending: Option<JoinHandle<()>>,
    /// Fired searches that have not finished yet
    running: usize,
    last_issued_query: Option<String>,
}

struct SearchPipeline {
    executor: Arc<dyn Executor>,
    context: Arc<RequestContext>,
    interpreter: Arc<ResponseInterpreter>,
    store: Arc<ResultStore>,
    metrics: Arc<Metrics>,
    settings: SearchSettings,
    events: broadcast::Sender<SearchEvent>,
}

/// Collapses bursts of keystrokes into one search per pause in typing.
///
/// [`on_text_changed`](Self::on_text_changed) spawns its timer on the current
/// Tokio runtime and must be called from within one.
pub struct SearchController {
    pipeline: Arc<SearchPipeline>,
    session: Arc<Mutex<SearchSession>>,
}

impl SearchController {
    pub fn new(
        executor: Arc<dyn Executor>,
        context: Arc<RequestContext>,
        interpreter: Arc<ResponseInterpreter>,
        store: Arc<ResultStore>,
        metrics: Arc<Metrics>,
        settings: SearchSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pipeline: Arc::new(SearchPipeline {
                executor,
                context,
                interpreter,
                store,
                metrics,
                settings,
                events,
            }),
            session: Arc::new(Mutex::new(SearchSession::default())),
        }
    }

    /// Receive a [`SearchEvent`] for every search that finishes
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.pipeline.events.subscribe()
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.pipeline.store
    }

    /// Latest results, for display
    pub fn results(&self) -> Vec<Value> {
        self.pipeline.store.results()
    }

    pub fn settings(&self) -> SearchSettings {
        self.pipeline.settings
    }

    /// Query of the most recent search whose timer fired
    pub fn last_issued_query(&self) -> Option<String> {
        lock_session(&self.session).last_issued_query.clone()
    }

    /// Whether a scheduled search is still waiting for its timer
    pub fn has_pending(&self) -> bool {
        lock_session(&self.session)
            .pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// No search is scheduled or still running
    pub fn is_idle(&self) -> bool {
        let session = lock_session(&self.session);
        session.running == 0
            && session
                .pending
                .as_ref()
                .is_none_or(|handle| handle.is_finished())
    }

    /// Feed the current text of the search box.
    ///
    /// Cancels any search still waiting for its timer. Non-empty text
    /// schedules a new one after the debounce delay. Searches already sent
    /// are not cancelled; their results are discarded if they arrive late.
    pub fn on_text_changed(&self, text: &str) {
        let mut session = lock_session(&self.session);
        session.generation += 1;

        if let Some(pending) = session.pending.take() {
            pending.abort();
            debug!("Cancelled pending search");
        }

        if text.is_empty() {
            return;
        }

        let generation = session.generation;
        let query = text.to_string();
        let pipeline = Arc::clone(&self.pipeline);
        let session_ref = Arc::clone(&self.session);

        session.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(pipeline.settings.debounce).await;

            let _running = {
                let mut session = lock_session(&session_ref);
                if session.generation != generation {
                    return;
                }
                // fired: later keystrokes no longer abort this task
                session.pending = None;
                session.running += 1;
                session.last_issued_query = Some(query.clone());
                RunningSearch {
                    session: Arc::clone(&session_ref),
                }
            };

            pipeline.run(&query).await;
        }));
    }

    /// Run one search immediately, bypassing the debounce timer
    pub async fn run_search(&self, query: &str) -> SearchEvent {
        lock_session(&self.session).last_issued_query = Some(query.to_string());
        self.pipeline.run(query).await
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(pending) = lock_session(&self.session).pending.take() {
            pending.abort();
        }
    }
}

/// Counts a fired search as running until dropped, including on panic
struct RunningSearch {
    session: Arc<Mutex<SearchSession>>,
}

impl Drop for RunningSearch {
    fn drop(&mut self) {
        let mut session = lock_session(&self.session);
        session.running = session.running.saturating_sub(1);
    }
}

impl SearchPipeline {
    async fn run(&self, query: &str) -> SearchEvent {
        let seq = self.store.begin_search();
        self.metrics.search_issued();
        info!(seq, query, "Searching");

        let descriptor = self.context.describe(&Operation::Search {
            search_type: self.settings.search_type,
            word: query.to_string(),
        });

        let event = match self.executor.execute(&descriptor).await {
            Err(error) => {
                warn!(seq, query, error = %error, "Search request failed");
                SearchEvent::Failed {
                    seq,
                    query: query.to_string(),
                    reason: SearchFailure::Transport(error),
                }
            }
            Ok(raw) => {
                let document = self.interpreter.interpret(&raw, true);
                match ErrorDocument::from_document(&document) {
                    Some(error) => SearchEvent::Failed {
                        seq,
                        query: query.to_string(),
                        reason: SearchFailure::Server(error),
                    },
                    None => self.apply(seq, query, search_results(&document)),
                }
            }
        };

        // no subscribers is fine
        let _ = self.events.send(event.clone());
        event
    }

    fn apply(&self, seq: u64, query: &str, results: Vec<Value>) -> SearchEvent {
        let count = results.len();
        match self.store.complete(seq, results) {
            Ok(true) => {
                info!(seq, query, count, "Search completed");
                SearchEvent::Completed {
                    seq,
                    query: query.to_string(),
                    count,
                }
            }
            Ok(false) => {
                self.metrics.stale_result_discarded();
                debug!(seq, query, "Search superseded by a newer one");
                SearchEvent::Stale {
                    seq,
                    query: query.to_string(),
                }
            }
            Err(error) => {
                warn!(seq, query, error = %error, "Failed to store search results");
                SearchEvent::Failed {
                    seq,
                    query: query.to_string(),
                    reason: SearchFailure::Store(error.to_string()),
                }
            }
        }
    }
}

/// `data.search_results`, or nothing
pub fn search_results(document: &Value) -> Vec<Value> {
    document
        .pointer("/data/search_results")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn lock_session(session: &Mutex<SearchSession>) -> MutexGuard<'_, SearchSession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
