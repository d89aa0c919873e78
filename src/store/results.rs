use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::error::Result;
use super::preferences::Preferences;

/// Preference key holding the last search results as a JSON array string
pub const SEARCH_RESULTS_KEY: &str = "search-results";

/// Latest search results, mirrored to [`Preferences`].
///
/// Contents are only ever replaced wholesale. Searches take a sequence number
/// from [`begin_search`](Self::begin_search); a completion is applied only if
/// no newer search has been issued since.
pub struct ResultStore {
    results: Mutex<Vec<Value>>,
    preferences: Preferences,
    latest_issued: AtomicU64,
}

impl ResultStore {
    /// Empty store; call [`load_from_disk`](Self::load_from_disk) to restore.
    pub fn new(preferences: Preferences) -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            preferences,
            latest_issued: AtomicU64::new(0),
        }
    }

    /// Store restored from the last persisted results
    pub fn open(preferences: Preferences) -> Result<Self> {
        let store = Self::new(preferences);
        store.load_from_disk()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Overwrite the contents and persist them.
    ///
    /// The in-memory contents only change once the write succeeded.
    pub fn replace(&self, results: Vec<Value>) -> Result<()> {
        let mut current = self.lock();
        self.write(&results)?;
        *current = results;
        Ok(())
    }

    fn write(&self, results: &[Value]) -> Result<()> {
        let encoded = serde_json::to_string(results)?;
        self.preferences.set_string(SEARCH_RESULTS_KEY, &encoded)?;
        debug!(count = results.len(), "Search results persisted");
        Ok(())
    }

    /// Reload the contents from disk. Returns the number of results.
    ///
    /// A missing entry reads as `[]`; a corrupt one is logged and read as empty.
    pub fn load_from_disk(&self) -> Result<usize> {
        let stored = self
            .preferences
            .get_string(SEARCH_RESULTS_KEY)?
            .unwrap_or_else(|| "[]".to_string());

        let results = match serde_json::from_str::<Value>(&stored) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                warn!(kind = json_kind(&other), "Stored search results are not an array, ignoring");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Stored search results are corrupt, ignoring");
                Vec::new()
            }
        };

        let count = results.len();
        *self.lock() = results;
        info!(count, "Search results loaded from disk");
        Ok(count)
    }

    pub fn results(&self) -> Vec<Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Issue a sequence number for a new search
    pub fn begin_search(&self) -> u64 {
        self.latest_issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_issued(&self) -> u64 {
        self.latest_issued.load(Ordering::SeqCst)
    }

    /// Apply the results of search `seq` unless a newer search was issued.
    ///
    /// Returns `false` when the results were stale and discarded.
    pub fn complete(&self, seq: u64, results: Vec<Value>) -> Result<bool> {
        let mut current = self.lock();

        let latest = self.latest_issued();
        if seq != latest {
            debug!(seq, latest, "Discarding stale search results");
            return Ok(false);
        }

        self.write(&results)?;
        *current = results;
        Ok(true)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
