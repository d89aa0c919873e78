//! Result store and persistent preferences
//!
//! The last successful search results are kept in memory for display and
//! mirrored to an embedded Fjall keyspace as a JSON string, so they can be
//! shown again after a restart.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use searchengine::store::{Preferences, ResultStore};
//!
//! let store = ResultStore::open(Preferences::open("data/preferences")?)?;
//! let seq = store.begin_search();
//! store.complete(seq, results)?;
//! ```

pub mod error;
pub mod preferences;
pub mod results;

pub use error::{Result, StoreError};
pub use preferences::Preferences;
pub use results::{ResultStore, SEARCH_RESULTS_KEY};
