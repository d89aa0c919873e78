use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use super::error::Result;

/// Encode a preference key: pref:{key}
pub fn encode_pref_key(key: &str) -> Vec<u8> {
    format!("pref:{}", key).into_bytes()
}

/// Fjall-backed string preferences that survive process restarts
#[derive(Clone)]
pub struct Preferences {
    keyspace: Keyspace,
    preferences: PartitionHandle,
}

impl Preferences {
    /// Open or create the preference store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening preferences at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let preferences =
            keyspace.open_partition("preferences", PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            preferences,
        })
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.preferences.get(encode_pref_key(key))? {
            Some(value) => Ok(Some(String::from_utf8_lossy(&value).to_string())),
            None => Ok(None),
        }
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.preferences.insert(encode_pref_key(key), value.as_bytes())?;
        debug!(key, size = value.len(), "Preference stored");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.preferences.remove(encode_pref_key(key))?;
        debug!(key, "Preference removed");
        Ok(())
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}
