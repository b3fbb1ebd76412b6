//! String key-value persistence that survives restarts.

use serde::de::{DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode store file {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// No TTL is enforced here; callers compute staleness from stored timestamps.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A single JSON object file holding every entry. Rewritten on each change by
/// replacing the file, so a reader never sees a half-written store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store. A missing file is an empty store. A damaged file keeps
    /// every readable string entry and drops the rest.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => salvage_entries(&path, &contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StoreError::Encode {
                path: self.path.clone(),
                source,
            })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

fn salvage_entries(path: &Path, contents: &str) -> BTreeMap<String, String> {
    let mut raw = BTreeMap::new();
    let mut de = serde_json::Deserializer::from_str(contents);

    if let Err(err) = EntryCollector(&mut raw)
        .deserialize(&mut de)
        .and_then(|()| de.end())
    {
        warn!(
            path = %path.display(),
            error = %err,
            kept = raw.len(),
            "store file is damaged; keeping readable entries"
        );
    }

    raw.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key, value)),
            other => {
                warn!(key = %key, value = %other, "dropping non-string store entry");
                None
            }
        })
        .collect()
}

/// Collects object entries into the borrowed map as they parse, so entries
/// before a syntax error survive it.
struct EntryCollector<'a>(&'a mut BTreeMap<String, Value>);

impl<'de> DeserializeSeed<'de> for EntryCollector<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for EntryCollector<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of stored entries")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<(), M::Error> {
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            self.0.insert(key, value);
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        store.set("weatherUnits", "imperial".into()).unwrap();
        assert_eq!(store.get("weatherUnits").as_deref(), Some("imperial"));

        store.remove("weatherUnits").unwrap();
        assert_eq!(store.get("weatherUnits"), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("darkMode", "true".into()).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("darkMode").as_deref(), Some("true"));
    }

    #[test]
    fn file_store_treats_corrupt_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("anything"), None);

        store.set("weatherUnits", "metric".into()).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("weatherUnits").as_deref(), Some("metric"));
    }

    #[test]
    fn file_store_keeps_string_entries_next_to_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let contents = serde_json::json!({
            "openweathermap_api_key": "0123456789abcdef",
            "darkMode": true,
            "weatherUnits": "imperial"
        });
        fs::write(&path, contents.to_string()).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get("openweathermap_api_key").as_deref(),
            Some("0123456789abcdef")
        );
        assert_eq!(store.get("weatherUnits").as_deref(), Some("imperial"));
        assert_eq!(store.get("darkMode"), None);

        store.set("darkMode", "true".into()).unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("openweathermap_api_key").as_deref(),
            Some("0123456789abcdef")
        );
        assert_eq!(reopened.get("darkMode").as_deref(), Some("true"));
    }

    #[test]
    fn file_store_recovers_entries_before_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(
            &path,
            r#"{"openweathermap_api_key":"0123456789abcdef","weatherUnits":"imper"#,
        )
        .unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get("openweathermap_api_key").as_deref(),
            Some("0123456789abcdef")
        );
        assert_eq!(store.get("weatherUnits"), None);
    }

    #[test]
    fn file_store_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("weatherUnits", "metric".into()).unwrap();
        store.set("darkMode", "false".into()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("storage.json")]);

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn file_store_remove_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.remove("lastWeatherSearch").unwrap();
        assert!(!path.exists());
    }
}
