//! Locally persisted favorites
//!
//! Favorites live as a JSON array under [`FAVORITES_KEY`] in a
//! [`KeyValueStore`]. Reads are self-healing: a value that is not a JSON
//! array is reset to `[]`, and entries without a usable `ticker` are
//! dropped and the cleaned array written back.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Storage key of the favorites array
pub const FAVORITES_KEY: &str = "favorites";

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by one JSON object file (`{"key": "value", ...}`).
/// A file holding anything else reads as empty and is replaced on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(
                    "{} is not a JSON object, starting from an empty store",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .read_all()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_all()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        debug!("Wrote key '{key}' to {}", self.path.display());
        Ok(())
    }
}

/// One favorite stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Favorite {
    fn from_entry(entry: &Value) -> Option<Self> {
        let ticker = entry
            .get("ticker")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())?;
        Some(Self {
            ticker: ticker.to_string(),
            logo: entry.get("logo").and_then(Value::as_str).map(str::to_string),
        })
    }
}

/// Favorites list on top of a [`KeyValueStore`]
#[derive(Clone)]
pub struct FavoritesRepository {
    store: Arc<dyn KeyValueStore>,
}

impl FavoritesRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the list, repairing storage if needed
    pub fn load(&self) -> Result<Vec<Favorite>> {
        let Some(raw) = self.store.get(FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            _ => {
                warn!("Stored favorites are not a JSON array, resetting");
                self.store.set(FAVORITES_KEY, "[]")?;
                return Ok(Vec::new());
            }
        };

        let total = entries.len();
        let valid: Vec<Value> = entries
            .into_iter()
            .filter(|entry| Favorite::from_entry(entry).is_some())
            .collect();

        if valid.len() != total {
            warn!(
                "Dropped {} malformed favorite entries",
                total - valid.len()
            );
            self.store
                .set(FAVORITES_KEY, &serde_json::to_string(&valid)?)?;
        }

        Ok(valid.iter().filter_map(Favorite::from_entry).collect())
    }

    pub fn contains(&self, ticker: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|f| f.ticker == ticker))
    }

    /// Add or remove `ticker`; returns whether it is a favorite afterwards
    pub fn toggle(&self, ticker: &str, logo: Option<&str>) -> Result<bool> {
        if self.contains(ticker)? {
            self.remove(ticker)?;
            Ok(false)
        } else {
            self.add(ticker, logo)?;
            Ok(true)
        }
    }

    /// Append `ticker` unless it is already present
    pub fn add(&self, ticker: &str, logo: Option<&str>) -> Result<()> {
        let mut favorites = self.load()?;
        if favorites.iter().any(|f| f.ticker == ticker) {
            return Ok(());
        }
        favorites.push(Favorite {
            ticker: ticker.to_string(),
            logo: logo.map(str::to_string),
        });
        info!("Added {ticker} to favorites");
        self.save(&favorites)
    }

    /// Remove `ticker`; returns whether it was present
    pub fn remove(&self, ticker: &str) -> Result<bool> {
        let mut favorites = self.load()?;
        let before = favorites.len();
        favorites.retain(|f| f.ticker != ticker);
        if favorites.len() == before {
            return Ok(false);
        }
        info!("Removed {ticker} from favorites");
        self.save(&favorites)?;
        Ok(true)
    }

    fn save(&self, favorites: &[Favorite]) -> Result<()> {
        self.store
            .set(FAVORITES_KEY, &serde_json::to_string(favorites)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn repository(raw: &str) -> (Arc<MemoryStore>, FavoritesRepository) {
        let store = Arc::new(MemoryStore::with_entry(FAVORITES_KEY, raw));
        let repo = FavoritesRepository::new(store.clone());
        (store, repo)
    }

    fn stored(store: &MemoryStore) -> Option<String> {
        store.get(FAVORITES_KEY).unwrap()
    }

    #[test]
    fn test_malformed_entries_are_dropped_and_rewritten() {
        let (store, repo) = repository(r#"["AAPL", {"ticker":"MSFT"}, 42, {"bad":1}]"#);

        let favorites = repo.load().unwrap();
        assert_eq!(
            favorites,
            vec![Favorite {
                ticker: "MSFT".to_string(),
                logo: None
            }]
        );
        assert_eq!(stored(&store).as_deref(), Some(r#"[{"ticker":"MSFT"}]"#));
    }

    #[test]
    fn test_valid_list_is_not_rewritten() {
        let raw = r#"[ {"ticker": "NVDA", "logo": "https://img/nvda.png"} ]"#;
        let (store, repo) = repository(raw);

        let favorites = repo.load().unwrap();
        assert_eq!(favorites[0].logo.as_deref(), Some("https://img/nvda.png"));
        assert_eq!(stored(&store).as_deref(), Some(raw));
    }

    #[test]
    fn test_invalid_json_resets_storage() {
        for raw in ["{not json", r#"{"ticker":"AAPL"}"#, "null"] {
            let (store, repo) = repository(raw);
            assert!(repo.load().unwrap().is_empty());
            assert_eq!(stored(&store).as_deref(), Some("[]"));
        }
    }

    #[test]
    fn test_missing_key_is_empty() {
        let store = Arc::new(MemoryStore::default());
        let repo = FavoritesRepository::new(store.clone());
        assert!(repo.load().unwrap().is_empty());
        assert_eq!(stored(&store), None);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let (_store, repo) = repository("[]");

        assert!(repo.toggle("AMD", Some("https://img/amd.png")).unwrap());
        assert!(repo.contains("AMD").unwrap());
        assert!(!repo.contains("amd").unwrap());

        assert!(!repo.toggle("AMD", None).unwrap());
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_appends_and_ignores_duplicates() {
        let (store, repo) = repository(r#"[{"ticker":"MSFT"}]"#);
        repo.add("AAPL", Some("logo.png")).unwrap();
        repo.add("AAPL", None).unwrap();

        assert_eq!(
            stored(&store).as_deref(),
            Some(r#"[{"ticker":"MSFT"},{"ticker":"AAPL","logo":"logo.png"}]"#)
        );
        assert!(!repo.remove("TSLA").unwrap());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let repo = FavoritesRepository::new(Arc::new(FileStore::new(&path)));
        repo.add("GOOG", None).unwrap();

        let reopened = FavoritesRepository::new(Arc::new(FileStore::new(&path)));
        assert!(reopened.contains("GOOG").unwrap());
    }

    #[test]
    fn test_file_store_recovers_from_non_object_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "[1, 2]").unwrap();

        let store = Arc::new(FileStore::new(&path));
        assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);

        let repo = FavoritesRepository::new(store);
        repo.add("NVDA", None).unwrap();

        let rewritten: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten[FAVORITES_KEY], json!(r#"[{"ticker":"NVDA"}]"#));
        assert!(repo.contains("NVDA").unwrap());
    }
}
