use crate::error::StorageError;
use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// String key/value persistence with browser local-storage semantics.
pub trait KeyValueStore
{
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores every item in one JSON object on disk, rewritten on each write.
pub struct FileStore
{
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStore
{
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError>
    {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };
        debug!(path = %path.display(), items = items.len(), "opened storage");
        Ok(Self { path, items })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    fn save(&self) -> Result<(), StorageError>
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let text = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, text).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore
{
    fn get_item(&self, key: &str) -> Option<String>
    {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>
    {
        self.items.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore
{
    items: HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore
{
    fn get_item(&self, key: &str) -> Option<String>
    {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>
    {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// An integer bound to one storage key. Read once on creation, written on
/// every change as a JSON number.
pub struct PersistentScore<S: KeyValueStore>
{
    store: S,
    key: String,
    value: u32,
}

impl<S: KeyValueStore> PersistentScore<S>
{
    pub fn load(store: S, key: &str, initial: u32) -> Self
    {
        let value = match store.get_item(key) {
            Some(raw) => match serde_json::from_str::<u32>(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key, raw = %raw, error = %err, "ignoring unreadable stored score");
                    initial
                }
            },
            None => initial,
        };
        Self {
            store,
            key: key.to_string(),
            value,
        }
    }

    pub fn get(&self) -> u32
    {
        self.value
    }

    pub fn set(&mut self, value: u32) -> Result<(), StorageError>
    {
        self.value = value;
        let encoded = serde_json::to_string(&value)?;
        self.store.set_item(&self.key, &encoded)
    }

    #[cfg(test)]
    pub fn store(&self) -> &S
    {
        &self.store
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn missing_key_uses_initial_value()
    {
        let score = PersistentScore::load(MemoryStore::default(), "hi", 7);
        assert_eq!(score.get(), 7);
    }

    #[test]
    fn set_writes_json_number()
    {
        let mut score = PersistentScore::load(MemoryStore::default(), "hi", 0);
        score.set(420).unwrap();
        assert_eq!(score.store().get_item("hi").as_deref(), Some("420"));
    }

    #[test]
    fn garbage_value_falls_back_to_initial()
    {
        let mut store = MemoryStore::default();
        store.set_item("hi", "not a number").unwrap();
        let score = PersistentScore::load(store, "hi", 3);
        assert_eq!(score.get(), 3);
    }

    #[test]
    fn file_store_survives_reopen()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        assert!(store.get_item("whac-a-mole-hi").is_none());
        store.set_item("whac-a-mole-hi", "1250").unwrap();
        store.set_item("other", "\"x\"").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("whac-a-mole-hi").as_deref(), Some("1250"));
        assert_eq!(reopened.get_item("other").as_deref(), Some("\"x\""));

        let score = PersistentScore::load(reopened, "whac-a-mole-hi", 0);
        assert_eq!(score.get(), 1250);
    }

    #[test]
    fn corrupt_file_is_reported()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2").unwrap();
        let err = FileStore::open(&path).err().unwrap();
        assert!(matches!(err, StorageError::Parse { .. }));
    }

    #[test]
    fn empty_file_is_an_empty_store()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "\n").unwrap();
        let store = FileStore::open(&path).unwrap();
        assert!(store.get_item("anything").is_none());
        assert_eq!(store.path(), path.as_path());
    }
}
