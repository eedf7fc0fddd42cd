//! Storage Backend Module
//!
//! Capability interface over a durable key/value store, with an in-memory
//! implementation (optionally quota-bounded) and a directory-backed one.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{CacheError, Result};

// == Storage Backend Trait ==
/// Minimal key/value capability used by the persistent tier and the proxy.
///
/// `write` reports a full store as [`CacheError::QuotaExceeded`] so callers
/// can tell it apart from other I/O failures.
pub trait StorageBackend: Send + Sync + Debug {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn write(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn enumerate(&self) -> Result<Vec<String>>;
}

// == Memory Storage ==
/// Process-local store, used as a deterministic stand-in in tests and for
/// running without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, Vec<u8>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops everything, bypassing any namespacing.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut values = self.lock();

        if let Some(quota) = self.quota_bytes {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(CacheError::QuotaExceeded(format!(
                    "writing {} bytes would exceed quota of {} bytes",
                    key.len() + value.len(),
                    quota
                )));
            }
        }

        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

// == File Storage ==
/// One file per key inside a directory; file names are the hex-encoded key.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

const TEMP_SUFFIX: &str = ".tmp";

impl FileStorage {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened file storage");
        Ok(Self {
            dir,
            quota_bytes: None,
        })
    }

    /// Caps the total size of stored values.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(hex::encode(key.as_bytes()))
    }

    fn used_bytes_excluding(&self, skip: &Path) -> Result<u64> {
        let mut used = 0;
        for item in fs::read_dir(&self.dir)? {
            let item = item?;
            if item.path() == skip {
                continue;
            }
            used += item.metadata()?.len();
        }
        Ok(used)
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);

        if let Some(quota) = self.quota_bytes {
            let used = self.used_bytes_excluding(&path)?;
            if used + value.len() as u64 > quota {
                return Err(CacheError::QuotaExceeded(format!(
                    "{} bytes used of {} byte quota",
                    used, quota
                )));
            }
        }

        // Write-then-rename so readers never observe a half-written value
        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        fs::write(&temp, value)?;
        fs::rename(&temp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in fs::read_dir(&self.dir)? {
            let name = item?.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            let decoded = hex::decode(name)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if let Some(key) = decoded {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn StorageBackend) {
        store.write("ns:a", b"one").unwrap();
        store.write("ns:b", b"two").unwrap();
        store.write("ns:a", b"uno").unwrap();

        assert_eq!(store.read("ns:a").unwrap(), Some(b"uno".to_vec()));
        assert_eq!(store.read("ns:missing").unwrap(), None);
        assert_eq!(store.enumerate().unwrap(), vec!["ns:a", "ns:b"]);

        store.remove("ns:a").unwrap();
        store.remove("ns:a").unwrap();
        assert_eq!(store.enumerate().unwrap(), vec!["ns:b"]);
    }

    #[test]
    fn test_memory_storage_basics() {
        exercise(&MemoryStorage::new());
    }

    #[test]
    fn test_file_storage_basics() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FileStorage::open(dir.path()).unwrap());
    }

    #[test]
    fn test_memory_storage_quota() {
        let store = MemoryStorage::with_quota(10);

        store.write("k1", b"abc").unwrap(); // 5 bytes
        let result = store.write("k2", b"abcdef"); // would be 13
        assert!(matches!(result, Err(CacheError::QuotaExceeded(_))));

        // Replacing an existing key only counts the new value
        store.write("k1", b"abcdefgh").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_file_storage_quota() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path()).unwrap().with_quota(8);

        store.write("a", b"12345").unwrap();
        let result = store.write("b", b"12345");
        assert!(matches!(result, Err(CacheError::QuotaExceeded(_))));
        store.write("a", b"12345678").unwrap();
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::open(dir.path())
            .unwrap()
            .write("asset-v1:cat.gif", b"{}")
            .unwrap();

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.enumerate().unwrap(), vec!["asset-v1:cat.gif"]);
    }

    #[test]
    fn test_file_storage_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path()).unwrap();
        fs::write(dir.path().join("not-hex!"), b"x").unwrap();
        store.write("k", b"v").unwrap();

        assert_eq!(store.enumerate().unwrap(), vec!["k"]);
    }
}
