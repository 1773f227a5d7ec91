use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use super::KeyValueStore;

/// Storage file name in the cache directory
pub const STORAGE_FILE: &str = "storage.json";

/// Suffix of the advisory lock file kept next to the storage file
const LOCK_SUFFIX: &str = ".lock";

/// Key-value store backed by a single JSON object on disk.
///
/// Every read goes back to the file, so separate processes sharing the path
/// see each other's writes. Read-modify-write cycles hold an exclusive
/// advisory lock on a sibling `.lock` file, and new contents are written to a
/// temp file that is renamed over the old one, so readers never see a
/// partially written file.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(LOCK_SUFFIX);
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    /// Open the store in `dir`, creating the directory if needed.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self::new(dir.join(STORAGE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Open the lock file and take the lock. Released when the file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File> {
        std::fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file {}", self.lock_path.display()))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.context("Failed to lock storage file")?;
        Ok(file)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read storage file")?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(self.parent_dir())
            .context("Failed to create temporary storage file")?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .context("Failed to replace storage file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _lock = self.lock(false)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _lock = self.lock(true)?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key = key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _lock = self.lock(true)?;
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope.json"));
        assert_eq!(store.get("accessToken").unwrap(), None);
        store.remove("accessToken").unwrap();
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path()).unwrap();

        store.set("accessToken", "abc").unwrap();
        store.set("refreshToken", "def").unwrap();
        assert_eq!(store.get("accessToken").unwrap().as_deref(), Some("abc"));

        store.remove("accessToken").unwrap();
        assert_eq!(store.get("accessToken").unwrap(), None);
        assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("def"));
    }

    #[test]
    fn test_writes_visible_to_other_instances() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::in_dir(dir.path()).unwrap();
        let second = FileStore::in_dir(dir.path()).unwrap();

        first.set("accessToken", "one").unwrap();
        assert_eq!(second.get("accessToken").unwrap().as_deref(), Some("one"));

        second.set("accessToken", "two").unwrap();
        assert_eq!(first.get("accessToken").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_concurrent_instances_keep_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);

        let writers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|prefix| {
                let store = FileStore::new(path.clone());
                std::thread::spawn(move || {
                    for i in 0..20 {
                        store.set(&format!("{}{}", prefix, i), "v").unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let store = FileStore::new(path);
        for prefix in ["a", "b"] {
            for i in 0..20 {
                let key = format!("{}{}", prefix, i);
                assert_eq!(store.get(&key).unwrap().as_deref(), Some("v"), "{} lost", key);
            }
        }
    }

    #[test]
    fn test_reader_never_sees_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        let writer_store = FileStore::new(path.clone());
        writer_store.set("refreshToken", "keep").unwrap();

        let writer = std::thread::spawn(move || {
            for i in 0..50 {
                writer_store.set("accessToken", &format!("token-{}", i)).unwrap();
            }
        });
        let reader = FileStore::new(path);
        for _ in 0..50 {
            assert_eq!(reader.get("refreshToken").unwrap().as_deref(), Some("keep"));
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.get("accessToken").is_err());
    }
}
