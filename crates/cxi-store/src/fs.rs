use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use cxi_types::{EntityId, PropertyRecord};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::key::{RecordKey, RecordSet};
use crate::traits::PropertyStore;

/// File name of a record inside its directory.
pub const RECORD_FILE: &str = "properties.json";

/// Filesystem-backed property store.
///
/// Every record lives in `<root>/<key path>/properties.json`. Writes go to
/// a temporary file in the same directory which is then renamed over the
/// record file, so readers see either the old or the new record.
pub struct FsPropertyStore {
    root: PathBuf,
    sealed: AtomicBool,
}

impl FsPropertyStore {
    /// Create a new, writable store rooted at `root`.
    ///
    /// The directory is created if needed and must be empty.
    pub fn create(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        if fs::read_dir(root)?.next().is_some() {
            return Err(StoreError::DirectoryNotEmpty(root.to_path_buf()));
        }
        debug!(root = %root.display(), "created property store");
        Ok(Self {
            root: root.to_path_buf(),
            sealed: AtomicBool::new(false),
        })
    }

    /// Open a finished store. The store is sealed.
    pub fn open(root: &Path) -> StoreResult<Self> {
        if !root.is_dir() {
            return Err(StoreError::MissingStore(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            sealed: AtomicBool::new(true),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `key`.
    pub fn record_path(&self, key: &RecordKey) -> PathBuf {
        self.root.join(key.relative_dir()).join(RECORD_FILE)
    }

    /// Count record files on disk.
    pub fn record_count(&self) -> StoreResult<usize> {
        let mut count = 0;
        for entry in walkdir::WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| StoreError::Io(io::Error::other(e)))?;
            if entry.file_type().is_file() && entry.file_name() == RECORD_FILE {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl PropertyStore for FsPropertyStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<PropertyRecord>> {
        let data = match fs::read(self.record_path(key)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| StoreError::CorruptRecord {
                key: key.clone(),
                reason: e.to_string(),
            })
    }

    fn put(&self, key: &RecordKey, record: &PropertyRecord) -> StoreResult<()> {
        if self.is_sealed() {
            return Err(StoreError::ReadOnly);
        }
        let data =
            serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dir = self.root.join(key.relative_dir());
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.flush()?;
        tmp.persist(dir.join(RECORD_FILE))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn contains(&self, key: &RecordKey) -> StoreResult<bool> {
        Ok(self.record_path(key).is_file())
    }

    fn list_ids(&self, set: &RecordSet) -> StoreResult<Vec<EntityId>> {
        let dir = self.root.join(set.relative_dir());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().join(RECORD_FILE).is_file() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().and_then(|n| set.parse_dir_name(n)) {
                Some(id) => ids.push(id),
                None => warn!(dir = %dir.display(), name = ?name, "unrecognized record directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for FsPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsPropertyStore")
            .field("root", &self.root)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
