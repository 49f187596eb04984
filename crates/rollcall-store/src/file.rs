//! File-backed store: one JSON document per record.
//!
//! ```text
//! <root>/
//!   attendance/            ← one file per session, rewritten in place
//!     AB12C.json
//!   attendance_history/    ← one file per stopped session, write-once
//!     CS101_1_20240902_AB12C.json
//! ```
//!
//! # Crash safety
//!
//! No write ever touches the final path directly. Bytes go to a hidden
//! temporary file in the same directory (same filesystem, so the final
//! step is a metadata operation), get fsynced, and are then moved into
//! place:
//!
//! - session writes use `rename`, which atomically replaces the old file;
//! - history writes use `hard_link`, which atomically fails if the target
//!   already exists, so history can never be overwritten.
//!
//! A crash at any point leaves either the old record or the new one, plus
//! at worst a stray `.tmp` file that listings ignore.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use rollcall_protocol::{
    AttendanceSession, Codec, HistoryRecord, JsonCodec, SessionId, clean_identifier,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{HistoryStore, SessionStore, StoreError};

const SESSIONS_DIR: &str = "attendance";
const HISTORY_DIR: &str = "attendance_history";
const EXTENSION: &str = "json";

/// The local-filesystem implementation of [`SessionStore`] and
/// [`HistoryStore`].
///
/// Cheap to clone: it's just two paths.
#[derive(Debug, Clone)]
pub struct FileStore {
    sessions_dir: PathBuf,
    history_dir: PathBuf,
    codec: JsonCodec,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// [`StoreError::Io`] if the directories can't be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        let sessions_dir = root.join(SESSIONS_DIR);
        let history_dir = root.join(HISTORY_DIR);

        for dir in [&sessions_dir, &history_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io("create_dir", dir.display().to_string(), e))?;
        }

        tracing::info!(root = %root.display(), "file store opened");
        Ok(Self {
            sessions_dir,
            history_dir,
            codec: JsonCodec,
        })
    }

    /// Directory holding live session records.
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Directory holding history records.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    fn encode<T: Serialize>(&self, name: &str, value: &T) -> Result<Vec<u8>, StoreError> {
        self.codec.encode(value).map_err(|source| StoreError::Encode {
            name: name.to_string(),
            source,
        })
    }

    /// Reads and decodes one record. A missing file is `Ok(None)`.
    async fn read_record<T: DeserializeOwned>(
        &self,
        path: &Path,
        name: &str,
    ) -> Result<Option<T>, StoreError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io("read", name, e)),
        };
        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                name: name.to_string(),
                source,
            })
    }

    /// Reads every record in `dir`, skipping temporaries and unreadable
    /// files.
    async fn read_all<T: DeserializeOwned>(&self, dir: &Path) -> Result<Vec<T>, StoreError> {
        let mut records = Vec::new();
        for (name, path) in record_files(dir).await? {
            match self.read_record(&path, &name).await {
                Ok(Some(record)) => records.push(record),
                // Removed between listing and reading.
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }
}

impl SessionStore for FileStore {
    async fn get(&self, id: &SessionId) -> Result<Option<AttendanceSession>, StoreError> {
        let path = record_path(&self.sessions_dir, id.as_str());
        self.read_record(&path, id.as_str()).await
    }

    async fn put(&self, session: &AttendanceSession) -> Result<(), StoreError> {
        let name = session.session_id.as_str();
        let bytes = self.encode(name, session)?;
        let tmp = write_temp(&self.sessions_dir, name, &bytes).await?;
        let path = record_path(&self.sessions_dir, name);

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StoreError::io("rename", name, e));
        }
        tracing::trace!(session_id = %name, bytes = bytes.len(), "session written");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AttendanceSession>, StoreError> {
        self.read_all(&self.sessions_dir).await
    }

    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError> {
        match fs::remove_file(record_path(&self.sessions_dir, id.as_str())).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("delete", id.as_str(), e)),
        }
    }
}

impl HistoryStore for FileStore {
    async fn insert_history(&self, record: &HistoryRecord) -> Result<bool, StoreError> {
        let name = clean_identifier(&record.history_id);
        let bytes = self.encode(&name, record)?;
        let tmp = write_temp(&self.history_dir, &name, &bytes).await?;
        let path = record_path(&self.history_dir, &name);

        // `hard_link` refuses to replace an existing file, which is exactly
        // the write-once guarantee history needs.
        let linked = fs::hard_link(&tmp, &path).await;
        let _ = fs::remove_file(&tmp).await;

        match linked {
            Ok(()) => {
                tracing::debug!(history_id = %name, "history record created");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(StoreError::io("link", name, e)),
        }
    }

    async fn get_history(&self, history_id: &str) -> Result<Option<HistoryRecord>, StoreError> {
        let name = clean_identifier(history_id);
        if name.is_empty() {
            return Ok(None);
        }
        self.read_record(&record_path(&self.history_dir, &name), &name)
            .await
    }

    async fn find_history(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<HistoryRecord>, StoreError> {
        let files = record_files(&self.history_dir).await?;

        // Fast path: archive names end with the session id.
        let suffix = format!("_{session_id}");
        for (name, path) in files.iter().filter(|(name, _)| name.ends_with(&suffix)) {
            match self.read_record::<HistoryRecord>(path, name).await {
                Ok(Some(record)) if record.session.session_id == *session_id => {
                    return Ok(Some(record));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable history record"),
            }
        }

        // Slow path: records whose name doesn't follow the convention.
        for (name, path) in &files {
            match self.read_record::<HistoryRecord>(path, name).await {
                Ok(Some(record)) if record.session.session_id == *session_id => {
                    return Ok(Some(record));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable history record"),
            }
        }

        Ok(None)
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        self.read_all(&self.history_dir).await
    }
}

fn record_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{EXTENSION}"))
}

/// Lists `(name, path)` for every record file in `dir`, sorted by name.
/// Hidden files (our temporaries) are ignored.
async fn record_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let dir_name = dir.display().to_string();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::io("read_dir", dir_name.clone(), e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io("read_dir", dir_name.clone(), e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('.') {
            continue;
        }
        files.push((stem.to_string(), path));
    }
    files.sort();
    Ok(files)
}

/// Writes `bytes` to a fresh hidden temporary file in `dir` and fsyncs it.
///
/// The random suffix keeps concurrent writers of the same record from
/// sharing a temporary file.
async fn write_temp(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    let nonce: u64 = rand::rng().random();
    let tmp = dir.join(format!(".{name}.{nonce:016x}.tmp"));

    let mut file = fs::File::create(&tmp)
        .await
        .map_err(|e| StoreError::io("create", name, e))?;
    let written = async {
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::io("write", name, e));
    }
    Ok(tmp)
}
