//! Client-side snapshot of the last parsed description
//!
//! One JSON file, overwritten on every successful parse, read by whatever
//! consumer is launched next. Writes go to a uniquely named sibling temp
//! file first and are renamed into place. Generation-stamped writes never
//! replace a newer snapshot with an older one.

use crate::error::SnapshotError;
use crate::state::{DerivedData, ParsedSource};
use chrono::{DateTime, Utc};
use docpipe_openapi::ParsedApiDescription;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use ulid::Ulid;

/// Persisted parse result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,
    /// Where the description came from
    pub source: ParsedSource,
    /// The description
    pub description: ParsedApiDescription,
    /// Derived data, when the source provided any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedData>,
}

impl Snapshot {
    /// Snapshot stamped now
    #[must_use]
    pub fn new(source: ParsedSource, description: ParsedApiDescription, derived: Option<DerivedData>) -> Self {
        Self {
            saved_at: Utc::now(),
            source,
            description,
            derived,
        }
    }
}

/// File-backed snapshot storage
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    /// Generation of the snapshot on disk; held for the whole write
    written: Mutex<u64>,
}

impl SnapshotStore {
    /// Store at `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            written: Mutex::new(0),
        }
    }

    /// Snapshot file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Write `snapshot`, replacing any previous one
    ///
    /// # Errors
    /// [`SnapshotError::Io`] if the directory or file cannot be written.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let _written = self.written.lock().await;
        self.write(snapshot).await
    }

    /// Write `snapshot` unless one with a later `generation` is already on disk
    ///
    /// Returns whether the file was written.
    ///
    /// # Errors
    /// [`SnapshotError::Io`] if the directory or file cannot be written.
    pub async fn save_generation(&self, generation: u64, snapshot: &Snapshot) -> Result<bool, SnapshotError> {
        let mut written = self.written.lock().await;
        if generation <= *written {
            return Ok(false);
        }
        self.write(snapshot).await?;
        *written = generation;
        Ok(true)
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await.map_err(|e| self.io_error(e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_error(e));
        }

        tracing::debug!(path = %self.path.display(), title = %snapshot.description.title, "snapshot written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "snapshot".to_string(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.{}.tmp", Ulid::new()))
    }

    /// Read the snapshot, `None` if none has been written
    ///
    /// # Errors
    /// [`SnapshotError::Io`] on read failure, [`SnapshotError::Json`] if the
    /// file is corrupt.
    pub async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpipe_openapi::Endpoint;

    fn description() -> ParsedApiDescription {
        ParsedApiDescription {
            title: "Sample API".to_string(),
            version: "1.0.0".to_string(),
            endpoints: vec![Endpoint::new("get", "/users", "List users")],
            ..ParsedApiDescription::default()
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("last.json"));

        assert!(store.load().await.unwrap().is_none());

        let snapshot = Snapshot::new(ParsedSource::Document("doc-1".to_string()), description(), None);
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn later_save_replaces_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("last.json"));

        store
            .save(&Snapshot::new(ParsedSource::RawText, description(), None))
            .await
            .unwrap();
        let mut second = description();
        second.title = "Orders API".to_string();
        store
            .save(&Snapshot::new(ParsedSource::Url("http://x/spec".to_string()), second, None))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.description.title, "Orders API");
        assert_eq!(loaded.source, ParsedSource::Url("http://x/spec".to_string()));
    }

    #[tokio::test]
    async fn older_generation_does_not_replace_newer() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("last.json"));
        let mut newer = description();
        newer.title = "Orders API".to_string();

        assert!(store
            .save_generation(2, &Snapshot::new(ParsedSource::RawText, newer, None))
            .await
            .unwrap());
        assert!(!store
            .save_generation(1, &Snapshot::new(ParsedSource::RawText, description(), None))
            .await
            .unwrap());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.description.title, "Orders API");
    }

    #[tokio::test]
    async fn concurrent_writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("last.json"));
        let first = Snapshot::new(ParsedSource::RawText, description(), None);
        let second = Snapshot::new(ParsedSource::Document("doc-2".to_string()), description(), None);

        let (a, b) = tokio::join!(store.save_generation(1, &first), store.save_generation(2, &second));
        a.unwrap();
        b.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["last.json"]);
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.source, ParsedSource::Document("doc-2".to_string()));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let err = SnapshotStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
