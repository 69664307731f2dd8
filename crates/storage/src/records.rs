//! JSON record files, one per (book fingerprint, record kind).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use marginalia_core::{Record, RecordKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read {kind} from {}: {source}", path.display())]
    Read {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed {kind} in {}: {source}", path.display())]
    Malformed {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode {kind}: {source}")]
    Encode {
        kind: RecordKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("write {kind} to {}: {source}", path.display())]
    Write {
        kind: RecordKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn kind(&self) -> RecordKind {
        match self {
            StoreError::Read { kind, .. }
            | StoreError::Malformed { kind, .. }
            | StoreError::Encode { kind, .. }
            | StoreError::Write { kind, .. } => *kind,
        }
    }
}

/// Result of a load. `records` is empty whenever `warning` is set.
#[derive(Debug)]
pub struct Loaded<R> {
    pub records: Vec<R>,
    pub warning: Option<StoreError>,
}

impl<R> Loaded<R> {
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

#[derive(Debug)]
pub struct Appended<R> {
    /// Full list including the new record, whether or not it reached disk.
    pub records: Vec<R>,
    pub load_warning: Option<StoreError>,
    pub save_error: Option<StoreError>,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: RecordKind, book_key: &str) -> PathBuf {
        self.dir.join(kind.file_name(book_key))
    }

    /// Never fails: absent, unreadable and malformed files all load as an
    /// empty list. Only the last two carry a warning.
    pub fn load<R: Record>(&self, book_key: &str) -> Loaded<R> {
        match self.try_load(book_key) {
            Ok(records) => Loaded {
                records,
                warning: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "falling back to empty record list");
                Loaded {
                    records: Vec::new(),
                    warning: Some(err),
                }
            }
        }
    }

    pub fn try_load<R: Record>(&self, book_key: &str) -> Result<Vec<R>, StoreError> {
        let path = self.path_for(R::KIND, book_key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(kind = %R::KIND, path = %path.display(), "no records saved yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    kind: R::KIND,
                    path,
                    source,
                });
            }
        };

        let records: Vec<R> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
                kind: R::KIND,
                path: path.clone(),
                source,
            })?;
        tracing::debug!(kind = %R::KIND, path = %path.display(), count = records.len(), "loaded records");
        Ok(records)
    }

    /// Overwrites the file with the full list.
    pub fn save<R: Record>(&self, book_key: &str, records: &[R]) -> Result<(), StoreError> {
        let path = self.path_for(R::KIND, book_key);
        let json = serde_json::to_vec(records).map_err(|source| StoreError::Encode {
            kind: R::KIND,
            source,
        })?;

        let write = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, json));
        if let Err(source) = write {
            let err = StoreError::Write {
                kind: R::KIND,
                path,
                source,
            };
            tracing::warn!(error = %err, "save failed");
            return Err(err);
        }
        tracing::debug!(kind = %R::KIND, path = %path.display(), count = records.len(), "saved records");
        Ok(())
    }

    /// Load, push, save.
    pub fn append<R: Record>(&self, book_key: &str, record: R) -> Appended<R> {
        let Loaded {
            mut records,
            warning,
        } = self.load(book_key);
        records.push(record);
        let save_error = self.save(book_key, &records).err();
        Appended {
            records,
            load_warning: warning,
            save_error,
        }
    }
}
