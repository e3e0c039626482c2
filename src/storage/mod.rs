//! Persistence gateway for captured notes.
//!
//! The backend is chosen once in [`PersistenceGateway::open`]: SQLite when it
//! initializes, otherwise the flat JSON file. The choice holds for the rest of
//! the process.

mod flat_file;

use std::{path::Path, sync::Mutex};

use chrono::Utc;
use log::{info, warn};
use thiserror::Error;

use crate::{
    db::Database,
    models::{note::normalize_text, CapturedNote},
};

pub use flat_file::FlatFileStore;

pub const DB_FILE_NAME: &str = "quickcap.sqlite3";
pub const NOTES_FILE_NAME: &str = "notes.json";

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 500;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("note text is empty")]
    EmptyNote,
    #[error("could not save note: {0:#}")]
    Write(anyhow::Error),
    #[error("could not read notes: {0:#}")]
    Read(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePreference {
    Structured,
    FlatFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Structured,
    FlatFile,
}

enum Backend {
    Structured(Database),
    FlatFile(FlatFileStore),
}

pub struct PersistenceGateway {
    backend: Backend,
    last_created_at: Mutex<i64>,
}

impl PersistenceGateway {
    /// Picks the backend for this process. Never fails: SQLite errors degrade
    /// to the flat file and are only logged.
    pub fn open(data_dir: &Path, preference: StoragePreference) -> Self {
        let flat_path = data_dir.join(NOTES_FILE_NAME);

        let backend = match preference {
            StoragePreference::FlatFile => {
                info!("Flat-file storage forced by configuration");
                Backend::FlatFile(FlatFileStore::open(flat_path))
            }
            StoragePreference::Structured => match Database::new(data_dir.join(DB_FILE_NAME)) {
                Ok(db) => Backend::Structured(db),
                Err(err) => {
                    warn!("SQLite unavailable, falling back to {}: {err:#}", flat_path.display());
                    Backend::FlatFile(FlatFileStore::open(flat_path))
                }
            },
        };

        match &backend {
            Backend::Structured(db) => info!("Notes stored in SQLite at {}", db.path().display()),
            Backend::FlatFile(store) => info!("Notes stored in {}", store.path().display()),
        }

        Self::with_backend(backend)
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            last_created_at: Mutex::new(i64::MIN),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            Backend::Structured(_) => BackendKind::Structured,
            Backend::FlatFile(_) => BackendKind::FlatFile,
        }
    }

    /// Trims and durably stores `text`. Whitespace-only input is rejected
    /// with [`StorageError::EmptyNote`] before anything is written.
    pub async fn save_note(&self, text: &str) -> Result<CapturedNote, StorageError> {
        let text = normalize_text(text).ok_or(StorageError::EmptyNote)?;
        let note = CapturedNote::new(text, self.next_created_at());

        let written = match &self.backend {
            Backend::Structured(db) => db.insert_note(&note).await,
            Backend::FlatFile(store) => store.append(note.clone()).await,
        };
        written.map_err(StorageError::Write)?;

        Ok(note)
    }

    pub async fn list_notes(&self, limit: u32, offset: u32) -> Result<Vec<CapturedNote>, StorageError> {
        let limit = limit.min(MAX_LIST_LIMIT);
        match &self.backend {
            Backend::Structured(db) => db.list_notes(limit, offset).await.map_err(StorageError::Read),
            Backend::FlatFile(store) => Ok(store.list(limit, offset).await),
        }
    }

    /// Wall-clock millis, bumped so that every note in this process is
    /// strictly newer than the previous one.
    fn next_created_at(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = match self.last_created_at.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let assigned = if now > *last { now } else { *last + 1 };
        *last = assigned;
        assigned
    }
}
