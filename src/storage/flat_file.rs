use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::models::CapturedNote;

/// JSON-array note store used when SQLite is unavailable.
///
/// The whole list is rewritten on every save through a temp file that is
/// renamed over the target, so readers only ever see complete snapshots.
pub struct FlatFileStore {
    path: PathBuf,
    tmp_path: PathBuf,
    // Held across the whole write/fsync/rename sequence.
    notes: Mutex<Vec<CapturedNote>>,
}

impl FlatFileStore {
    /// Loads the existing file. Missing or unparseable content yields an
    /// empty store rather than an error.
    pub fn open(path: PathBuf) -> Self {
        let notes = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable notes file {}: {err}",
                    path.display()
                );
                Vec::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                warn!(
                    "Cannot read notes file {}; starting empty: {err}",
                    path.display()
                );
                Vec::new()
            }
        };

        let tmp_path = temp_sibling(&path);
        Self {
            path,
            tmp_path,
            notes: Mutex::new(notes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, note: CapturedNote) -> Result<()> {
        let mut guard = self.notes.lock().await;

        let mut next = guard.clone();
        next.push(note);
        self.commit(&next).await?;

        *guard = next;
        Ok(())
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Vec<CapturedNote> {
        let guard = self.notes.lock().await;

        // Stored in insertion order; reversing first keeps later inserts
        // ahead on equal timestamps once the stable sort runs.
        let mut sorted: Vec<CapturedNote> = guard.iter().rev().cloned().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        sorted
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect()
    }

    async fn commit(&self, notes: &[CapturedNote]) -> Result<()> {
        let parent = parent_dir(&self.path);
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let serialized = serde_json::to_vec_pretty(notes).context("failed to serialize notes")?;
        self.write_temp(&serialized).await?;

        fs::rename(&self.tmp_path, &self.path)
            .await
            .with_context(|| {
                format!(
                    "failed to move {} over {}",
                    self.tmp_path.display(),
                    self.path.display()
                )
            })?;

        sync_dir(parent).await
    }

    async fn write_temp(&self, bytes: &[u8]) -> Result<()> {
        let mut file = fs::File::create(&self.tmp_path)
            .await
            .with_context(|| format!("failed to create {}", self.tmp_path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("failed to write {}", self.tmp_path.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("failed to sync {}", self.tmp_path.display()))?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Makes the rename itself durable.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> Result<()> {
    let handle = fs::File::open(dir)
        .await
        .with_context(|| format!("failed to open {}", dir.display()))?;
    handle
        .sync_all()
        .await
        .with_context(|| format!("failed to sync {}", dir.display()))
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "notes.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
