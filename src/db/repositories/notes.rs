use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::{db::Database, models::CapturedNote};

fn row_to_note(row: &Row) -> Result<CapturedNote> {
    Ok(CapturedNote {
        id: row.get("id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Insert a single note. One statement, committed before returning.
    pub async fn insert_note(&self, note: &CapturedNote) -> Result<()> {
        let record = note.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO entries (id, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![record.id, record.text, record.created_at, record.updated_at],
            )
            .with_context(|| "failed to insert note")?;
            Ok(())
        })
        .await
    }

    /// Newest first, bounded by `limit`, skipping `offset`.
    pub async fn list_notes(&self, limit: u32, offset: u32) -> Result<Vec<CapturedNote>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, created_at, updated_at
                 FROM entries
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1 OFFSET ?2",
            )?;

            let mut rows = stmt.query(params![i64::from(limit), i64::from(offset)])?;
            let mut notes = Vec::new();
            while let Some(row) = rows.next()? {
                notes.push(row_to_note(row)?);
            }

            Ok(notes)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn insert_then_list_newest_first() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("notes.sqlite3")).unwrap();

        for (i, text) in ["first", "second", "third"].into_iter().enumerate() {
            db.insert_note(&CapturedNote::new(text.into(), 1_000 + i as i64))
                .await
                .unwrap();
        }

        let notes = db.list_notes(10, 0).await.unwrap();
        let texts: Vec<_> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
        assert!(notes.iter().all(|n| n.updated_at.is_none()));

        let page = db.list_notes(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text, "second");
    }

    #[tokio::test]
    async fn notes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.sqlite3");
        {
            let db = Database::new(path.clone()).unwrap();
            db.insert_note(&CapturedNote::new("kept".into(), 5))
                .await
                .unwrap();
        }

        let reopened = Database::new(path).unwrap();
        let notes = reopened.list_notes(20, 0).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "kept");
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.sqlite3");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();
        assert!(Database::new(path).is_err());
    }
}
