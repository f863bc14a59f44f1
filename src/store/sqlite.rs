// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed document store.
//!
//! Persists documents with their embedding vectors in
//! `.simscan/documents.sqlite` by default and serves ranked
//! nearest-neighbor queries with an SQL-side scan.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::store::{CorpusDocument, DocumentStore, ScoredDocument};

/// SQLite-backed document store.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteDocumentStore {
    /// Opens or creates a document store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let store = Self {
            conn: Mutex::new(conn),
            path,
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Opens a document store in the default location under a data root.
    pub fn open_default<P: AsRef<Path>>(data_root: P) -> Result<Self> {
        let db_path = data_root.as_ref().join(".simscan").join("documents.sqlite");
        Self::open(db_path)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("store lock poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                doc_id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_created_at
                ON documents(created_at DESC);
            "#,
        )
        .context("Failed to initialize database schema")?;

        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1')",
            [],
        )?;

        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets metadata value by key.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let value = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to get meta")?;
        Ok(value)
    }

    /// Sets metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("store lock poisoned");
        conn.execute(
            r#"
            INSERT INTO meta (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Converts an embedding vector to a compact blob.
    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Converts a blob back to an embedding vector.
    fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if magnitude_a == 0.0 || magnitude_b == 0.0 {
            return 0.0;
        }

        dot_product / (magnitude_a * magnitude_b)
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<CorpusDocument> {
        let embedding_blob: Vec<u8> = row.get(3)?;
        Ok(CorpusDocument {
            doc_id: row.get(0)?,
            filename: row.get(1)?,
            content: row.get(2)?,
            vector: Self::blob_to_embedding(&embedding_blob),
            created_at: row.get(4)?,
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn store(&self, document: &CorpusDocument) -> Result<()> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let embedding_blob = Self::embedding_to_blob(&document.vector);
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO documents (doc_id, filename, content, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                document.doc_id,
                document.filename,
                document.content,
                embedding_blob,
                document.created_at
            ],
        )?;

        if inserted == 0 {
            bail!("Document already stored: {}", document.doc_id);
        }
        Ok(())
    }

    fn get(&self, doc_id: &str) -> Result<Option<CorpusDocument>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let document = conn
            .query_row(
                r#"
                SELECT doc_id, filename, content, embedding, created_at
                FROM documents
                WHERE doc_id = ?1
                "#,
                params![doc_id],
                Self::row_to_document,
            )
            .optional()
            .context("Failed to query document")?;

        Ok(document)
    }

    fn supports_index(&self) -> bool {
        true
    }

    fn search_nearest(
        &self,
        vector: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredDocument>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, filename, content, embedding, created_at
            FROM documents
            "#,
        )?;

        let mut results: Vec<ScoredDocument> = stmt
            .query_map([], |row| {
                let document = Self::row_to_document(row)?;
                let score = Self::cosine_similarity(vector, &document.vector);
                Ok(ScoredDocument { document, score })
            })?
            .filter_map(|r| r.ok())
            .filter(|scored| scored.score >= threshold)
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    fn recent(&self, limit: usize) -> Result<Vec<CorpusDocument>> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, filename, content, embedding, created_at
            FROM documents
            ORDER BY created_at DESC, doc_id DESC
            LIMIT ?1
            "#,
        )?;

        let documents = stmt
            .query_map(params![limit as i64], Self::row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to list recent documents")?;

        Ok(documents)
    }

    fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
