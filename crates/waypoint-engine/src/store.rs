// SPDX-License-Identifier: Apache-2.0

//! Persistence port and its two backends.
//!
//! `update` is the only mutation path: an atomic read-modify-write that
//! holds the document's single-writer guarantee for the whole apply. Two
//! concurrent updates to one board serialize here, which is what makes the
//! field-level last-write-wins behavior well defined.

use crate::error::{MergeError, StoreError, UpdateError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use waypoint_model::{Board, BoardId, BoardSummary};

pub type ApplyFn<'a> = &'a (dyn Fn(&Board) -> Result<Board, MergeError> + Send + Sync);

#[async_trait]
pub trait BoardStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn fetch(&self, id: &BoardId) -> Result<Option<Board>, StoreError>;

    /// Creates or wholesale-replaces a board document.
    async fn persist(&self, board: &Board) -> Result<(), StoreError>;

    /// Atomic read-modify-write: `apply` observes the current canonical
    /// Board and produces the next one, committed in the same critical
    /// section.
    async fn update(&self, id: &BoardId, apply: ApplyFn<'_>) -> Result<Board, UpdateError>;

    async fn list_summaries(&self) -> Result<Vec<BoardSummary>, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    boards: Mutex<HashMap<BoardId, Board>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, id: &BoardId) -> Result<Option<Board>, StoreError> {
        Ok(self.boards.lock().await.get(id).cloned())
    }

    async fn persist(&self, board: &Board) -> Result<(), StoreError> {
        self.boards
            .lock()
            .await
            .insert(board.id.clone(), board.clone());
        Ok(())
    }

    async fn update(&self, id: &BoardId, apply: ApplyFn<'_>) -> Result<Board, UpdateError> {
        let mut boards = self.boards.lock().await;
        let stored = boards
            .get(id)
            .ok_or_else(|| UpdateError::NotFound(id.clone()))?;
        let next = apply(stored)?;
        boards.insert(id.clone(), next.clone());
        Ok(next)
    }

    async fn list_summaries(&self) -> Result<Vec<BoardSummary>, StoreError> {
        let boards = self.boards.lock().await;
        let mut out: Vec<BoardSummary> = boards.values().map(Board::summary).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}

/// One row per board; the canonical JSON document is the value. Row-level
/// replace within a transaction gives single-document write atomicity.
///
/// Queries run synchronously on the calling runtime thread while the
/// connection mutex is held. Board documents are a few kilobytes, which
/// keeps each critical section short; storing larger documents would call
/// for moving these queries onto a blocking pool.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS boards (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )
        .map_err(|e| StoreError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn decode(doc: &str) -> Result<Board, StoreError> {
        serde_json::from_str(doc).map_err(|e| StoreError(format!("stored doc decode: {e}")))
    }

    fn encode(board: &Board) -> Result<String, StoreError> {
        serde_json::to_string(board).map_err(|e| StoreError(format!("doc encode: {e}")))
    }
}

#[async_trait]
impl BoardStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch(&self, id: &BoardId) -> Result<Option<Board>, StoreError> {
        let conn = self.conn.lock().await;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM boards WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError(e.to_string()))?;
        doc.as_deref().map(Self::decode).transpose()
    }

    async fn persist(&self, board: &Board) -> Result<(), StoreError> {
        let doc = Self::encode(board)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO boards (id, doc, updated_at) VALUES (?1, ?2, ?3)",
            params![board.id.as_str(), doc, board.updated_at as i64],
        )
        .map_err(|e| StoreError(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, id: &BoardId, apply: ApplyFn<'_>) -> Result<Board, UpdateError> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| UpdateError::Store(StoreError(e.to_string())))?;
        let doc: Option<String> = tx
            .query_row(
                "SELECT doc FROM boards WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| UpdateError::Store(StoreError(e.to_string())))?;
        let doc = doc.ok_or_else(|| UpdateError::NotFound(id.clone()))?;
        let stored = Self::decode(&doc)?;
        let next = apply(&stored)?;
        let encoded = Self::encode(&next)?;
        tx.execute(
            "UPDATE boards SET doc = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.as_str(), encoded, next.updated_at as i64],
        )
        .map_err(|e| UpdateError::Store(StoreError(e.to_string())))?;
        tx.commit()
            .map_err(|e| UpdateError::Store(StoreError(e.to_string())))?;
        Ok(next)
    }

    async fn list_summaries(&self) -> Result<Vec<BoardSummary>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT doc FROM boards ORDER BY id")
            .map_err(|e| StoreError(e.to_string()))?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError(e.to_string()))?;
        let mut out = Vec::new();
        for doc in docs {
            let doc = doc.map_err(|e| StoreError(e.to_string()))?;
            out.push(Self::decode(&doc)?.summary());
        }
        Ok(out)
    }
}
