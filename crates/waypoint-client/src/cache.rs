// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use tokio::sync::Mutex;
use waypoint_model::{Board, BoardFragment, BoardId};

/// Confirmation state of one cached board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Matches the last canonical copy the server returned.
    Confirmed,
    /// Locally patched ahead of a pending request.
    Optimistic,
    /// A request failed after the optimistic write; the entry shows state
    /// the server never accepted, until the next refetch.
    DivergedOnError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub board: Board,
    pub status: EntryStatus,
}

/// Keyed store for board projections. Explicit get/set/invalidate, no
/// ambient shared state.
#[derive(Default)]
pub struct BoardCache {
    entries: Mutex<HashMap<BoardId, CacheEntry>>,
}

impl BoardCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &BoardId) -> Option<CacheEntry> {
        self.entries.lock().await.get(id).cloned()
    }

    /// Wholesale replace with a canonical server copy.
    pub async fn set_confirmed(&self, board: Board) {
        self.entries.lock().await.insert(
            board.id.clone(),
            CacheEntry {
                board,
                status: EntryStatus::Confirmed,
            },
        );
    }

    /// Applies a fragment to the cached entry (field-level replace, the
    /// same rule the server merge uses) and marks it optimistic. Returns
    /// the patched board, or `None` when the board was never cached.
    pub async fn apply_optimistic(
        &self,
        id: &BoardId,
        fragment: &BoardFragment,
    ) -> Option<Board> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(id)?;
        entry.board = fragment.apply_to(&entry.board);
        entry.status = EntryStatus::Optimistic;
        Some(entry.board.clone())
    }

    /// Marks a pending optimistic entry as diverged after a failed request.
    pub async fn mark_diverged(&self, id: &BoardId) {
        if let Some(entry) = self.entries.lock().await.get_mut(id) {
            entry.status = EntryStatus::DivergedOnError;
        }
    }

    pub async fn invalidate(&self, id: &BoardId) {
        self.entries.lock().await.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_model::{parse_board_id, parse_user_id, BoardStatus};

    fn board() -> Board {
        Board::new(
            parse_board_id("B1").expect("id"),
            "A journey",
            parse_user_id("u1").expect("owner"),
        )
    }

    #[tokio::test]
    async fn optimistic_apply_requires_a_cached_entry() {
        let cache = BoardCache::new();
        let id = parse_board_id("B1").expect("id");
        let fragment = BoardFragment::status(BoardStatus::Review);
        assert!(cache.apply_optimistic(&id, &fragment).await.is_none());

        cache.set_confirmed(board()).await;
        let patched = cache
            .apply_optimistic(&id, &fragment)
            .await
            .expect("patched");
        assert_eq!(patched.status, BoardStatus::Review);
        let entry = cache.get(&id).await.expect("entry");
        assert_eq!(entry.status, EntryStatus::Optimistic);
    }

    #[tokio::test]
    async fn invalidate_drops_the_entry() {
        let cache = BoardCache::new();
        cache.set_confirmed(board()).await;
        let id = parse_board_id("B1").expect("id");
        cache.invalidate(&id).await;
        assert!(cache.get(&id).await.is_none());
    }
}
