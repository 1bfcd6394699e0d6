// SPDX-License-Identifier: Apache-2.0

use crate::cache::BoardCache;
use crate::notify::Notifier;
use crate::transport::{BoardTransport, TransportError};
use std::fmt;
use std::sync::Arc;
use waypoint_model::{validate_fragment, Board, BoardFragment, BoardId, UserId};

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOptions {
    /// Suppresses the success notification; used by high-frequency
    /// structural edits where a toast per drag would be noise.
    pub silent: bool,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SubmitError {
    Transport(TransportError),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<TransportError> for SubmitError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

/// Client-side orchestration of the partial-update protocol, acting for
/// one principal.
pub struct MutationClient {
    transport: Arc<dyn BoardTransport>,
    notifier: Arc<dyn Notifier>,
    cache: BoardCache,
    pub(crate) user_id: UserId,
    pub(crate) author_name: String,
}

impl MutationClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn BoardTransport>,
        notifier: Arc<dyn Notifier>,
        user_id: UserId,
        author_name: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            notifier,
            cache: BoardCache::new(),
            user_id,
            author_name: author_name.into(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &BoardCache {
        &self.cache
    }

    pub(crate) fn transport(&self) -> &dyn BoardTransport {
        self.transport.as_ref()
    }

    /// Read path: cached copy if present, otherwise fetch and confirm.
    pub async fn get_board(&self, id: &BoardId) -> Result<Board, TransportError> {
        if let Some(entry) = self.cache.get(id).await {
            return Ok(entry.board);
        }
        let board = self.transport.fetch_board(id).await?;
        self.cache.set_confirmed(board.clone()).await;
        Ok(board)
    }

    /// Drops the cached projection; the next read refetches canonical.
    pub async fn invalidate(&self, id: &BoardId) {
        self.cache.invalidate(id).await;
    }

    /// Creates or replaces a board server-side and confirms the canonical
    /// response locally.
    pub async fn create_board(&self, board: &Board) -> Result<Board, TransportError> {
        let canonical = self.transport.put_board(board).await?;
        self.cache.set_confirmed(canonical.clone()).await;
        Ok(canonical)
    }

    /// Submits a fragment: optimistic cache write first, then the request.
    /// Success replaces the entry with the server's canonical Board
    /// (discarding the optimistic guess, which may differ if another actor
    /// raced). Failure leaves the optimistic state in place, marked
    /// diverged; there is no rollback. Responses are not ordered; rapid
    /// submits to one board must be serialized by the caller if ordering
    /// matters.
    pub async fn submit(
        &self,
        id: &BoardId,
        fragment: BoardFragment,
        options: SubmitOptions,
    ) -> Result<Board, SubmitError> {
        // Best-effort pre-check; never blocks the submit.
        if let Err(err) = validate_fragment(&fragment) {
            tracing::warn!(board = %id, error = %err, "fragment failed local validation, submitting anyway");
        }
        self.cache.apply_optimistic(id, &fragment).await;
        match self.transport.patch_board(id, &fragment).await {
            Ok(board) => {
                self.cache.set_confirmed(board.clone()).await;
                if !options.silent {
                    self.notifier.success("board updated");
                }
                Ok(board)
            }
            Err(err) => {
                self.cache.mark_diverged(id).await;
                self.notifier.failure(&err.to_string());
                Err(err.into())
            }
        }
    }
}
