// SPDX-License-Identifier: Apache-2.0

//! Feature flows over the submit protocol.
//!
//! Every structural edit recomputes the affected collection locally and
//! submits it as one whole-field patch; that is what makes arbitrary
//! reorder/insert/delete expressible as a single field write.

use crate::mutation::{MutationClient, SubmitError, SubmitOptions};
use crate::transport::TransportError;
use waypoint_api::{CommentRequest, StoryboardRequest, StoryboardResponse};
use waypoint_model::{
    Block, BlockId, Board, BoardFragment, BoardId, BoardStatus, ColumnId, Comment, CommentId,
    Phase,
};

/// Client-generated entity id: optimistic rendering never waits on
/// server-assigned identity.
#[must_use]
pub fn fresh_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

impl MutationClient {
    /// Appends a comment to one block's thread. The thread grows locally at
    /// once; the server's canonical Board (with the server-assigned comment
    /// id and timestamp) replaces the guess on success.
    pub async fn append_comment(
        &self,
        board_id: &BoardId,
        block_id: &BlockId,
        content: impl Into<String>,
    ) -> Result<Board, SubmitError> {
        let content = content.into();
        if let Some(entry) = self.cache().get(board_id).await {
            if let Ok(local_id) = CommentId::parse(&fresh_id("cmt")) {
                let blocks: Vec<Block> = entry
                    .board
                    .blocks
                    .iter()
                    .map(|b| {
                        let mut next = b.clone();
                        if next.id == *block_id {
                            next.comments.push(Comment {
                                id: local_id.clone(),
                                content: content.clone(),
                                author_name: self.author_name.clone(),
                                user_id: self.user_id.clone(),
                                created_at: 0,
                            });
                        }
                        next
                    })
                    .collect();
                self.cache()
                    .apply_optimistic(board_id, &BoardFragment::blocks(blocks))
                    .await;
            }
        }
        let request = CommentRequest {
            content,
            user_id: self.user_id.clone(),
            author_name: self.author_name.clone(),
        };
        match self
            .transport()
            .post_comment(board_id, block_id, &request)
            .await
        {
            Ok(board) => {
                self.cache().set_confirmed(board.clone()).await;
                Ok(board)
            }
            Err(err) => {
                self.cache().mark_diverged(board_id).await;
                Err(err.into())
            }
        }
    }

    /// Asks the server to generate and attach a storyboard image. No
    /// optimistic write: the image url is unknown until the provider
    /// answers.
    pub async fn attach_storyboard(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
        prompt: impl Into<String>,
    ) -> Result<StoryboardResponse, TransportError> {
        let request = StoryboardRequest {
            prompt: Some(prompt.into()),
        };
        let response = self
            .transport()
            .generate_storyboard(board_id, column_id, &request)
            .await?;
        self.cache().set_confirmed(response.board.clone()).await;
        Ok(response)
    }

    /// Clears a column's storyboard pair, optimistically and then
    /// canonically. Url and prompt always move together.
    pub async fn detach_storyboard(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
    ) -> Result<StoryboardResponse, TransportError> {
        if let Some(entry) = self.cache().get(board_id).await {
            let phases: Vec<Phase> = entry
                .board
                .phases
                .iter()
                .map(|p| {
                    let mut next = p.clone();
                    for column in &mut next.columns {
                        if column.id == *column_id {
                            column.storyboard_image_url = None;
                            column.storyboard_prompt = None;
                        }
                    }
                    next
                })
                .collect();
            self.cache()
                .apply_optimistic(board_id, &BoardFragment::phases(phases))
                .await;
        }
        let request = StoryboardRequest { prompt: None };
        match self
            .transport()
            .generate_storyboard(board_id, column_id, &request)
            .await
        {
            Ok(response) => {
                self.cache().set_confirmed(response.board.clone()).await;
                Ok(response)
            }
            Err(err) => {
                self.cache().mark_diverged(board_id).await;
                Err(err)
            }
        }
    }

    /// Any status value is accepted; workflow legality is the caller's
    /// policy, not the protocol's.
    pub async fn set_status(
        &self,
        board_id: &BoardId,
        status: BoardStatus,
    ) -> Result<Board, SubmitError> {
        self.submit(board_id, BoardFragment::status(status), SubmitOptions::default())
            .await
    }

    pub async fn rename(
        &self,
        board_id: &BoardId,
        name: impl Into<String>,
    ) -> Result<Board, SubmitError> {
        self.submit(board_id, BoardFragment::name(name), SubmitOptions::default())
            .await
    }

    /// Structural edit of the phase/column tree: submit the recomputed
    /// collection wholesale, silently (drag-reorder fires these rapidly).
    pub async fn replace_phases(
        &self,
        board_id: &BoardId,
        phases: Vec<Phase>,
    ) -> Result<Board, SubmitError> {
        self.submit(
            board_id,
            BoardFragment::phases(phases),
            SubmitOptions { silent: true },
        )
        .await
    }

    /// Structural edit of the flat block sequence, silent like
    /// [`Self::replace_phases`]. Omitting a block here deletes it.
    pub async fn replace_blocks(
        &self,
        board_id: &BoardId,
        blocks: Vec<Block>,
    ) -> Result<Board, SubmitError> {
        self.submit(
            board_id,
            BoardFragment::blocks(blocks),
            SubmitOptions { silent: true },
        )
        .await
    }
}
