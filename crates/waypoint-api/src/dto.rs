// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use waypoint_model::{Board, ColumnId, UserId};

/// Body of `POST /api/boards/{id}/blocks/{blockId}/comments`. The identity
/// pair is attached by the fronting identity collaborator and trusted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    pub user_id: UserId,
    pub author_name: String,
}

/// Body of `POST /api/boards/{id}/columns/{columnId}/generate-storyboard`.
/// A string prompt attaches (after invoking the generation provider); a
/// null prompt detaches, clearing url and prompt together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryboardRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StoryboardResponse {
    pub column_id: ColumnId,
    pub image_url: Option<String>,
    pub prompt: Option<String>,
    /// Canonical Board after the patch, so clients reconcile uniformly.
    pub board: Board,
}
