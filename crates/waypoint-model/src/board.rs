// SPDX-License-Identifier: Apache-2.0

use crate::ids::{BlockId, BoardId, ColumnId, CommentId, PhaseId, UserId};
use serde::{Deserialize, Serialize};

/// Workflow status of a Board. Transitions are unconstrained; the enum is
/// membership-checked only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum BoardStatus {
    Draft,
    InProgress,
    Review,
    Complete,
    Archived,
}

impl BoardStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Complete => "complete",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_name: String,
    pub user_id: UserId,
    /// Unix millis, server-assigned. `0` marks a comment the server has not
    /// stamped yet.
    #[serde(default)]
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// References a Column somewhere in the Board's phase tree. Blocks live
    /// in a flat sequence on the Board, not nested under Phase/Column.
    pub column_id: ColumnId,
    #[serde(default)]
    pub content: String,
    /// Free-form lane/type label (e.g. "customer-action", "backstage").
    #[serde(default)]
    pub lane: String,
    /// Insertion order is display order; ids must be unique.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    #[serde(default)]
    pub name: String,
    /// Set and cleared together with `storyboard_prompt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyboard_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyboard_prompt: Option<String>,
}

impl Column {
    #[must_use]
    pub fn new(id: ColumnId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            storyboard_image_url: None,
            storyboard_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Phase {
    pub id: PhaseId,
    #[serde(default)]
    pub name: String,
    /// Array position is journey-stage order; there is no rank field.
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    #[serde(default)]
    pub name: String,
    pub status: BoardStatus,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    pub owner: UserId,
    #[serde(default)]
    pub collaborators: Vec<UserId>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl Board {
    #[must_use]
    pub fn new(id: BoardId, name: impl Into<String>, owner: UserId) -> Self {
        Self {
            id,
            name: name.into(),
            status: BoardStatus::Draft,
            phases: Vec::new(),
            blocks: Vec::new(),
            owner,
            collaborators: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[must_use]
    pub fn can_mutate(&self, actor: &UserId) -> bool {
        self.owner == *actor || self.collaborators.contains(actor)
    }

    /// Looks up a Column anywhere in the phase tree.
    #[must_use]
    pub fn find_column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.phases
            .iter()
            .flat_map(|p| p.columns.iter())
            .find(|c| c.id == *column_id)
    }

    #[must_use]
    pub fn find_block(&self, block_id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == *block_id)
    }

    #[must_use]
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// Index-view row for the board listing read path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: BoardId,
    pub name: String,
    pub status: BoardStatus,
    pub updated_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{parse_board_id, parse_user_id};

    #[test]
    fn status_round_trips_kebab_case() {
        let json = serde_json::to_string(&BoardStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in-progress\"");
        let back: BoardStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, BoardStatus::InProgress);
    }

    #[test]
    fn unknown_status_is_rejected_at_the_serde_boundary() {
        let err = serde_json::from_str::<BoardStatus>("\"finished\"");
        assert!(err.is_err());
    }

    #[test]
    fn can_mutate_accepts_owner_and_collaborators_only() {
        let mut board = Board::new(
            parse_board_id("bd1").expect("id"),
            "Onboarding journey",
            parse_user_id("u1").expect("owner"),
        );
        board.collaborators.push(parse_user_id("u2").expect("collab"));
        assert!(board.can_mutate(&parse_user_id("u1").expect("u1")));
        assert!(board.can_mutate(&parse_user_id("u2").expect("u2")));
        assert!(!board.can_mutate(&parse_user_id("u3").expect("u3")));
    }
}
