// SPDX-License-Identifier: Apache-2.0

//! Partial Board values and the field-level replace merge rule.
//!
//! A fragment carries any subset of the patchable top-level fields. Merge is
//! deliberately not recursive: a field present in the fragment replaces the
//! stored field's entire value, and absence from a submitted collection is
//! authoritative deletion for that collection. Both the server merge engine
//! and the client optimistic apply go through [`BoardFragment::apply_to`] so
//! the two sides cannot drift.

use crate::board::{Block, Board, BoardStatus, Phase};
use crate::ids::{BoardId, UserId};
use serde::{Deserialize, Serialize};

/// Patchable top-level fields of a Board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardField {
    Name,
    Status,
    Phases,
    Blocks,
    Collaborators,
}

/// One whole-field replacement, the only patch kind the protocol supports.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Name(String),
    Status(BoardStatus),
    Phases(Vec<Phase>),
    Blocks(Vec<Block>),
    Collaborators(Vec<UserId>),
}

impl FieldPatch {
    #[must_use]
    pub const fn field(&self) -> BoardField {
        match self {
            Self::Name(_) => BoardField::Name,
            Self::Status(_) => BoardField::Status,
            Self::Phases(_) => BoardField::Phases,
            Self::Blocks(_) => BoardField::Blocks,
            Self::Collaborators(_) => BoardField::Collaborators,
        }
    }
}

/// Wire form of a partial Board. `owner` and timestamps are server-managed
/// and deliberately absent; submitting them is an unknown-field error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BoardFragment {
    /// Optional echo of the target board id; must match the path id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BoardId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BoardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<UserId>>,
}

impl BoardFragment {
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(value: BoardStatus) -> Self {
        Self {
            status: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn phases(value: Vec<Phase>) -> Self {
        Self {
            phases: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn blocks(value: Vec<Block>) -> Self {
        Self {
            blocks: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn collaborators(value: Vec<UserId>) -> Self {
        Self {
            collaborators: Some(value),
            ..Self::default()
        }
    }

    /// Derives a single-field fragment from an existing Board. Applying the
    /// result back to the same Board is a no-op.
    #[must_use]
    pub fn extract(board: &Board, field: BoardField) -> Self {
        match field {
            BoardField::Name => Self::name(board.name.clone()),
            BoardField::Status => Self::status(board.status),
            BoardField::Phases => Self::phases(board.phases.clone()),
            BoardField::Blocks => Self::blocks(board.blocks.clone()),
            BoardField::Collaborators => Self::collaborators(board.collaborators.clone()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.phases.is_none()
            && self.blocks.is_none()
            && self.collaborators.is_none()
    }

    /// The fragment viewed as explicit whole-field replacements.
    #[must_use]
    pub fn patches(&self) -> Vec<FieldPatch> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            out.push(FieldPatch::Name(name.clone()));
        }
        if let Some(status) = self.status {
            out.push(FieldPatch::Status(status));
        }
        if let Some(phases) = &self.phases {
            out.push(FieldPatch::Phases(phases.clone()));
        }
        if let Some(blocks) = &self.blocks {
            out.push(FieldPatch::Blocks(blocks.clone()));
        }
        if let Some(collaborators) = &self.collaborators {
            out.push(FieldPatch::Collaborators(collaborators.clone()));
        }
        out
    }

    /// Field-level replace merge: present fields overwrite, absent fields
    /// are untouched. Timestamps and ownership are never merged here.
    #[must_use]
    pub fn apply_to(&self, stored: &Board) -> Board {
        let mut next = stored.clone();
        for patch in self.patches() {
            match patch {
                FieldPatch::Name(value) => next.name = value,
                FieldPatch::Status(value) => next.status = value,
                FieldPatch::Phases(value) => next.phases = value,
                FieldPatch::Blocks(value) => next.blocks = value,
                FieldPatch::Collaborators(value) => next.collaborators = value,
            }
        }
        next
    }

    /// True when the two fragments touch no common top-level field.
    #[must_use]
    pub fn disjoint_with(&self, other: &Self) -> bool {
        let mine: Vec<BoardField> = self.patches().iter().map(FieldPatch::field).collect();
        other
            .patches()
            .iter()
            .all(|p| !mine.contains(&p.field()))
    }
}
