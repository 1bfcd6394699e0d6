// SPDX-License-Identifier: Apache-2.0

//! Structural validation of Boards and fragments.
//!
//! Runs identically on both sides: best-effort pre-submit on the client,
//! authoritative and blocking on the server. Enum membership of `status` is
//! already enforced at the serde boundary; the checks here cover what serde
//! cannot see: referential integrity, id uniqueness, and the storyboard
//! pair invariant.

use crate::board::{Block, Board, Phase};
use crate::fragment::BoardFragment;
use crate::ids::UserId;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON-pointer-ish path to the offending field, e.g. `blocks[2].columnId`.
    pub path: String,
    /// Human-readable description of the expected shape.
    pub expected: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: expected {}", self.path, self.expected)
    }
}

impl std::error::Error for ValidationError {}

/// Authoritative whole-document validation. The merge engine runs this on
/// the merged candidate so a patch can never commit a corrupt Board.
pub fn validate_board(board: &Board) -> Result<(), ValidationError> {
    if !board.id.is_well_formed() {
        return Err(ValidationError::new("id", "a non-empty board id"));
    }
    if !board.owner.is_well_formed() {
        return Err(ValidationError::new("owner", "a non-empty user id"));
    }
    validate_collaborators(&board.collaborators)?;
    let column_ids = validate_phases(&board.phases, "phases")?;
    validate_blocks(&board.blocks, "blocks", Some(&column_ids))?;
    Ok(())
}

/// Best-effort standalone fragment validation: everything checkable without
/// the stored Board. Referential integrity of `columnId` against a patched
/// or stored phase tree is only decidable post-merge and is left to
/// [`validate_board`].
pub fn validate_fragment(fragment: &BoardFragment) -> Result<(), ValidationError> {
    if let Some(phases) = &fragment.phases {
        validate_phases(phases, "phases")?;
    }
    if let Some(blocks) = &fragment.blocks {
        validate_blocks(blocks, "blocks", None)?;
    }
    if let Some(collaborators) = &fragment.collaborators {
        validate_collaborators(collaborators)?;
    }
    Ok(())
}

fn validate_collaborators(collaborators: &[UserId]) -> Result<(), ValidationError> {
    for (i, user) in collaborators.iter().enumerate() {
        if !user.is_well_formed() {
            return Err(ValidationError::new(
                format!("collaborators[{i}]"),
                "a non-empty user id",
            ));
        }
    }
    Ok(())
}

/// Checks the phase tree and returns the set of column ids it contains.
fn validate_phases<'a>(
    phases: &'a [Phase],
    path: &str,
) -> Result<HashSet<&'a str>, ValidationError> {
    let mut phase_ids: HashSet<&str> = HashSet::new();
    let mut column_ids: HashSet<&str> = HashSet::new();
    for (i, phase) in phases.iter().enumerate() {
        if !phase.id.is_well_formed() {
            return Err(ValidationError::new(
                format!("{path}[{i}].id"),
                "a non-empty phase id",
            ));
        }
        if !phase_ids.insert(phase.id.as_str()) {
            return Err(ValidationError::new(
                format!("{path}[{i}].id"),
                format!("a phase id unique within the board (`{}` repeats)", phase.id),
            ));
        }
        for (j, column) in phase.columns.iter().enumerate() {
            let col_path = format!("{path}[{i}].columns[{j}]");
            if !column.id.is_well_formed() {
                return Err(ValidationError::new(
                    format!("{col_path}.id"),
                    "a non-empty column id",
                ));
            }
            if !column_ids.insert(column.id.as_str()) {
                return Err(ValidationError::new(
                    format!("{col_path}.id"),
                    format!(
                        "a column id unique across all phases (`{}` repeats)",
                        column.id
                    ),
                ));
            }
            // Storyboard url and prompt are set or cleared together.
            match (&column.storyboard_image_url, &column.storyboard_prompt) {
                (Some(_), None) => {
                    return Err(ValidationError::new(
                        format!("{col_path}.storyboardPrompt"),
                        "a prompt whenever storyboardImageUrl is set",
                    ));
                }
                (None, Some(_)) => {
                    return Err(ValidationError::new(
                        format!("{col_path}.storyboardImageUrl"),
                        "an image url whenever storyboardPrompt is set",
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(column_ids)
}

fn validate_blocks(
    blocks: &[Block],
    path: &str,
    column_ids: Option<&HashSet<&str>>,
) -> Result<(), ValidationError> {
    let mut block_ids: HashSet<&str> = HashSet::new();
    for (i, block) in blocks.iter().enumerate() {
        if !block.id.is_well_formed() {
            return Err(ValidationError::new(
                format!("{path}[{i}].id"),
                "a non-empty block id",
            ));
        }
        if !block_ids.insert(block.id.as_str()) {
            return Err(ValidationError::new(
                format!("{path}[{i}].id"),
                format!("a block id unique within the board (`{}` repeats)", block.id),
            ));
        }
        if !block.column_id.is_well_formed() {
            return Err(ValidationError::new(
                format!("{path}[{i}].columnId"),
                "a non-empty column id",
            ));
        }
        if let Some(ids) = column_ids {
            if !ids.contains(block.column_id.as_str()) {
                return Err(ValidationError::new(
                    format!("{path}[{i}].columnId"),
                    format!(
                        "a column id present in some phase (`{}` resolves to none)",
                        block.column_id
                    ),
                ));
            }
        }
        let mut comment_ids: HashSet<&str> = HashSet::new();
        for (j, comment) in block.comments.iter().enumerate() {
            let cpath = format!("{path}[{i}].comments[{j}]");
            if !comment.id.is_well_formed() {
                return Err(ValidationError::new(
                    format!("{cpath}.id"),
                    "a non-empty comment id",
                ));
            }
            if !comment_ids.insert(comment.id.as_str()) {
                return Err(ValidationError::new(
                    format!("{cpath}.id"),
                    format!(
                        "a comment id unique within the block (`{}` repeats)",
                        comment.id
                    ),
                ));
            }
            if !comment.user_id.is_well_formed() {
                return Err(ValidationError::new(
                    format!("{cpath}.userId"),
                    "a non-empty user id",
                ));
            }
        }
    }
    Ok(())
}
