// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use waypoint_model::{BlockId, BoardId, ColumnId, UserId, ValidationError};

/// Failure of a single patch application, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeError {
    Validation(ValidationError),
    Forbidden { actor: UserId },
    BoardIdMismatch { expected: BoardId, got: BoardId },
    UnknownBlock(BlockId),
    UnknownColumn(ColumnId),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Forbidden { actor } => {
                write!(f, "user `{actor}` is neither owner nor collaborator")
            }
            Self::BoardIdMismatch { expected, got } => {
                write!(f, "fragment id `{got}` does not match target board `{expected}`")
            }
            Self::UnknownBlock(id) => write!(f, "no block `{id}` on this board"),
            Self::UnknownColumn(id) => write!(f, "no column `{id}` in any phase of this board"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for MergeError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Opaque persistence failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Outcome of an atomic read-modify-write against the store.
#[derive(Debug)]
pub enum UpdateError {
    NotFound(BoardId),
    Merge(MergeError),
    Store(StoreError),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "board `{id}` does not exist"),
            Self::Merge(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for UpdateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Merge(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<MergeError> for UpdateError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

impl From<StoreError> for UpdateError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
