#![forbid(unsafe_code)]
//! Board model SSOT.
//!
//! Every shape that crosses the wire lives here: the Board document tree,
//! the partial-update `BoardFragment`, and the validation rules both sides
//! of the sync protocol run.

mod board;
mod fragment;
mod ids;
mod validate;

pub use board::{Block, Board, BoardStatus, BoardSummary, Column, Comment, Phase};
pub use fragment::{BoardField, BoardFragment, FieldPatch};
pub use ids::{
    parse_block_id, parse_board_id, parse_column_id, parse_comment_id, parse_phase_id,
    parse_user_id, BlockId, BoardId, ColumnId, CommentId, ParseError, PhaseId, UserId, ID_MAX_LEN,
};
pub use validate::{validate_board, validate_fragment, ValidationError};

pub const CRATE_NAME: &str = "waypoint-model";
