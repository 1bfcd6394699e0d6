// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const ID_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
        }
    }
}

impl std::error::Error for ParseError {}

fn check_id(kind: &'static str, input: &str) -> Result<(), ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty(kind));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed(kind));
    }
    if input.len() > ID_MAX_LEN {
        return Err(ParseError::TooLong(kind, ID_MAX_LEN));
    }
    Ok(())
}

macro_rules! entity_id {
    ($name:ident, $kind:literal, $parse_fn:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(input: &str) -> Result<Self, ParseError> {
                check_id($kind, input)?;
                Ok(Self(input.to_string()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Serde-transparent deserialization bypasses `parse`; validation
            /// re-checks shape on whole documents instead.
            #[must_use]
            pub fn is_well_formed(&self) -> bool {
                check_id($kind, &self.0).is_ok()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        pub fn $parse_fn(input: &str) -> Result<$name, ParseError> {
            $name::parse(input)
        }
    };
}

entity_id!(BoardId, "board_id", parse_board_id);
entity_id!(PhaseId, "phase_id", parse_phase_id);
entity_id!(ColumnId, "column_id", parse_column_id);
entity_id!(BlockId, "block_id", parse_block_id);
entity_id!(CommentId, "comment_id", parse_comment_id);
entity_id!(UserId, "user_id", parse_user_id);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_empty_and_padded_ids() {
        assert_eq!(BoardId::parse(""), Err(ParseError::Empty("board_id")));
        assert_eq!(ColumnId::parse(" c1"), Err(ParseError::Trimmed("column_id")));
        let long = "x".repeat(ID_MAX_LEN + 1);
        assert_eq!(
            UserId::parse(&long),
            Err(ParseError::TooLong("user_id", ID_MAX_LEN))
        );
    }

    #[test]
    fn parse_accepts_client_generated_ids() {
        let id = parse_block_id("blk-6f1a2b").expect("block id");
        assert_eq!(id.as_str(), "blk-6f1a2b");
        assert!(id.is_well_formed());
    }
}
