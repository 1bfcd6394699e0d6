#![forbid(unsafe_code)]
//! Wire contract shared by the server and the mutation client: request and
//! response DTOs, the error envelope, and the mapping from engine errors to
//! HTTP status + machine-readable code.

mod dto;
mod errors;

pub use dto::{CommentRequest, StoryboardRequest, StoryboardResponse};
pub use errors::{api_error_from_update, ApiError, ApiErrorCode, ErrorEnvelope};

pub const CRATE_NAME: &str = "waypoint-api";
