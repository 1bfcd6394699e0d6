// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use waypoint_engine::{MergeError, UpdateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    ValidationFailed,
    NotFound,
    Unauthorized,
    GenerationFailed,
    MalformedBody,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ValidationFailed => 422,
            Self::NotFound => 404,
            Self::Unauthorized => 401,
            Self::GenerationFailed => 502,
            Self::MalformedBody => 400,
            Self::Internal => 500,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "validation_failed",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::GenerationFailed => "generation_failed",
            Self::MalformedBody => "malformed_body",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(default)]
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: &str, id: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({ "id": id }),
            request_id,
        )
    }

    #[must_use]
    pub fn unauthorized(request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            "actor is not allowed to mutate this board",
            Value::Null,
            request_id,
        )
    }

    #[must_use]
    pub fn missing_principal(request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            "request carries no principal",
            json!({ "expected_headers": ["x-user-id", "x-user-name"] }),
            request_id,
        )
    }

    #[must_use]
    pub fn malformed_body(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::MalformedBody,
            "request body does not parse",
            json!({ "reason": reason }),
            request_id,
        )
    }

    #[must_use]
    pub fn generation_failed(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::GenerationFailed,
            "storyboard provider failed",
            json!({ "reason": reason }),
            request_id,
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Every error response is `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

/// Maps an engine update failure onto the wire taxonomy.
#[must_use]
pub fn api_error_from_update(err: &UpdateError, request_id: &str) -> ApiError {
    match err {
        UpdateError::NotFound(id) => ApiError::not_found("board", id.as_str(), request_id),
        UpdateError::Merge(merge) => match merge {
            MergeError::Validation(v) => ApiError::new(
                ApiErrorCode::ValidationFailed,
                v.to_string(),
                json!({ "path": v.path, "expected": v.expected }),
                request_id,
            ),
            MergeError::Forbidden { .. } => ApiError::unauthorized(request_id),
            MergeError::BoardIdMismatch { expected, got } => ApiError::new(
                ApiErrorCode::ValidationFailed,
                merge.to_string(),
                json!({ "path": "id", "expected": expected.as_str(), "got": got.as_str() }),
                request_id,
            ),
            MergeError::UnknownBlock(id) => ApiError::not_found("block", id.as_str(), request_id),
            MergeError::UnknownColumn(id) => {
                ApiError::not_found("column", id.as_str(), request_id)
            }
        },
        UpdateError::Store(store) => ApiError::new(
            ApiErrorCode::Internal,
            "persistence failure",
            json!({ "reason": store.0 }),
            request_id,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_model::{parse_board_id, ValidationError};

    #[test]
    fn envelope_round_trips() {
        let err = ApiError::not_found("board", "B1", "req-1");
        let wire = serde_json::to_string(&ErrorEnvelope { error: err.clone() }).expect("encode");
        let back: ErrorEnvelope = serde_json::from_str(&wire).expect("decode");
        assert_eq!(back.error, err);
    }

    #[test]
    fn validation_maps_to_422_with_field_path() {
        let update = UpdateError::Merge(MergeError::Validation(ValidationError::new(
            "blocks[0].columnId",
            "a column id present in some phase",
        )));
        let api = api_error_from_update(&update, "req-2");
        assert_eq!(api.code, ApiErrorCode::ValidationFailed);
        assert_eq!(api.code.http_status(), 422);
        assert_eq!(api.details["path"], "blocks[0].columnId");
    }

    #[test]
    fn not_found_maps_to_404() {
        let update = UpdateError::NotFound(parse_board_id("B9").expect("id"));
        let api = api_error_from_update(&update, "req-3");
        assert_eq!(api.code.http_status(), 404);
    }
}
