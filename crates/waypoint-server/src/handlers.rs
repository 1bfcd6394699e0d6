// SPDX-License-Identifier: Apache-2.0

use crate::etag::board_etag;
use crate::middleware::RequestId;
use crate::principal::principal_from_headers;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use waypoint_api::{
    api_error_from_update, ApiError, ApiErrorCode, CommentRequest, StoryboardRequest,
    StoryboardResponse,
};
use waypoint_engine::{append_comment, apply_patch, set_storyboard, NewComment};
use waypoint_model::{
    validate_board, Board, BoardFragment, BoardId, BlockId, ColumnId, CommentId,
};

fn api_error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err }))).into_response()
}

fn store_error_response(reason: &str, request_id: &str) -> Response {
    api_error_response(ApiError::new(
        ApiErrorCode::Internal,
        "persistence failure",
        json!({ "reason": reason }),
        request_id,
    ))
}

fn json_rejection_response(rejection: &JsonRejection, request_id: &str) -> Response {
    match rejection {
        JsonRejection::JsonDataError(err) => api_error_response(ApiError::new(
            ApiErrorCode::ValidationFailed,
            "body does not match the expected shape",
            json!({ "reason": err.to_string() }),
            request_id,
        )),
        other => api_error_response(ApiError::malformed_body(&other.to_string(), request_id)),
    }
}

fn parse_board_id_or_404(raw: &str, request_id: &str) -> Result<BoardId, Response> {
    BoardId::parse(raw)
        .map_err(|_| api_error_response(ApiError::not_found("board", raw, request_id)))
}

pub(crate) async fn healthz_handler() -> &'static str {
    "ok"
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    match state.store.list_summaries().await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(err) => {
            tracing::warn!(error = %err, backend = state.store.backend_tag(), "readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "store unreachable").into_response()
        }
    }
}

pub(crate) async fn version_handler() -> Response {
    Json(json!({
        "name": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render().await
}

pub(crate) async fn list_boards_handler(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Response {
    match state.store.list_summaries().await {
        Ok(boards) => Json(json!({ "boards": boards })).into_response(),
        Err(err) => store_error_response(&err.0, &request_id),
    }
}

/// `GET /api/boards/{id}`: canonical Board, with a strong ETag so the read
/// path can short-circuit unchanged documents.
pub(crate) async fn get_board_handler(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    let id = match parse_board_id_or_404(&board_id, &request_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let board = match state.store.fetch(&id).await {
        Ok(Some(board)) => board,
        Ok(None) => {
            return api_error_response(ApiError::not_found("board", id.as_str(), &request_id))
        }
        Err(err) => return store_error_response(&err.0, &request_id),
    };
    let etag = match board_etag(&board) {
        Ok(etag) => etag,
        Err(err) => {
            return api_error_response(ApiError::new(
                ApiErrorCode::Internal,
                "canonical encoding failed",
                json!({ "reason": err.to_string() }),
                &request_id,
            ))
        }
    };
    let if_none_match = headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut response = if if_none_match.as_deref() == Some(etag.as_str()) {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (StatusCode::OK, Json(board)).into_response()
    };
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert("etag", value);
    }
    response
}

/// `PUT /api/boards/{id}`: create or wholesale-replace. Ownership and
/// `createdAt` are pinned server-side: a replace keeps the stored owner, a
/// create assigns the caller.
pub(crate) async fn put_board_handler(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<Board>, JsonRejection>,
) -> Response {
    let Some(principal) = principal_from_headers(&headers) else {
        return api_error_response(ApiError::missing_principal(&request_id));
    };
    let mut board = match body {
        Ok(Json(board)) => board,
        Err(rejection) => return json_rejection_response(&rejection, &request_id),
    };
    let id = match parse_board_id_or_404(&board_id, &request_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if board.id != id {
        return api_error_response(ApiError::new(
            ApiErrorCode::ValidationFailed,
            "body id does not match the target board",
            json!({ "path": "id", "expected": id.as_str(), "got": board.id.as_str() }),
            &request_id,
        ));
    }
    let now = state.clock.now_millis();
    match state.store.fetch(&id).await {
        Ok(Some(stored)) => {
            if !stored.can_mutate(&principal.user_id) {
                return api_error_response(ApiError::unauthorized(&request_id));
            }
            board.owner = stored.owner;
            board.created_at = stored.created_at;
        }
        Ok(None) => {
            board.owner = principal.user_id.clone();
            board.created_at = now;
        }
        Err(err) => return store_error_response(&err.0, &request_id),
    }
    board.updated_at = now;
    if let Err(err) = validate_board(&board) {
        return api_error_response(ApiError::new(
            ApiErrorCode::ValidationFailed,
            err.to_string(),
            json!({ "path": err.path, "expected": err.expected }),
            &request_id,
        ));
    }
    if let Err(err) = state.store.persist(&board).await {
        return store_error_response(&err.0, &request_id);
    }
    tracing::info!(board = %board.id, actor = %principal.user_id, "board persisted");
    (StatusCode::OK, Json(board)).into_response()
}

/// `PATCH /api/boards/{id}`: field-level replace merge of a partial Board.
pub(crate) async fn patch_board_handler(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<BoardFragment>, JsonRejection>,
) -> Response {
    let Some(principal) = principal_from_headers(&headers) else {
        return api_error_response(ApiError::missing_principal(&request_id));
    };
    let fragment = match body {
        Ok(Json(fragment)) => fragment,
        Err(rejection) => return json_rejection_response(&rejection, &request_id),
    };
    let id = match parse_board_id_or_404(&board_id, &request_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let clock = state.clock.clone();
    let actor = principal.user_id.clone();
    let result = state
        .store
        .update(&id, &|stored| {
            apply_patch(stored, &fragment, &actor, clock.as_ref())
        })
        .await;
    match result {
        Ok(board) => {
            tracing::info!(board = %board.id, actor = %actor, "patch merged");
            (StatusCode::OK, Json(board)).into_response()
        }
        Err(err) => api_error_response(api_error_from_update(&err, &request_id)),
    }
}

/// `POST /api/boards/{id}/blocks/{blockId}/comments`: append one comment
/// and return the whole canonical Board.
pub(crate) async fn post_comment_handler(
    State(state): State<AppState>,
    Path((board_id, block_id)): Path<(String, String)>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Response {
    let Some(principal) = principal_from_headers(&headers) else {
        return api_error_response(ApiError::missing_principal(&request_id));
    };
    let comment = match body {
        Ok(Json(comment)) => comment,
        Err(rejection) => return json_rejection_response(&rejection, &request_id),
    };
    let id = match parse_board_id_or_404(&board_id, &request_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let block = match BlockId::parse(&block_id) {
        Ok(block) => block,
        Err(_) => {
            return api_error_response(ApiError::not_found("block", &block_id, &request_id))
        }
    };
    let comment_id = match CommentId::parse(&format!("cmt-{}", uuid::Uuid::new_v4())) {
        Ok(comment_id) => comment_id,
        Err(err) => {
            return api_error_response(ApiError::new(
                ApiErrorCode::Internal,
                "comment id generation failed",
                json!({ "reason": err.to_string() }),
                &request_id,
            ))
        }
    };
    let clock = state.clock.clone();
    let actor = principal.user_id.clone();
    let result = state
        .store
        .update(&id, &|stored| {
            append_comment(
                stored,
                &block,
                NewComment {
                    id: comment_id.clone(),
                    content: comment.content.clone(),
                    user_id: comment.user_id.clone(),
                    author_name: comment.author_name.clone(),
                },
                &actor,
                clock.as_ref(),
            )
        })
        .await;
    match result {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => api_error_response(api_error_from_update(&err, &request_id)),
    }
}

/// `POST /api/boards/{id}/columns/{columnId}/generate-storyboard`: invoke
/// the provider, then patch the column's storyboard pair. A null prompt
/// detaches without touching the provider.
pub(crate) async fn generate_storyboard_handler(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(String, String)>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<StoryboardRequest>, JsonRejection>,
) -> Response {
    let Some(principal) = principal_from_headers(&headers) else {
        return api_error_response(ApiError::missing_principal(&request_id));
    };
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return json_rejection_response(&rejection, &request_id),
    };
    let id = match parse_board_id_or_404(&board_id, &request_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let column = match ColumnId::parse(&column_id) {
        Ok(column) => column,
        Err(_) => {
            return api_error_response(ApiError::not_found("column", &column_id, &request_id))
        }
    };
    // Resolve the column before paying for a provider round-trip.
    match state.store.fetch(&id).await {
        Ok(Some(board)) => {
            if board.find_column(&column).is_none() {
                return api_error_response(ApiError::not_found(
                    "column",
                    column.as_str(),
                    &request_id,
                ));
            }
        }
        Ok(None) => {
            return api_error_response(ApiError::not_found("board", id.as_str(), &request_id))
        }
        Err(err) => return store_error_response(&err.0, &request_id),
    }
    let storyboard = match &request.prompt {
        Some(prompt) => match state.generator.generate(prompt).await {
            Ok(url) => Some((prompt.clone(), url)),
            Err(err) => {
                tracing::warn!(column = %column, error = %err, "storyboard provider failed");
                return api_error_response(ApiError::generation_failed(&err.0, &request_id));
            }
        },
        None => None,
    };
    let clock = state.clock.clone();
    let actor = principal.user_id.clone();
    let pair = storyboard.clone();
    let result = state
        .store
        .update(&id, &|stored| {
            set_storyboard(stored, &column, pair.clone(), &actor, clock.as_ref())
        })
        .await;
    match result {
        Ok(board) => {
            let (prompt, image_url) = match storyboard {
                Some((prompt, url)) => (Some(prompt), Some(url)),
                None => (None, None),
            };
            Json(StoryboardResponse {
                column_id: column,
                image_url,
                prompt,
                board,
            })
            .into_response()
        }
        Err(err) => api_error_response(api_error_from_update(&err, &request_id)),
    }
}
