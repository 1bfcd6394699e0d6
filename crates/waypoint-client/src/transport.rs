// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::fmt;
use waypoint_api::{ApiError, CommentRequest, ErrorEnvelope, StoryboardRequest, StoryboardResponse};
use waypoint_model::{BlockId, Board, BoardFragment, BoardId, ColumnId};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TransportError {
    /// The server answered with an error envelope.
    Api { status: u16, error: ApiError },
    /// The request never produced a usable response.
    Network(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { status, error } => write!(f, "server rejected request ({status}): {error}"),
            Self::Network(reason) => write!(f, "network failure: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// The board service's wire operations, abstracted so tests can run
/// without a server.
#[async_trait]
pub trait BoardTransport: Send + Sync + 'static {
    async fn fetch_board(&self, id: &BoardId) -> Result<Board, TransportError>;

    async fn put_board(&self, board: &Board) -> Result<Board, TransportError>;

    async fn patch_board(
        &self,
        id: &BoardId,
        fragment: &BoardFragment,
    ) -> Result<Board, TransportError>;

    async fn post_comment(
        &self,
        id: &BoardId,
        block: &BlockId,
        comment: &CommentRequest,
    ) -> Result<Board, TransportError>;

    async fn generate_storyboard(
        &self,
        id: &BoardId,
        column: &ColumnId,
        request: &StoryboardRequest,
    ) -> Result<StoryboardResponse, TransportError>;
}

/// reqwest-backed transport. The identity pair rides on every request as
/// the pre-validated principal headers.
pub struct HttpTransport {
    base_url: String,
    user_id: String,
    user_name: String,
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            response
                .json::<T>()
                .await
                .map_err(|e| TransportError::Network(format!("response decode: {e}")))
        } else {
            let envelope = response
                .json::<ErrorEnvelope>()
                .await
                .map_err(|e| TransportError::Network(format!("error decode: {e}")))?;
            Err(TransportError::Api {
                status,
                error: envelope.error,
            })
        }
    }

    fn with_identity(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-user-id", &self.user_id)
            .header("x-user-name", &self.user_name)
    }
}

#[async_trait]
impl BoardTransport for HttpTransport {
    async fn fetch_board(&self, id: &BoardId) -> Result<Board, TransportError> {
        let response = self
            .client
            .get(self.url(&format!("/api/boards/{id}")))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn put_board(&self, board: &Board) -> Result<Board, TransportError> {
        let response = self
            .with_identity(
                self.client
                    .put(self.url(&format!("/api/boards/{}", board.id))),
            )
            .json(board)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn patch_board(
        &self,
        id: &BoardId,
        fragment: &BoardFragment,
    ) -> Result<Board, TransportError> {
        let response = self
            .with_identity(self.client.patch(self.url(&format!("/api/boards/{id}"))))
            .json(fragment)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_comment(
        &self,
        id: &BoardId,
        block: &BlockId,
        comment: &CommentRequest,
    ) -> Result<Board, TransportError> {
        let response = self
            .with_identity(
                self.client
                    .post(self.url(&format!("/api/boards/{id}/blocks/{block}/comments"))),
            )
            .json(comment)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn generate_storyboard(
        &self,
        id: &BoardId,
        column: &ColumnId,
        request: &StoryboardRequest,
    ) -> Result<StoryboardResponse, TransportError> {
        let response = self
            .with_identity(self.client.post(self.url(&format!(
                "/api/boards/{id}/columns/{column}/generate-storyboard"
            ))))
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}
