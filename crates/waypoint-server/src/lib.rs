#![forbid(unsafe_code)]
//! HTTP surface of the board service.
//!
//! Stateless request handlers over the merge engine: read a board, apply a
//! partial patch, append a comment, attach/detach a storyboard. No lock is
//! held across a request; atomicity of read-apply-write lives in the store.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex;
use waypoint_engine::{BoardStore, Clock, SystemClock};

mod config;
mod etag;
mod generator;
mod handlers;
mod middleware;
mod principal;

pub use config::ApiConfig;
pub use generator::{FakeGenerator, GenerationError, HttpGenerator, StoryboardGenerator};
pub use principal::Principal;

pub const CRATE_NAME: &str = "waypoint-server";

/// Per-route/status request counters, rendered by `GET /metrics`.
#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: u16) {
        let mut counts = self.counts.lock().await;
        *counts.entry((route.to_string(), status)).or_insert(0) += 1;
    }

    pub(crate) async fn render(&self) -> String {
        let counts = self.counts.lock().await;
        let mut lines: Vec<String> = counts
            .iter()
            .map(|((route, status), n)| {
                format!("waypoint_requests_total{{route=\"{route}\",status=\"{status}\"}} {n}")
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub generator: Arc<dyn StoryboardGenerator>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<RequestMetrics>,
    pub api: ApiConfig,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn BoardStore>, generator: Arc<dyn StoryboardGenerator>) -> Self {
        Self::with_config(store, generator, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn BoardStore>,
        generator: Arc<dyn StoryboardGenerator>,
        api: ApiConfig,
    ) -> Self {
        Self {
            store,
            generator,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(RequestMetrics::default()),
            api,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz_handler))
        .route("/readyz", get(handlers::readyz_handler))
        .route("/version", get(handlers::version_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/boards", get(handlers::list_boards_handler))
        .route(
            "/api/boards/:board_id",
            get(handlers::get_board_handler)
                .put(handlers::put_board_handler)
                .patch(handlers::patch_board_handler),
        )
        .route(
            "/api/boards/:board_id/blocks/:block_id/comments",
            post(handlers::post_comment_handler),
        )
        .route(
            "/api/boards/:board_id/columns/:column_id/generate-storyboard",
            post(handlers::generate_storyboard_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
