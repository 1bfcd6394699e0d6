#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waypoint_engine::{BoardStore, MemoryStore, SqliteStore};
use waypoint_server::{
    build_router, ApiConfig, AppState, FakeGenerator, HttpGenerator, StoryboardGenerator,
};

fn env_str(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WAYPOINT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = env::var("WAYPOINT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let api = ApiConfig {
        bind_addr: env_str("WAYPOINT_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        max_body_bytes: env_usize("WAYPOINT_MAX_BODY_BYTES", 1024 * 1024),
        generator_url: env_str("WAYPOINT_GENERATOR_URL"),
        generator_timeout: Duration::from_millis(env_u64("WAYPOINT_GENERATOR_TIMEOUT_MS", 30_000)),
    };

    let store: Arc<dyn BoardStore> = match env_str("WAYPOINT_DB") {
        Some(path) => match SqliteStore::open(&PathBuf::from(&path)) {
            Ok(store) => {
                info!(path = %path, "sqlite board store opened");
                Arc::new(store)
            }
            Err(err) => {
                error!(path = %path, error = %err, "failed to open sqlite store");
                std::process::exit(1);
            }
        },
        None => {
            info!("no WAYPOINT_DB set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let generator: Arc<dyn StoryboardGenerator> = match &api.generator_url {
        Some(url) => match HttpGenerator::new(url.clone(), api.generator_timeout) {
            Ok(generator) => {
                info!(endpoint = %url, "storyboard provider configured");
                Arc::new(generator)
            }
            Err(err) => {
                error!(error = %err, "failed to build storyboard provider client");
                std::process::exit(1);
            }
        },
        None => {
            info!("no WAYPOINT_GENERATOR_URL set, using fake storyboard generator");
            Arc::new(FakeGenerator::default())
        }
    };

    let bind_addr = api.bind_addr.clone();
    let state = AppState::with_config(store, generator, api);
    let router = build_router(state);

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %bind_addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(addr = %bind_addr, "waypoint server listening");
    if let Err(err) = axum::serve(listener, router).await {
        error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}
