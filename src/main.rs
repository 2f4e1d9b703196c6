//! Scoreboard backend binary entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scoreboard_back::{
    config::AppConfig,
    dao::score_store::ScoreStore,
    routes,
    services::{bootstrap, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    info!(title = config.title(), "booting scoreboard backend");

    let app_state = AppState::new(config);
    spawn_store_supervisor(app_state.clone())?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    // Explicit teardown: end every live viewer stream before the process exits.
    app_state.viewers().shutdown();
    info!("viewer registry drained; shutdown complete");

    Ok(())
}

/// Launch the storage supervisor for the backend selected via
/// `SCOREBOARD_STORE` (`mongo`, `couch`, or `memory`).
fn spawn_store_supervisor(state: SharedState) -> anyhow::Result<()> {
    let backend =
        env::var("SCOREBOARD_STORE").unwrap_or_else(|_| default_store_backend().to_owned());

    match backend.as_str() {
        #[cfg(feature = "mongo-store")]
        "mongo" => spawn_mongo_supervisor(state),
        #[cfg(feature = "couch-store")]
        "couch" => spawn_couch_supervisor(state),
        "memory" => spawn_memory_supervisor(state),
        other => anyhow::bail!("unknown or disabled store backend `{other}`"),
    }

    Ok(())
}

const fn default_store_backend() -> &'static str {
    if cfg!(feature = "mongo-store") {
        "mongo"
    } else if cfg!(feature = "couch-store") {
        "couch"
    } else {
        "memory"
    }
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: SharedState) {
    use scoreboard_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};

    let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let db = env::var("MONGO_DB").ok();
    let config = state.config().clone();

    tokio::spawn(storage_supervisor::run(state, move || {
        let uri = uri.clone();
        let db = db.clone();
        let config = config.clone();
        async move {
            let mongo_config = MongoConfig::from_uri(&uri, db.as_deref()).await?;
            let store: Arc<dyn ScoreStore> = Arc::new(MongoScoreStore::connect(mongo_config).await?);
            bootstrap::ensure_seed_data(&store, &config).await?;
            Ok(store)
        }
    }));
}

#[cfg(feature = "couch-store")]
fn spawn_couch_supervisor(state: SharedState) {
    use scoreboard_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};

    let config = state.config().clone();

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            let couch_config = CouchConfig::from_env()?;
            let store: Arc<dyn ScoreStore> = Arc::new(CouchScoreStore::connect(couch_config).await?);
            bootstrap::ensure_seed_data(&store, &config).await?;
            Ok(store)
        }
    }));
}

/// Volatile backend for demos and local development: every restart starts
/// from an empty board.
fn spawn_memory_supervisor(state: SharedState) {
    use scoreboard_back::dao::score_store::memory::MemoryScoreStore;

    let config = state.config().clone();

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            let store: Arc<dyn ScoreStore> = Arc::new(MemoryScoreStore::new());
            bootstrap::ensure_seed_data(&store, &config).await?;
            Ok(store)
        }
    }));
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
