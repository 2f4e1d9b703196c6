//! Shared application state handed to every route handler.

pub mod broadcast;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{config::AppConfig, dao::score_store::ScoreStore, error::ServiceError};

pub use self::broadcast::ViewerRegistry;

/// Cheaply clonable handle on the shared [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state: the installed score store, the viewer
/// registry, and the loaded configuration.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    viewers: ViewerRegistry,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a score store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            score_store: RwLock::new(None),
            viewers: ViewerRegistry::new(),
            config,
        })
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current score store or fail with a degraded-mode error.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a score store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        let mut guard = self.score_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        let mut guard = self.score_store.write().await;
        guard.take();
    }

    /// Whether the application currently runs without a storage backend.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.score_store.read().await;
        guard.is_none()
    }

    /// Registry of connected scoreboard viewers.
    pub fn viewers(&self) -> &ViewerRegistry {
        &self.viewers
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
