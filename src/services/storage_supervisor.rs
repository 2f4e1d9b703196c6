//! Keeps the score store connected, toggling degraded mode while it is not.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state out of degraded
/// mode for as long as the connection stays healthy. Never returns; every
/// abandoned connection leads back to a full reconnect cycle.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => {
                delay = INITIAL_DELAY;
                store
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        state.install_score_store(store.clone()).await;
        info!("storage connection established; leaving degraded mode");

        watch_connection(&state, &store).await;

        state.clear_score_store().await;
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the store until its health fails and a bounded reconnect series
/// cannot bring it back. Requests keep failing fast while the state is in
/// degraded mode between those two moments.
async fn watch_connection(state: &SharedState, store: &Arc<dyn ScoreStore>) {
    loop {
        sleep(HEALTH_POLL_INTERVAL).await;

        if store.health_check().await.is_ok() {
            continue;
        }

        warn!("storage health check failed; entering degraded mode");
        state.clear_score_store().await;

        if reconnect_with_backoff(store).await {
            state.install_score_store(store.clone()).await;
            info!("storage reconnected; leaving degraded mode");
        } else {
            warn!("exhausted storage reconnect attempts; abandoning connection");
            return;
        }
    }
}

async fn reconnect_with_backoff(store: &Arc<dyn ScoreStore>) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
