//! Idempotent provisioning of the configured rounds and teams.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::{RoundEntity, TeamEntity},
        score_store::ScoreStore,
        storage::StorageError,
    },
};

/// Seed the store with any configured round or team name it does not hold
/// yet. Safe to run on every (re)connect; existing entities are untouched.
pub async fn ensure_seed_data(
    store: &Arc<dyn ScoreStore>,
    config: &AppConfig,
) -> Result<(), StorageError> {
    let rounds = config
        .round_names()
        .iter()
        .enumerate()
        .map(|(position, name)| RoundEntity {
            id: Uuid::new_v4(),
            name: name.clone(),
            position: position as u32,
        })
        .collect();

    let teams = config
        .team_names()
        .iter()
        .map(|name| TeamEntity {
            id: Uuid::new_v4(),
            name: name.clone(),
            hidden: false,
        })
        .collect();

    let outcome = store.seed_event(rounds, teams).await?;
    if outcome.rounds_added > 0 || outcome.teams_added > 0 {
        info!(
            rounds = outcome.rounds_added,
            teams = outcome.teams_added,
            "seeded event entities from config"
        );
    }

    Ok(())
}
