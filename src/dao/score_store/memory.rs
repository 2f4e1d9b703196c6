//! In-process [`ScoreStore`] backend. Backs the integration tests and makes
//! it possible to run the server without a database at hand.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::{
    models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
    score_store::{ScoreStore, SeedOutcome},
    storage::StorageResult,
};

/// Store keeping every entity in maps guarded by a single mutex.
///
/// The score map is keyed by `(team_id, round_id)`, which is what enforces
/// the one-score-per-pair invariant for this backend.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    rounds: IndexMap<Uuid, RoundEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    scores: IndexMap<(Uuid, Uuid), ScoreEntity>,
    points: IndexMap<Uuid, PointEntity>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock means a panic mid-mutation; tests should see it.
        self.inner.lock().expect("memory store lock poisoned")
    }
}

impl ScoreStore for MemoryScoreStore {
    fn seed_event(
        &self,
        rounds: Vec<RoundEntity>,
        teams: Vec<TeamEntity>,
    ) -> BoxFuture<'static, StorageResult<SeedOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let mut state = store.lock();
            let mut outcome = SeedOutcome::default();

            for round in rounds {
                if state.rounds.values().all(|known| known.name != round.name) {
                    state.rounds.insert(round.id, round);
                    outcome.rounds_added += 1;
                }
            }
            for team in teams {
                if state.teams.values().all(|known| known.name != team.name) {
                    state.teams.insert(team.id, team);
                    outcome.teams_added += 1;
                }
            }

            Ok(outcome)
        })
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().rounds.values().cloned().collect()) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().teams.values().cloned().collect()) })
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().scores.values().cloned().collect()) })
    }

    fn list_points(&self) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().points.values().cloned().collect()) })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().rounds.get(&id).cloned()) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().teams.get(&id).cloned()) })
    }

    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let state = store.lock();
            Ok(state.scores.values().find(|score| score.id == id).cloned())
        })
    }

    fn find_or_create_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut state = store.lock();
            let score = state
                .scores
                .entry((team_id, round_id))
                .or_insert_with(|| ScoreEntity {
                    id: Uuid::new_v4(),
                    team_id,
                    round_id,
                });
            Ok(score.clone())
        })
    }

    fn insert_point(&self, point: PointEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().points.insert(point.id, point);
            Ok(())
        })
    }

    fn update_point_count(
        &self,
        point_id: Uuid,
        count: i32,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut state = store.lock();
            Ok(state.points.get_mut(&point_id).map(|point| {
                point.count = count;
                point.clone()
            }))
        })
    }

    fn delete_point(
        &self,
        point_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().points.shift_remove(&point_id)) })
    }

    fn points_for_score(
        &self,
        score_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let state = store.lock();
            Ok(state
                .points
                .values()
                .filter(|point| point.score_id == score_id)
                .cloned()
                .collect())
        })
    }

    fn set_team_visibility(
        &self,
        flags: Vec<(Uuid, bool)>,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut state = store.lock();
            for (id, hidden) in flags {
                if let Some(team) = state.teams.get_mut(&id) {
                    team.hidden = hidden;
                }
            }
            Ok(state.teams.values().cloned().collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn point(score_id: Uuid, count: i32) -> PointEntity {
        PointEntity {
            id: Uuid::new_v4(),
            score_id,
            count,
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn find_or_create_returns_same_score_for_pair() {
        let store = MemoryScoreStore::new();
        let team = Uuid::new_v4();
        let round = Uuid::new_v4();

        let first = store.find_or_create_score(team, round).await.unwrap();
        let second = store.find_or_create_score(team, round).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_scores().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_last_point_keeps_score() {
        let store = MemoryScoreStore::new();
        let score = store
            .find_or_create_score(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        let entry = point(score.id, 3);
        store.insert_point(entry.clone()).await.unwrap();
        let removed = store.delete_point(entry.id).await.unwrap();

        assert_eq!(removed, Some(entry));
        assert_eq!(store.list_scores().await.unwrap().len(), 1);
        assert!(store.points_for_score(score.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeding_is_idempotent_by_name() {
        let store = MemoryScoreStore::new();
        let rounds = vec![RoundEntity {
            id: Uuid::new_v4(),
            name: "Round 1".into(),
            position: 0,
        }];
        let teams = vec![TeamEntity {
            id: Uuid::new_v4(),
            name: "Blue".into(),
            hidden: false,
        }];

        let first = store
            .seed_event(rounds.clone(), teams.clone())
            .await
            .unwrap();
        assert_eq!(first.rounds_added, 1);
        assert_eq!(first.teams_added, 1);

        // Same names, fresh ids: nothing new gets created.
        let again = store
            .seed_event(
                vec![RoundEntity {
                    id: Uuid::new_v4(),
                    name: "Round 1".into(),
                    position: 0,
                }],
                vec![TeamEntity {
                    id: Uuid::new_v4(),
                    name: "Blue".into(),
                    hidden: false,
                }],
            )
            .await
            .unwrap();
        assert_eq!(again, SeedOutcome::default());
        assert_eq!(store.list_rounds().await.unwrap(), rounds);
        assert_eq!(store.list_teams().await.unwrap(), teams);
    }
}
