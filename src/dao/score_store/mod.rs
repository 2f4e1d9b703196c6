//! Abstraction over the persistence layer for rounds, teams, scores, and
//! point entries, together with its backends.

#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity};
use crate::dao::storage::StorageResult;

/// How many rounds and teams a seeding pass actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Rounds created because no round with the same name existed yet.
    pub rounds_added: usize,
    /// Teams created because no team with the same name existed yet.
    pub teams_added: usize,
}

/// Persistence gateway for the scoreboard.
///
/// Backends must uphold the score uniqueness invariant: at most one score
/// per (team, round) pair, even when two callers race through
/// [`find_or_create_score`](ScoreStore::find_or_create_score).
pub trait ScoreStore: Send + Sync {
    /// Idempotently create the given rounds and teams, skipping any whose
    /// name is already present. Existing entities are never renamed,
    /// repositioned, or deleted.
    fn seed_event(
        &self,
        rounds: Vec<RoundEntity>,
        teams: Vec<TeamEntity>,
    ) -> BoxFuture<'static, StorageResult<SeedOutcome>>;

    /// All rounds, in no particular order.
    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>>;
    /// All teams, hidden ones included, in no particular order.
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// All score aggregates, in no particular order.
    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// All point entries, in no particular order.
    fn list_points(&self) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>>;

    /// Look up a single round.
    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    /// Look up a single team.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Look up a single score aggregate.
    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;

    /// Return the score for the (team, round) pair, creating it when the
    /// pair has never been scored before.
    fn find_or_create_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>>;

    /// Persist a new point entry.
    fn insert_point(&self, point: PointEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite the count of an existing point, returning the updated
    /// entry or `None` when the id is unknown.
    fn update_point_count(
        &self,
        point_id: Uuid,
        count: i32,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>>;
    /// Remove a point entry, returning the removed entry or `None` when the
    /// id is unknown. The owning score stays in place.
    fn delete_point(
        &self,
        point_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>>;
    /// Point entries owned by one score aggregate.
    fn points_for_score(
        &self,
        score_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>>;

    /// Bulk-apply hidden flags and return the full updated team list.
    /// Unknown team ids are skipped; callers validate references first.
    fn set_team_visibility(
        &self,
        flags: Vec<(Uuid, bool)>,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
