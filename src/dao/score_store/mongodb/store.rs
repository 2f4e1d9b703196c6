//! [`ScoreStore`] backend persisting the scoreboard in MongoDB collections.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteError, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoPointDocument, MongoRoundDocument, MongoScoreDocument, MongoTeamDocument, doc_id,
        uuid_as_binary,
    },
};
use crate::dao::{
    models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
    score_store::{ScoreStore, SeedOutcome},
    storage::StorageResult,
};

const ROUND_COLLECTION_NAME: &str = "rounds";
const TEAM_COLLECTION_NAME: &str = "teams";
const SCORE_COLLECTION_NAME: &str = "scores";
const POINT_COLLECTION_NAME: &str = "points";

/// Score store backed by MongoDB.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the indexes the application relies on. The unique compound
    /// index on `(team_id, round_id)` is what enforces the
    /// one-score-per-pair invariant for this backend.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let scores = database.collection::<mongodb::bson::Document>(SCORE_COLLECTION_NAME);
        let score_index = mongodb::IndexModel::builder()
            .keys(doc! {"team_id": 1, "round_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_pair_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        scores
            .create_index(score_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "team_id,round_id",
                source,
            })?;

        let points = database.collection::<mongodb::bson::Document>(POINT_COLLECTION_NAME);
        let point_index = mongodb::IndexModel::builder()
            .keys(doc! {"score_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("point_score_idx".to_owned()))
                    .build(),
            )
            .build();
        points
            .create_index(point_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: POINT_COLLECTION_NAME,
                index: "score_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn rounds(&self) -> Collection<MongoRoundDocument> {
        self.database()
            .await
            .collection::<MongoRoundDocument>(ROUND_COLLECTION_NAME)
    }

    async fn teams(&self) -> Collection<MongoTeamDocument> {
        self.database()
            .await
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
    }

    async fn scores(&self) -> Collection<MongoScoreDocument> {
        self.database()
            .await
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn points(&self) -> Collection<MongoPointDocument> {
        self.database()
            .await
            .collection::<MongoPointDocument>(POINT_COLLECTION_NAME)
    }

    async fn list_rounds_inner(&self) -> MongoResult<Vec<RoundEntity>> {
        let cursor = self.rounds().await.find(doc! {}).await.map_err(|source| {
            MongoDaoError::ListEntities {
                collection: ROUND_COLLECTION_NAME,
                source,
            }
        })?;
        let documents: Vec<MongoRoundDocument> =
            cursor
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListEntities {
                    collection: ROUND_COLLECTION_NAME,
                    source,
                })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_teams_inner(&self) -> MongoResult<Vec<TeamEntity>> {
        let cursor = self.teams().await.find(doc! {}).await.map_err(|source| {
            MongoDaoError::ListEntities {
                collection: TEAM_COLLECTION_NAME,
                source,
            }
        })?;
        let documents: Vec<MongoTeamDocument> =
            cursor
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListEntities {
                    collection: TEAM_COLLECTION_NAME,
                    source,
                })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_or_create_score_inner(
        &self,
        team_id: Uuid,
        round_id: Uuid,
    ) -> MongoResult<ScoreEntity> {
        let collection = self.scores().await;
        let filter = doc! {
            "team_id": uuid_as_binary(team_id),
            "round_id": uuid_as_binary(round_id),
        };

        let lookup_err = |source| MongoDaoError::FindOrCreateScore {
            team_id,
            round_id,
            source,
        };

        if let Some(existing) = collection.find_one(filter.clone()).await.map_err(lookup_err)? {
            return Ok(existing.into());
        }

        let fresh = MongoScoreDocument::from(ScoreEntity {
            id: Uuid::new_v4(),
            team_id,
            round_id,
        });
        match collection.insert_one(&fresh).await {
            Ok(_) => Ok(fresh.into()),
            // Lost the creation race: the unique index rejected our insert,
            // so the winner's document must now be visible.
            Err(err) if is_duplicate_key(&err) => collection
                .find_one(filter)
                .await
                .map_err(lookup_err)?
                .map(Into::into)
                .ok_or(MongoDaoError::FindOrCreateScore {
                    team_id,
                    round_id,
                    source: err,
                }),
            Err(source) => Err(MongoDaoError::FindOrCreateScore {
                team_id,
                round_id,
                source,
            }),
        }
    }
}

/// True when the error is the unique-index violation raised by a lost
/// find-or-create race.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: 11000, .. }))
    )
}

impl ScoreStore for MongoScoreStore {
    fn seed_event(
        &self,
        rounds: Vec<RoundEntity>,
        teams: Vec<TeamEntity>,
    ) -> BoxFuture<'static, StorageResult<SeedOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let mut outcome = SeedOutcome::default();

            let known_rounds = store.list_rounds_inner().await?;
            let round_collection = store.rounds().await;
            for round in rounds {
                if known_rounds.iter().any(|known| known.name == round.name) {
                    continue;
                }
                round_collection
                    .insert_one(MongoRoundDocument::from(round))
                    .await
                    .map_err(|source| MongoDaoError::SeedEntities {
                        collection: ROUND_COLLECTION_NAME,
                        source,
                    })?;
                outcome.rounds_added += 1;
            }

            let known_teams = store.list_teams_inner().await?;
            let team_collection = store.teams().await;
            for team in teams {
                if known_teams.iter().any(|known| known.name == team.name) {
                    continue;
                }
                team_collection
                    .insert_one(MongoTeamDocument::from(team))
                    .await
                    .map_err(|source| MongoDaoError::SeedEntities {
                        collection: TEAM_COLLECTION_NAME,
                        source,
                    })?;
                outcome.teams_added += 1;
            }

            Ok(outcome)
        })
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_rounds_inner().await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams_inner().await.map_err(Into::into) })
    }

    fn list_scores(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let list_err = |source| MongoDaoError::ListEntities {
                collection: SCORE_COLLECTION_NAME,
                source,
            };
            let cursor = store.scores().await.find(doc! {}).await.map_err(list_err)?;
            let documents: Vec<MongoScoreDocument> =
                cursor.try_collect().await.map_err(list_err)?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn list_points(&self) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let list_err = |source| MongoDaoError::ListEntities {
                collection: POINT_COLLECTION_NAME,
                source,
            };
            let cursor = store.points().await.find(doc! {}).await.map_err(list_err)?;
            let documents: Vec<MongoPointDocument> =
                cursor.try_collect().await.map_err(list_err)?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .rounds()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::FindEntity {
                    collection: ROUND_COLLECTION_NAME,
                    id,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .teams()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::FindEntity {
                    collection: TEAM_COLLECTION_NAME,
                    id,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .scores()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::FindEntity {
                    collection: SCORE_COLLECTION_NAME,
                    id,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_or_create_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_or_create_score_inner(team_id, round_id)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_point(&self, point: PointEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = point.id;
            store
                .points()
                .await
                .insert_one(MongoPointDocument::from(point))
                .await
                .map_err(|source| MongoDaoError::InsertPoint { id, source })?;
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
            let document = store
                .points()
                .await
                .find_one_and_update(doc_id(point_id), doc! {"$set": {"count": count}})
                .return_document(ReturnDocument::After)
                .await
                .map_err(|source| MongoDaoError::UpdatePoint {
                    id: point_id,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn delete_point(
        &self,
        point_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .points()
                .await
                .find_one_and_delete(doc_id(point_id))
                .await
                .map_err(|source| MongoDaoError::DeletePoint {
                    id: point_id,
                    source,
                })?;
            Ok(document.map(Into::into))
        })
    }

    fn points_for_score(
        &self,
        score_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let list_err = |source| MongoDaoError::ListEntities {
                collection: POINT_COLLECTION_NAME,
                source,
            };
            let cursor = store
                .points()
                .await
                .find(doc! {"score_id": uuid_as_binary(score_id)})
                .await
                .map_err(list_err)?;
            let documents: Vec<MongoPointDocument> =
                cursor.try_collect().await.map_err(list_err)?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn set_team_visibility(
        &self,
        flags: Vec<(Uuid, bool)>,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let collection = store.teams().await;
            for (id, hidden) in flags {
                collection
                    .update_one(doc_id(id), doc! {"$set": {"hidden": hidden}})
                    .await
                    .map_err(|source| MongoDaoError::SetVisibility { id, source })?;
            }
            store.list_teams_inner().await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
