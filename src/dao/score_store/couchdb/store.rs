//! [`ScoreStore`] backend persisting the scoreboard as CouchDB documents.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use uuid::Uuid;

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchPointDocument, CouchRoundDocument, CouchScoreDocument,
        CouchTeamDocument, END_SUFFIX, POINT_PREFIX, ROUND_PREFIX, SCORE_PREFIX, TEAM_PREFIX,
        point_doc_id, round_doc_id, score_doc_id, team_doc_id,
    },
};
use crate::dao::{
    models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
    score_store::{ScoreStore, SeedOutcome},
    storage::StorageResult,
};

/// Score store backed by CouchDB.
#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchScoreStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        let builder = self.client.request(method, url);
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);
        let mut builder = self.client.get(&url);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
        }

        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let mut builder = self.client.put(&url);
                if let Some((ref user, ref pass)) = self.auth {
                    builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
                }
                let create =
                    builder
                        .send()
                        .await
                        .map_err(|source| CouchDaoError::DatabaseCreate {
                            database: database.clone(),
                            source,
                        })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    async fn list_rounds_inner(&self) -> CouchResult<Vec<RoundEntity>> {
        let docs = self
            .list_documents::<CouchRoundDocument>(ROUND_PREFIX)
            .await?;
        docs.into_iter()
            .map(CouchRoundDocument::try_into_entity)
            .collect()
    }

    async fn list_teams_inner(&self) -> CouchResult<Vec<TeamEntity>> {
        let docs = self.list_documents::<CouchTeamDocument>(TEAM_PREFIX).await?;
        docs.into_iter()
            .map(CouchTeamDocument::try_into_entity)
            .collect()
    }

    async fn list_scores_inner(&self) -> CouchResult<Vec<ScoreEntity>> {
        let docs = self
            .list_documents::<CouchScoreDocument>(SCORE_PREFIX)
            .await?;
        Ok(docs
            .into_iter()
            .map(CouchScoreDocument::into_entity)
            .collect())
    }
}

impl ScoreStore for CouchScoreStore {
    fn seed_event(
        &self,
        rounds: Vec<RoundEntity>,
        teams: Vec<TeamEntity>,
    ) -> BoxFuture<'static, StorageResult<SeedOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let mut outcome = SeedOutcome::default();

            let known_rounds = store.list_rounds_inner().await?;
            for round in rounds {
                if known_rounds.iter().any(|known| known.name == round.name) {
                    continue;
                }
                let doc = CouchRoundDocument::from_entity(round);
                let doc_id = doc.id.clone();
                store.put_document(&doc_id, &doc).await?;
                outcome.rounds_added += 1;
            }

            let known_teams = store.list_teams_inner().await?;
            for team in teams {
                if known_teams.iter().any(|known| known.name == team.name) {
                    continue;
                }
                let doc = CouchTeamDocument::from_entity(team);
                let doc_id = doc.id.clone();
                store.put_document(&doc_id, &doc).await?;
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
        Box::pin(async move { store.list_scores_inner().await.map_err(Into::into) })
    }

    fn list_points(&self) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchPointDocument>(POINT_PREFIX)
                .await?;
            docs.into_iter()
                .map(|doc| doc.try_into_entity().map_err(Into::into))
                .collect()
        })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = round_doc_id(id);
            let maybe_doc = store.get_document::<CouchRoundDocument>(&doc_id).await?;
            maybe_doc
                .map(|doc| doc.try_into_entity().map_err(Into::into))
                .transpose()
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = team_doc_id(id);
            let maybe_doc = store.get_document::<CouchTeamDocument>(&doc_id).await?;
            maybe_doc
                .map(|doc| doc.try_into_entity().map_err(Into::into))
                .transpose()
        })
    }

    fn find_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        // Score documents are keyed by (team, round), not by the score's own
        // UUID, so a lookup by UUID scans the (small) score set.
        Box::pin(async move {
            let scores = store.list_scores_inner().await?;
            Ok(scores.into_iter().find(|score| score.id == id))
        })
    }

    fn find_or_create_score(
        &self,
        team_id: Uuid,
        round_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = score_doc_id(team_id, round_id);
            if let Some(existing) = store.get_document::<CouchScoreDocument>(&doc_id).await? {
                return Ok(existing.into_entity());
            }

            let entity = ScoreEntity {
                id: Uuid::new_v4(),
                team_id,
                round_id,
            };
            let doc = CouchScoreDocument::from_entity(entity.clone());
            match store.put_document(&doc_id, &doc).await {
                Ok(()) => Ok(entity),
                // Lost the creation race: the deterministic _id collided, so
                // the winner's document must now be visible.
                Err(CouchDaoError::RequestStatus {
                    status: StatusCode::CONFLICT,
                    ..
                }) => {
                    let winner = store
                        .get_document::<CouchScoreDocument>(&doc_id)
                        .await?
                        .ok_or(CouchDaoError::RequestStatus {
                            path: doc_id,
                            status: StatusCode::CONFLICT,
                        })?;
                    Ok(winner.into_entity())
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    fn insert_point(&self, point: PointEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = CouchPointDocument::from_entity(point);
            let doc_id = doc.id.clone();
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn update_point_count(
        &self,
        point_id: Uuid,
        count: i32,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = point_doc_id(point_id);
            let Some(mut doc) = store.get_document::<CouchPointDocument>(&doc_id).await? else {
                return Ok(None);
            };
            doc.point.count = count;
            store.put_document(&doc_id, &doc).await?;
            doc.try_into_entity().map(Some).map_err(Into::into)
        })
    }

    fn delete_point(
        &self,
        point_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = point_doc_id(point_id);
            let Some(doc) = store.get_document::<CouchPointDocument>(&doc_id).await? else {
                return Ok(None);
            };
            if let Some(ref rev) = doc.rev {
                store.delete_document(&doc_id, rev).await?;
            }
            doc.try_into_entity().map(Some).map_err(Into::into)
        })
    }

    fn points_for_score(
        &self,
        score_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<PointEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchPointDocument>(POINT_PREFIX)
                .await?;
            let mut points = Vec::new();
            for doc in docs {
                let point = doc.try_into_entity()?;
                if point.score_id == score_id {
                    points.push(point);
                }
            }
            Ok(points)
        })
    }

    fn set_team_visibility(
        &self,
        flags: Vec<(Uuid, bool)>,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            for (id, hidden) in flags {
                let doc_id = team_doc_id(id);
                let Some(mut doc) = store.get_document::<CouchTeamDocument>(&doc_id).await? else {
                    continue;
                };
                doc.team.hidden = hidden;
                store.put_document(&doc_id, &doc).await?;
            }
            store.list_teams_inner().await.map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let mut builder = store.client.get(&url);
            if let Some((ref user, ref pass)) = store.auth {
                builder = builder.basic_auth(user.as_ref(), Some(pass.as_ref()));
            }

            let response = builder
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
