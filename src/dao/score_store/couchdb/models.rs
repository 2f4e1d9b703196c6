use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
    score_store::couchdb::error::CouchDaoError,
};

pub const ROUND_PREFIX: &str = "round::";
pub const TEAM_PREFIX: &str = "team::";
pub const SCORE_PREFIX: &str = "score::";
pub const POINT_PREFIX: &str = "point::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[allow(dead_code)]
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoundDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub round: RoundBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundBody {
    pub name: String,
    pub position: u32,
}

impl CouchRoundDocument {
    pub fn from_entity(entity: RoundEntity) -> Self {
        Self {
            id: round_doc_id(entity.id),
            rev: None,
            round: RoundBody {
                name: entity.name,
                position: entity.position,
            },
        }
    }

    pub fn try_into_entity(self) -> Result<RoundEntity, CouchDaoError> {
        let id = parse_doc_uuid(ROUND_PREFIX, &self.id)?;
        Ok(RoundEntity {
            id,
            name: self.round.name,
            position: self.round.position,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchTeamDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub team: TeamBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamBody {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
}

impl CouchTeamDocument {
    pub fn from_entity(entity: TeamEntity) -> Self {
        Self {
            id: team_doc_id(entity.id),
            rev: None,
            team: TeamBody {
                name: entity.name,
                hidden: entity.hidden,
            },
        }
    }

    pub fn try_into_entity(self) -> Result<TeamEntity, CouchDaoError> {
        let id = parse_doc_uuid(TEAM_PREFIX, &self.id)?;
        Ok(TeamEntity {
            id,
            name: self.team.name,
            hidden: self.team.hidden,
        })
    }
}

/// Score documents use the deterministic id `score::{team}::{round}`, so a
/// conflicting create of the same pair collides on `_id` and the invariant
/// holds without a separate index. The score's own UUID travels in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub score: ScoreBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBody {
    pub id: Uuid,
    pub team_id: Uuid,
    pub round_id: Uuid,
}

impl CouchScoreDocument {
    pub fn from_entity(entity: ScoreEntity) -> Self {
        Self {
            id: score_doc_id(entity.team_id, entity.round_id),
            rev: None,
            score: ScoreBody {
                id: entity.id,
                team_id: entity.team_id,
                round_id: entity.round_id,
            },
        }
    }

    pub fn into_entity(self) -> ScoreEntity {
        ScoreEntity {
            id: self.score.id,
            team_id: self.score.team_id,
            round_id: self.score.round_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPointDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub point: PointBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointBody {
    pub score_id: Uuid,
    pub count: i32,
    pub created_at: SystemTime,
}

impl CouchPointDocument {
    pub fn from_entity(entity: PointEntity) -> Self {
        Self {
            id: point_doc_id(entity.id),
            rev: None,
            point: PointBody {
                score_id: entity.score_id,
                count: entity.count,
                created_at: entity.created_at,
            },
        }
    }

    pub fn try_into_entity(self) -> Result<PointEntity, CouchDaoError> {
        let id = parse_doc_uuid(POINT_PREFIX, &self.id)?;
        Ok(PointEntity {
            id,
            score_id: self.point.score_id,
            count: self.point.count,
            created_at: self.point.created_at,
        })
    }
}

pub fn round_doc_id(id: Uuid) -> String {
    format!("{ROUND_PREFIX}{id}")
}

pub fn team_doc_id(id: Uuid) -> String {
    format!("{TEAM_PREFIX}{id}")
}

pub fn score_doc_id(team_id: Uuid, round_id: Uuid) -> String {
    format!("{SCORE_PREFIX}{team_id}::{round_id}")
}

pub fn point_doc_id(id: Uuid) -> String {
    format!("{POINT_PREFIX}{id}")
}

fn parse_doc_uuid(prefix: &'static str, doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let raw = doc_id
        .strip_prefix(prefix)
        .ok_or(CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_owned(),
            kind: "missing expected prefix",
        })?;
    Uuid::parse_str(raw).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_owned(),
        kind: "not a UUID",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_round_trip() {
        let id = Uuid::new_v4();
        let doc = CouchPointDocument::from_entity(PointEntity {
            id,
            score_id: Uuid::new_v4(),
            count: -2,
            created_at: SystemTime::UNIX_EPOCH,
        });
        assert_eq!(doc.try_into_entity().unwrap().id, id);
    }

    #[test]
    fn foreign_doc_ids_are_rejected() {
        let doc = CouchRoundDocument {
            id: "team::not-a-round".into(),
            rev: None,
            round: RoundBody {
                name: "Round 1".into(),
                position: 0,
            },
        };
        assert!(matches!(
            doc.try_into_entity(),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
    }
}
