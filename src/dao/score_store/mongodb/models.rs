use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    position: u32,
}

impl From<RoundEntity> for MongoRoundDocument {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            position: value.position,
        }
    }
}

impl From<MongoRoundDocument> for RoundEntity {
    fn from(value: MongoRoundDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            position: value.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    #[serde(default)]
    hidden: bool,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            hidden: value.hidden,
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            hidden: value.hidden,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    team_id: Uuid,
    round_id: Uuid,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.id,
            team_id: value.team_id,
            round_id: value.round_id,
        }
    }
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            id: value.id,
            team_id: value.team_id,
            round_id: value.round_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPointDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    score_id: Uuid,
    count: i32,
    created_at: DateTime,
}

impl From<PointEntity> for MongoPointDocument {
    fn from(value: PointEntity) -> Self {
        Self {
            id: value.id,
            score_id: value.score_id,
            count: value.count,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPointDocument> for PointEntity {
    fn from(value: MongoPointDocument) -> Self {
        Self {
            id: value.id,
            score_id: value.score_id,
            count: value.count,
            created_at: value.created_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
