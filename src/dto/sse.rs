//! Payloads carried over the SSE push channel.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::scoreboard::TeamStanding;

#[derive(Clone, Debug)]
/// Dispatched payload carried to every registered viewer.
pub struct ServerEvent {
    /// SSE event name, when the event is named.
    pub event: Option<String>,
    /// Pre-serialized SSE data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Broadcast after every point mutation with the freshly recomputed total.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateEvent {
    /// Team whose score changed.
    pub team_id: Uuid,
    /// Round the change belongs to.
    pub round_id: Uuid,
    /// New total for the (team, round) score.
    pub points: i64,
    /// Raw count just applied; present for adds only, so viewers can show
    /// a transient "+N / -N" annotation distinct from the running total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
}

/// Broadcast after a visibility change with the full standings list.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsUpdateEvent {
    /// Every team with its current hidden flag and totals.
    pub teams: Vec<TeamStanding>,
}
