//! Event vocabulary of the push channel and the helpers that serialize and
//! fan payloads out to the viewer registry.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        scoreboard::TeamStanding,
        sse::{ScoreUpdateEvent, ServerEvent, TeamsUpdateEvent},
    },
    state::SharedState,
};

const EVENT_SCORE_UPDATE: &str = "score_update";
const EVENT_TEAMS_UPDATE: &str = "teams_update";

/// Broadcast a freshly recomputed score total. `count` carries the raw
/// delta for adds and is omitted for recompute-only pushes.
pub fn broadcast_score_update(
    state: &SharedState,
    team_id: Uuid,
    round_id: Uuid,
    points: i64,
    count: Option<i32>,
) {
    let payload = ScoreUpdateEvent {
        team_id,
        round_id,
        points,
        count,
    };
    send_event(state, EVENT_SCORE_UPDATE, &payload);
}

/// Broadcast the full standings after a visibility change.
pub fn broadcast_teams_update(state: &SharedState, teams: Vec<TeamStanding>) {
    let payload = TeamsUpdateEvent { teams };
    send_event(state, EVENT_TEAMS_UPDATE, &payload);
}

fn send_event<T: Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.viewers().broadcast(message),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
