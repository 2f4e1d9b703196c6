use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::scoreboard::{LedgerEntry, ScoresResponse, TeamsAndRoundsResponse},
    error::AppError,
    services::scoreboard_service,
    state::SharedState,
};

/// Read-only endpoints backing the public board and the admin panel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/scores", get(get_scores))
        .route("/teams_n_rounds", get(get_teams_and_rounds))
        .route("/points", get(get_points))
}

#[utoipa::path(
    get,
    path = "/scores",
    tag = "scoreboard",
    responses((status = 200, description = "Full scoreboard snapshot, hidden teams excluded", body = ScoresResponse))
)]
/// Return the full snapshot a freshly connecting viewer renders from.
pub async fn get_scores(
    State(state): State<SharedState>,
) -> Result<Json<ScoresResponse>, AppError> {
    let payload = scoreboard_service::scores_snapshot(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/teams_n_rounds",
    tag = "scoreboard",
    responses((status = 200, description = "All rounds and teams, hidden teams included", body = TeamsAndRoundsResponse))
)]
/// Return every round and team for the admin panel selectors.
pub async fn get_teams_and_rounds(
    State(state): State<SharedState>,
) -> Result<Json<TeamsAndRoundsResponse>, AppError> {
    let payload = scoreboard_service::teams_and_rounds(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/points",
    tag = "scoreboard",
    responses((status = 200, description = "Point ledger, newest first", body = [LedgerEntry]))
)]
/// Return the audit ledger of every recorded point entry.
pub async fn get_points(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let payload = scoreboard_service::point_ledger(&state).await?;
    Ok(Json(payload))
}
