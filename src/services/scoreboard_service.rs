//! Service helpers that expose read-only projections of the scoreboard.

use std::sync::Arc;

use crate::{
    dao::{
        models::{PointEntity, RoundEntity, ScoreEntity, TeamEntity},
        score_store::ScoreStore,
    },
    dto::scoreboard::{LedgerEntry, RoundSummary, ScoresResponse, TeamsAndRoundsResponse},
    error::ServiceError,
    services::aggregation,
    state::SharedState,
};

/// Everything the aggregation views need, fetched in one place.
pub(crate) struct BoardData {
    pub rounds: Vec<RoundEntity>,
    pub teams: Vec<TeamEntity>,
    pub scores: Vec<ScoreEntity>,
    pub points: Vec<PointEntity>,
}

pub(crate) async fn fetch_board_data(
    store: &Arc<dyn ScoreStore>,
) -> Result<BoardData, ServiceError> {
    Ok(BoardData {
        rounds: store.list_rounds().await?,
        teams: store.list_teams().await?,
        scores: store.list_scores().await?,
        points: store.list_points().await?,
    })
}

/// Return the full snapshot used to hydrate a freshly connecting viewer.
pub async fn scores_snapshot(state: &SharedState) -> Result<ScoresResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let data = fetch_board_data(&store).await?;
    Ok(aggregation::snapshot(
        &data.rounds,
        &data.teams,
        &data.scores,
        &data.points,
    ))
}

/// Return all rounds and teams, hidden teams included, for the admin panel.
pub async fn teams_and_rounds(state: &SharedState) -> Result<TeamsAndRoundsResponse, ServiceError> {
    let store = state.require_score_store().await?;

    let mut rounds = store.list_rounds().await?;
    rounds.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

    let mut teams = store.list_teams().await?;
    teams.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(TeamsAndRoundsResponse {
        rounds: rounds.into_iter().map(RoundSummary::from).collect(),
        teams: teams.into_iter().map(Into::into).collect(),
    })
}

/// Return the audit ledger of every point entry, newest first.
pub async fn point_ledger(state: &SharedState) -> Result<Vec<LedgerEntry>, ServiceError> {
    let store = state.require_score_store().await?;
    let data = fetch_board_data(&store).await?;
    Ok(aggregation::ledger(
        &data.rounds,
        &data.teams,
        &data.scores,
        &data.points,
    ))
}
