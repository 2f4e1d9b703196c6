//! Business logic powering the admin mutation endpoints. Every point
//! mutation follows the same path: write through the store, recompute the
//! affected score's total from a fresh read, broadcast the delta, and
//! respond with the refreshed ledger.

use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::PointEntity,
    dto::{
        admin::{AddPointRequest, DeletePointRequest, UpdatePointRequest, UpdateTeamsRequest},
        scoreboard::{LedgerEntry, TeamSummary},
    },
    error::ServiceError,
    services::{aggregation, scoreboard_service, sse_events},
    state::SharedState,
};

/// Record a new point entry, creating the (team, round) score on first use.
pub async fn add_point(
    state: &SharedState,
    request: AddPointRequest,
) -> Result<Vec<LedgerEntry>, ServiceError> {
    let store = state.require_score_store().await?;

    let team = store
        .find_team(request.team_id)
        .await?
        .ok_or_else(|| ServiceError::InvalidInput(format!("unknown team `{}`", request.team_id)))?;
    let round = store.find_round(request.round_id).await?.ok_or_else(|| {
        ServiceError::InvalidInput(format!("unknown round `{}`", request.round_id))
    })?;

    let score = store.find_or_create_score(team.id, round.id).await?;
    store
        .insert_point(PointEntity {
            id: Uuid::new_v4(),
            score_id: score.id,
            count: request.count,
            created_at: SystemTime::now(),
        })
        .await?;

    let total = aggregation::score_total(&store.points_for_score(score.id).await?);
    debug!(team = %team.name, round = %round.name, count = request.count, total, "point recorded");
    sse_events::broadcast_score_update(state, team.id, round.id, total, Some(request.count));

    scoreboard_service::point_ledger(state).await
}

/// Overwrite the count of an existing point entry.
pub async fn update_point(
    state: &SharedState,
    request: UpdatePointRequest,
) -> Result<Vec<LedgerEntry>, ServiceError> {
    let store = state.require_score_store().await?;

    let point = store
        .update_point_count(request.point_id, request.count)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("point `{}` not found", request.point_id))
        })?;

    broadcast_recomputed_total(state, point.score_id).await?;
    scoreboard_service::point_ledger(state).await
}

/// Remove a point entry. The owning score stays in place, falling back to
/// a total of 0 when this was its last point.
pub async fn delete_point(
    state: &SharedState,
    request: DeletePointRequest,
) -> Result<Vec<LedgerEntry>, ServiceError> {
    let store = state.require_score_store().await?;

    let point = store.delete_point(request.point_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("point `{}` not found", request.point_id))
    })?;

    broadcast_recomputed_total(state, point.score_id).await?;
    scoreboard_service::point_ledger(state).await
}

/// Bulk-apply hidden flags and return the updated full team list.
pub async fn update_teams(
    state: &SharedState,
    request: UpdateTeamsRequest,
) -> Result<Vec<TeamSummary>, ServiceError> {
    let store = state.require_score_store().await?;

    let known = store.list_teams().await?;
    for flag in &request.teams {
        if !known.iter().any(|team| team.id == flag.id) {
            return Err(ServiceError::InvalidInput(format!(
                "unknown team `{}`",
                flag.id
            )));
        }
    }

    let flags = request
        .teams
        .iter()
        .map(|flag| (flag.id, flag.hidden))
        .collect();
    let updated = store.set_team_visibility(flags).await?;

    let data = scoreboard_service::fetch_board_data(&store).await?;
    let standings =
        aggregation::standings(&data.rounds, &updated, &data.scores, &data.points);
    sse_events::broadcast_teams_update(state, standings);

    let mut teams: Vec<TeamSummary> = updated.into_iter().map(Into::into).collect();
    teams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(teams)
}

/// Recompute a score's total from a fresh read and broadcast it without a
/// count annotation (update/delete pushes).
async fn broadcast_recomputed_total(
    state: &SharedState,
    score_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_score_store().await?;

    let score = store
        .find_score(score_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score `{score_id}` not found")))?;
    let total = aggregation::score_total(&store.points_for_score(score.id).await?);

    debug!(score_id = %score.id, total, "score total recomputed");
    sse_events::broadcast_score_update(state, score.team_id, score.round_id, total, None);
    Ok(())
}
