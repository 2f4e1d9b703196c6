use axum::{
    Json, Router,
    extract::State,
    routing::{delete, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{AddPointRequest, DeletePointRequest, UpdatePointRequest, UpdateTeamsRequest},
        scoreboard::{LedgerEntry, TeamSummary},
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

/// Mutation endpoints used by the admin panel.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/add_point", post(add_point))
        .route("/update_point", put(update_point))
        .route("/delete_point", delete(delete_point))
        .route("/update_teams", put(update_teams))
}

#[utoipa::path(
    post,
    path = "/add_point",
    tag = "admin",
    request_body = AddPointRequest,
    responses(
        (status = 200, description = "Point recorded; updated ledger returned", body = [LedgerEntry]),
        (status = 400, description = "Unknown team/round reference or malformed payload")
    )
)]
/// Record a point entry and broadcast the new total to viewers.
pub async fn add_point(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AddPointRequest>>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let ledger = admin_service::add_point(&state, payload).await?;
    Ok(Json(ledger))
}

#[utoipa::path(
    put,
    path = "/update_point",
    tag = "admin",
    request_body = UpdatePointRequest,
    responses(
        (status = 200, description = "Point updated; updated ledger returned", body = [LedgerEntry]),
        (status = 404, description = "Unknown point id")
    )
)]
/// Overwrite an existing point's count and broadcast the new total.
pub async fn update_point(
    State(state): State<SharedState>,
    Json(payload): Json<UpdatePointRequest>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let ledger = admin_service::update_point(&state, payload).await?;
    Ok(Json(ledger))
}

#[utoipa::path(
    delete,
    path = "/delete_point",
    tag = "admin",
    request_body = DeletePointRequest,
    responses(
        (status = 200, description = "Point removed; updated ledger returned", body = [LedgerEntry]),
        (status = 404, description = "Unknown point id")
    )
)]
/// Remove a point entry and broadcast the new total.
pub async fn delete_point(
    State(state): State<SharedState>,
    Json(payload): Json<DeletePointRequest>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    let ledger = admin_service::delete_point(&state, payload).await?;
    Ok(Json(ledger))
}

#[utoipa::path(
    put,
    path = "/update_teams",
    tag = "admin",
    request_body = UpdateTeamsRequest,
    responses(
        (status = 200, description = "Visibility applied; updated team list returned", body = [TeamSummary]),
        (status = 400, description = "Empty team list or unknown team reference")
    )
)]
/// Bulk-apply team visibility flags and broadcast the new standings.
pub async fn update_teams(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UpdateTeamsRequest>>,
) -> Result<Json<Vec<TeamSummary>>, AppError> {
    let teams = admin_service::update_teams(&state, payload).await?;
    Ok(Json(teams))
}
