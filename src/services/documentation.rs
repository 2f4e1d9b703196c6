use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::scoreboard_stream,
        crate::routes::scoreboard::get_scores,
        crate::routes::scoreboard::get_teams_and_rounds,
        crate::routes::scoreboard::get_points,
        crate::routes::admin::add_point,
        crate::routes::admin::update_point,
        crate::routes::admin::delete_point,
        crate::routes::admin::update_teams,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoreboard::ScoresResponse,
            crate::dto::scoreboard::TeamScoresRow,
            crate::dto::scoreboard::TeamsAndRoundsResponse,
            crate::dto::scoreboard::RoundSummary,
            crate::dto::scoreboard::TeamSummary,
            crate::dto::scoreboard::TeamStanding,
            crate::dto::scoreboard::LedgerEntry,
            crate::dto::admin::AddPointRequest,
            crate::dto::admin::UpdatePointRequest,
            crate::dto::admin::DeletePointRequest,
            crate::dto::admin::UpdateTeamsRequest,
            crate::dto::admin::TeamVisibilityInput,
            crate::dto::sse::ScoreUpdateEvent,
            crate::dto::sse::TeamsUpdateEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "scoreboard", description = "Read-only scoreboard projections"),
        (name = "admin", description = "Point and team mutation endpoints"),
        (name = "sse", description = "Server-sent events stream"),
    )
)]
pub struct ApiDoc;
