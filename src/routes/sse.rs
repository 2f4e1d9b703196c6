use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/scoreboard",
    tag = "sse",
    responses((status = 200, description = "Scoreboard event stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime `score_update` / `teams_update` events to viewers.
pub async fn scoreboard_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (viewer_id, receiver) = sse_service::subscribe(&state);
    info!(%viewer_id, viewers = state.viewers().connected(), "new scoreboard SSE connection");
    sse_service::to_sse_stream(state, viewer_id, receiver)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/scoreboard", get(scoreboard_stream))
}
