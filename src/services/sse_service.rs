//! Conversion between the viewer registry and axum SSE responses.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{dto::sse::ServerEvent, state::SharedState};

/// Register a new viewer on the shared registry.
pub fn subscribe(state: &SharedState) -> (Uuid, mpsc::Receiver<ServerEvent>) {
    state.viewers().register()
}

/// Convert a viewer's receiver into an SSE response, forwarding events and
/// unregistering the viewer once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    viewer_id: Uuid,
    mut receiver: mpsc::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from the registry channel and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = receiver.recv() => {
                    // `None` means the registry shut the connection down.
                    let Some(payload) = received else { break };

                    let mut event = Event::default().data(payload.data);
                    if let Some(name) = payload.event {
                        event = event.event(name);
                    }

                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        // Own the state clone inside the spawned task so the registry entry
        // goes away even if the request context has already dropped.
        state.viewers().unregister(viewer_id);
        tracing::info!(%viewer_id, "scoreboard SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
