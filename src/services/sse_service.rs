use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{ServerEvent, SnapshotEvent},
    error::ServiceError,
    services::session_service,
    state::{SharedState, pin::Pin, session::Subscription},
};

/// Name of the first event written on every session stream.
const SNAPSHOT_EVENT: &str = "snapshot";

/// Subscribe to the event stream of one session.
pub async fn subscribe_session(
    state: &SharedState,
    pin: &str,
) -> Result<(Pin, Subscription), ServiceError> {
    let handle = session_service::find_session(state, pin)?;
    let subscription = handle.subscribe().await?;
    Ok((handle.pin(), subscription))
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a session subscription into an SSE response: the snapshot first,
/// then every session event in emission order until the client or the
/// session goes away.
pub fn to_sse_stream(
    pin: Pin,
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);
    let Subscription {
        id,
        snapshot,
        mut events,
    } = subscription;

    // forwarder task: reads from the session dispatcher and pushes into mpsc
    tokio::spawn(async move {
        match ServerEvent::json(
            Some(SNAPSHOT_EVENT.to_string()),
            &SnapshotEvent::from(snapshot),
        ) {
            Ok(payload) => {
                if tx.send(Ok(to_event(payload))).await.is_err() {
                    info!(%pin, subscriber = %id, "SSE client left before the snapshot");
                    return;
                }
            }
            Err(err) => warn!(%pin, error = %err, "failed to serialise session snapshot"),
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = events.recv() => {
                    let Some(session_event) = received else {
                        break;
                    };
                    let payload = match ServerEvent::from_session_event(&session_event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%pin, seq = session_event.seq, error = %err, "failed to serialise session event");
                            continue;
                        }
                    };
                    if tx.send(Ok(to_event(payload))).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(%pin, subscriber = %id, "session SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
