use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{PlayerInboundMessage, PlayerOutboundMessage},
    state::{
        dispatcher::EventReceiver,
        errors::SessionError,
        session::{AnswerSubmission, SessionHandle},
    },
};

const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for player socket operations.
#[derive(Debug, Error)]
enum SocketError {
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Handle the full lifecycle of one player WebSocket connection.
///
/// The first frame must be a `join`; afterwards the socket carries answers
/// upstream and session events downstream. Closing the socket leaves the
/// roster.
pub async fn handle_socket(session: SessionHandle, socket: WebSocket) {
    let pin = session.pin();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(JOIN_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(%pin, error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!(%pin, "websocket join timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Ok(PlayerInboundMessage::Join { name }) =
        PlayerInboundMessage::from_json_str(&initial_message)
    else {
        warn!(%pin, "first websocket message was not a join");
        let _ = send_message_to_websocket(
            &outbound_tx,
            &PlayerOutboundMessage::Rejected {
                message: "first message must be a join".into(),
            },
        );
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    // Subscribe before joining so the player's own roster event is delivered.
    let subscription = match session.subscribe().await {
        Ok(subscription) => subscription,
        Err(err) => {
            reject(&outbound_tx, &err);
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let name = name.trim().to_string();
    match session.join(name.clone()).await {
        Ok(players) => {
            if send_message_to_websocket(
                &outbound_tx,
                &PlayerOutboundMessage::Joined {
                    name: name.clone(),
                    players,
                },
            )
            .is_err()
            {
                finalize(writer_task, outbound_tx).await;
                return;
            }
        }
        Err(err) => {
            reject(&outbound_tx, &err);
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    }

    info!(%pin, player = %name, "player socket joined");
    let forwarder = spawn_event_forwarder(subscription.events, outbound_tx.clone());

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match PlayerInboundMessage::from_json_str(&text) {
                Ok(PlayerInboundMessage::Answer {
                    question_id,
                    option_index,
                    elapsed_ms,
                }) => {
                    let submission = AnswerSubmission {
                        player: name.clone(),
                        question_id,
                        option: option_index,
                        elapsed_ms,
                    };
                    if handle_answer(&session, submission, &outbound_tx)
                        .await
                        .is_err()
                    {
                        info!(%pin, player = %name, "connection closed during answer handling, terminating");
                        break;
                    }
                }
                Ok(PlayerInboundMessage::Join { .. }) => {
                    warn!(%pin, player = %name, "ignoring duplicate join message");
                }
                Ok(PlayerInboundMessage::Unknown) => {
                    debug!(%pin, player = %name, "ignoring unknown message type");
                }
                Err(err) => {
                    warn!(%pin, player = %name, error = %err, "failed to parse player message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%pin, player = %name, "player closed socket");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%pin, player = %name, error = %err, "websocket error");
                break;
            }
        }
    }

    forwarder.abort();
    match session.leave(name.clone()).await {
        Ok(_) => info!(%pin, player = %name, "player socket disconnected"),
        Err(err) => debug!(%pin, player = %name, error = %err, "leave after disconnect refused"),
    }

    finalize(writer_task, outbound_tx).await;
}

/// Submit an answer and report the outcome on the player's socket.
async fn handle_answer(
    session: &SessionHandle,
    submission: AnswerSubmission,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), SocketError> {
    let reply = match session.submit_answer(submission).await {
        Ok(outcome) => PlayerOutboundMessage::AnswerResult {
            is_correct: outcome.is_correct,
            points: outcome.points,
        },
        Err(err) => {
            debug!(error = %err, "answer refused");
            PlayerOutboundMessage::Rejected {
                message: err.to_string(),
            }
        }
    };
    send_message_to_websocket(outbound_tx, &reply)
}

fn reject(outbound_tx: &mpsc::UnboundedSender<Message>, err: &SessionError) {
    debug!(error = %err, "player socket refused");
    let _ = send_message_to_websocket(
        outbound_tx,
        &PlayerOutboundMessage::Rejected {
            message: err.to_string(),
        },
    );
}

/// Push every session event onto the socket until either side goes away.
fn spawn_event_forwarder(
    mut events: EventReceiver,
    outbound_tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if send_message_to_websocket(&outbound_tx, event.as_ref()).is_err() {
                return;
            }
        }
        // Session disposed.
        let _ = outbound_tx.send(Message::Close(None));
    })
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is
/// reported back to the caller.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), SocketError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| SocketError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
