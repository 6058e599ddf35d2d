use std::collections::HashSet;

use axum::{
    extract::{
        ws::{close_code, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use pairchat_common::{
    protocol::ws::{decode_inbound, InboundFrame},
    types::ParticipantId,
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    delivery::DeliveryRouter,
    protocol::{error_frame, send_close, send_frame},
    session::{Outbound, Registration},
};
use crate::{
    error::{ErrorCode, RelayError},
    state::RelayState,
};

pub(crate) const MAX_FRAME_BYTES: usize = 65_536;

/// Why a connection left the `Active` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// The client closed the socket or the transport failed.
    Disconnected,
    /// An inbound frame was not a `{"message": string}` envelope, or its
    /// body contained a NUL character.
    MalformedPayload,
    /// Another connection registered for the same participant.
    Superseded,
    /// History could not be read, so replay was impossible.
    HistoryUnavailable,
}

impl SessionEnd {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::MalformedPayload => "malformed_payload",
            Self::Superseded => "superseded",
            Self::HistoryUnavailable => "history_unavailable",
        }
    }

    /// Close frame to send, if the socket is still usable.
    const fn close(self) -> Option<(u16, &'static str)> {
        match self {
            Self::Disconnected => None,
            Self::MalformedPayload => Some((close_code::INVALID, "malformed chat frame")),
            Self::Superseded => Some((close_code::POLICY, "superseded by a newer connection")),
            Self::HistoryUnavailable => Some((close_code::ERROR, "history unavailable")),
        }
    }
}

pub async fn ws_upgrade(
    Path(raw_user_id): Path<String>,
    State(state): State<RelayState>,
    ws: WebSocketUpgrade,
) -> Response {
    let participant = match raw_user_id.parse::<ParticipantId>() {
        Ok(participant) => participant,
        Err(parse_error) => {
            return RelayError::new(ErrorCode::ValidationFailed, parse_error.to_string())
                .with_details(json!({ "field": "user_id" }))
                .into_response();
        }
    };

    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_socket(state, participant, socket))
        .into_response()
}

async fn handle_socket(state: RelayState, participant: ParticipantId, mut socket: WebSocket) {
    let Registration { connection_id, mut outbound, superseded } =
        state.registry.register(participant).await;

    if let Some(previous) = superseded {
        info!(
            participant = %participant,
            connection_id = %connection_id,
            superseded_connection_id = %previous,
            "evicting previous connection for participant"
        );
    }
    let peer_online = state.registry.is_online(participant.peer()).await;
    info!(
        participant = %participant,
        connection_id = %connection_id,
        peer_online,
        "participant connected"
    );

    let end = run_session(&state, participant, connection_id, &mut socket, &mut outbound).await;

    if let Some((code, reason)) = end.close() {
        send_close(&mut socket, code, reason).await;
    }
    state.registry.unregister(participant, connection_id).await;

    info!(
        participant = %participant,
        connection_id = %connection_id,
        reason = end.as_str(),
        "participant disconnected"
    );
}

/// Replays history, then serves the connection until it reaches a terminal state.
async fn run_session(
    state: &RelayState,
    participant: ParticipantId,
    connection_id: Uuid,
    socket: &mut WebSocket,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> SessionEnd {
    let replayed = match replay_history(state, participant, connection_id, socket).await {
        Ok(replayed) => replayed,
        Err(end) => return end,
    };

    let delivery = state.delivery();
    loop {
        tokio::select! {
            maybe_outbound = outbound.recv() => {
                match maybe_outbound {
                    Some(Outbound::Frame { frame, log_seq }) => {
                        if already_replayed(&replayed, log_seq) {
                            continue;
                        }
                        if send_frame(socket, &frame).await.is_err() {
                            return SessionEnd::Disconnected;
                        }
                    }
                    Some(Outbound::Superseded) | None => return SessionEnd::Superseded,
                }
            }
            maybe_message = socket.recv() => {
                let message = match maybe_message {
                    Some(Ok(message)) => message,
                    Some(Err(transport_error)) => {
                        debug!(
                            participant = %participant,
                            connection_id = %connection_id,
                            error = %transport_error,
                            "websocket transport error"
                        );
                        return SessionEnd::Disconnected;
                    }
                    None => return SessionEnd::Disconnected,
                };

                match message {
                    Message::Text(raw_message) => match decode_inbound(raw_message.as_str()) {
                        Ok(inbound) if inbound.message.contains('\0') => {
                            warn!(
                                participant = %participant,
                                connection_id = %connection_id,
                                "closing connection after chat message containing NUL"
                            );
                            let _ = send_frame(socket, &error_frame(ErrorCode::MalformedPayload)).await;
                            return SessionEnd::MalformedPayload;
                        }
                        Ok(inbound) => {
                            if let Err(end) =
                                handle_chat_message(&delivery, participant, connection_id, socket, inbound)
                                    .await
                            {
                                return end;
                            }
                        }
                        Err(decode_error) => {
                            warn!(
                                participant = %participant,
                                connection_id = %connection_id,
                                error = %decode_error,
                                "closing connection after malformed chat frame"
                            );
                            let _ = send_frame(socket, &error_frame(ErrorCode::MalformedPayload)).await;
                            return SessionEnd::MalformedPayload;
                        }
                    },
                    Message::Binary(_) => {
                        warn!(
                            participant = %participant,
                            connection_id = %connection_id,
                            "closing connection after binary frame"
                        );
                        let _ = send_frame(socket, &error_frame(ErrorCode::MalformedPayload)).await;
                        return SessionEnd::MalformedPayload;
                    }
                    Message::Ping(payload) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            return SessionEnd::Disconnected;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => return SessionEnd::Disconnected,
                }
            }
        }
    }
}

/// Whether a queued frame mirrors a record already sent during replay.
///
/// Matches exact sequences: concurrent appends may commit out of id order, so
/// a lower sequence can still be new to this connection.
fn already_replayed(replayed: &HashSet<i64>, log_seq: Option<i64>) -> bool {
    log_seq.is_some_and(|seq| replayed.contains(&seq))
}

/// Sends the participant's stored transcript, oldest first.
///
/// Returns the sequences of the replayed records.
async fn replay_history(
    state: &RelayState,
    participant: ParticipantId,
    connection_id: Uuid,
    socket: &mut WebSocket,
) -> Result<HashSet<i64>, SessionEnd> {
    let history = match state.store.history(participant, state.history_limit).await {
        Ok(history) => history,
        Err(store_error) => {
            error!(
                participant = %participant,
                connection_id = %connection_id,
                error = %store_error,
                "failed to load history for replay"
            );
            let _ = send_frame(socket, &error_frame(ErrorCode::StoreUnavailable)).await;
            return Err(SessionEnd::HistoryUnavailable);
        }
    };

    let mut replayed = HashSet::with_capacity(history.len());
    for record in &history {
        if send_frame(socket, &record.to_frame()).await.is_err() {
            return Err(SessionEnd::Disconnected);
        }
        replayed.insert(record.seq);
    }

    debug!(
        participant = %participant,
        connection_id = %connection_id,
        replayed = history.len(),
        "history replay complete"
    );
    Ok(replayed)
}

/// Routes one inbound message. A store failure is reported to the sender
/// and keeps the connection open.
async fn handle_chat_message(
    delivery: &DeliveryRouter,
    participant: ParticipantId,
    connection_id: Uuid,
    socket: &mut WebSocket,
    inbound: InboundFrame,
) -> Result<(), SessionEnd> {
    let body_bytes = inbound.message.len();
    match delivery.route(participant, inbound.message).await {
        Ok(_) => Ok(()),
        Err(store_error) => {
            error!(
                participant = %participant,
                connection_id = %connection_id,
                body_bytes,
                error = %store_error,
                "failed to persist chat message; not delivered"
            );
            send_frame(socket, &error_frame(ErrorCode::StoreUnavailable))
                .await
                .map_err(|_| SessionEnd::Disconnected)
        }
    }
}
