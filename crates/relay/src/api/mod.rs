// Administrative HTTP surface.
//
// PeerA may wipe PeerB's transcript. PeerB is told to reload through a
// `{"action": "refresh"}` control frame when online.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::delete,
    Json, Router,
};
use pairchat_common::{protocol::ws::OutboundFrame, types::ParticipantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    error::{ErrorCode, RelayError},
    state::RelayState,
    store::StoreError,
};

#[derive(Debug, Deserialize)]
struct PurgeQuery {
    user_id: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgeResponse {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub deleted_count: u64,
    /// Whether the refresh notification reached a live connection.
    pub refresh_sent: bool,
}

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("only participant {} may clear the peer history", ParticipantId::PRIVILEGED)]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for PurgeError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => {
                RelayError::new(ErrorCode::AuthForbidden, self.to_string()).into_response()
            }
            Self::Store(store_error) => {
                error!(error = %store_error, "failed to clear peer history");
                RelayError::from_code(ErrorCode::StoreUnavailable).into_response()
            }
        }
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/delete_user2_messages", delete(delete_peer_messages))
        .with_state(state)
}

async fn delete_peer_messages(
    State(state): State<RelayState>,
    query: Result<Query<PurgeQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return RelayError::new(ErrorCode::ValidationFailed, rejection.body_text())
                .into_response();
        }
    };

    // Ids outside the pair are simply not privileged.
    let caller = match ParticipantId::try_from(query.user_id) {
        Ok(caller) => caller,
        Err(_) => return PurgeError::Forbidden.into_response(),
    };

    match purge_counterpart(&state, caller).await {
        Ok(outcome) => Json(PurgeResponse { deleted_count: outcome.deleted_count }).into_response(),
        Err(purge_error) => purge_error.into_response(),
    }
}

/// Clears the privileged participant's peer log and asks the peer to reload.
///
/// The refresh is pushed whenever the peer is online, even if the log was
/// already empty.
pub async fn purge_counterpart(
    state: &RelayState,
    caller: ParticipantId,
) -> Result<PurgeOutcome, PurgeError> {
    if !caller.is_privileged() {
        return Err(PurgeError::Forbidden);
    }

    let target = caller.peer();
    let deleted_count = state.store.clear(target).await?;
    let refresh_sent = state.registry.send_to(target, OutboundFrame::refresh(), None).await;

    info!(
        caller = %caller,
        target = %target,
        deleted_count,
        refresh_sent,
        "peer history cleared"
    );
    Ok(PurgeOutcome { deleted_count, refresh_sent })
}
