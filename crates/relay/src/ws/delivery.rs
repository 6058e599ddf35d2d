use std::sync::Arc;

use pairchat_common::{protocol::ws::OutboundFrame, types::ParticipantId};
use tracing::debug;

use super::session::SessionRegistry;
use crate::store::{MessageStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Persisted and pushed to the peer's live connection.
    Delivered,
    /// Persisted only; the peer gets it from history on their next connect.
    Stored,
}

/// Persists chat messages and forwards them to the sender's peer.
#[derive(Clone)]
pub struct DeliveryRouter {
    registry: Arc<SessionRegistry>,
    store: MessageStore,
}

impl DeliveryRouter {
    pub fn new(registry: Arc<SessionRegistry>, store: MessageStore) -> Self {
        Self { registry, store }
    }

    /// Appends the message to both logs, then pushes it to the peer if online.
    ///
    /// Nothing is pushed when the append fails.
    pub async fn route(
        &self,
        sender: ParticipantId,
        body: String,
    ) -> Result<RouteOutcome, StoreError> {
        let receipt = self.store.append(sender, &body).await?;

        let recipient = sender.peer();
        let pushed = self
            .registry
            .send_to(
                recipient,
                OutboundFrame::chat(sender, body),
                Some(receipt.seq_in_log_of(recipient)),
            )
            .await;

        let outcome = if pushed { RouteOutcome::Delivered } else { RouteOutcome::Stored };
        debug!(
            sender = %sender,
            recipient = %recipient,
            recipient_seq = receipt.recipient_seq,
            outcome = ?outcome,
            "chat message routed"
        );
        Ok(outcome)
    }
}
