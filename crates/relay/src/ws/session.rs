use std::collections::HashMap;

use pairchat_common::{protocol::ws::OutboundFrame, types::ParticipantId};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Items queued for a live connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outbound {
    Frame {
        frame: OutboundFrame,
        /// Sequence of the record in the recipient's log, for frames that
        /// mirror a stored message.
        log_seq: Option<i64>,
    },
    /// A newer connection took over this participant's binding.
    Superseded,
}

#[derive(Debug)]
struct SessionHandle {
    connection_id: Uuid,
    outbound: mpsc::UnboundedSender<Outbound>,
}

/// The receiving half of a registration, owned by the connection task.
#[derive(Debug)]
pub(crate) struct Registration {
    pub(crate) connection_id: Uuid,
    pub(crate) outbound: mpsc::UnboundedReceiver<Outbound>,
    pub(crate) superseded: Option<Uuid>,
}

/// Live connection per participant. At most one binding exists for each.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ParticipantId, SessionHandle>>,
}

impl SessionRegistry {
    /// Binds `participant` to a fresh connection, evicting any previous one.
    pub(crate) async fn register(&self, participant: ParticipantId) -> Registration {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();

        let previous = self
            .sessions
            .write()
            .await
            .insert(participant, SessionHandle { connection_id, outbound: sender });

        let superseded = previous.map(|handle| {
            let _ = handle.outbound.send(Outbound::Superseded);
            handle.connection_id
        });

        Registration { connection_id, outbound: receiver, superseded }
    }

    /// Removes the binding if it still belongs to `connection_id`.
    ///
    /// Returns whether a binding was removed. Unknown or already replaced
    /// connections are ignored.
    pub(crate) async fn unregister(&self, participant: ParticipantId, connection_id: Uuid) -> bool {
        let mut guard = self.sessions.write().await;
        match guard.get(&participant) {
            Some(handle) if handle.connection_id == connection_id => {
                guard.remove(&participant);
                true
            }
            _ => false,
        }
    }

    pub async fn is_online(&self, participant: ParticipantId) -> bool {
        self.sessions.read().await.contains_key(&participant)
    }

    /// Queues `frame` for `participant`'s live connection.
    ///
    /// Returns false when the participant is offline; that is not an error.
    pub(crate) async fn send_to(
        &self,
        participant: ParticipantId,
        frame: OutboundFrame,
        log_seq: Option<i64>,
    ) -> bool {
        let guard = self.sessions.read().await;
        match guard.get(&participant) {
            Some(handle) => handle.outbound.send(Outbound::Frame { frame, log_seq }).is_ok(),
            None => false,
        }
    }
}
