use std::sync::Arc;

use crate::{
    store::MessageStore,
    ws::{delivery::DeliveryRouter, session::SessionRegistry},
};

/// Process-wide state shared by the WebSocket and admin routes.
#[derive(Clone)]
pub struct RelayState {
    pub registry: Arc<SessionRegistry>,
    pub store: MessageStore,
    pub history_limit: usize,
}

impl RelayState {
    pub fn new(store: MessageStore, history_limit: usize) -> Self {
        Self { registry: Arc::new(SessionRegistry::default()), store, history_limit }
    }

    pub fn delivery(&self) -> DeliveryRouter {
        DeliveryRouter::new(Arc::clone(&self.registry), self.store.clone())
    }

    #[cfg(test)]
    pub(crate) fn in_memory_for_tests() -> Self {
        Self::new(MessageStore::in_memory(), crate::config::DEFAULT_HISTORY_LIMIT)
    }
}
