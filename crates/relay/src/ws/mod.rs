pub mod delivery;
pub mod handler;
mod protocol;
pub mod session;

use axum::{routing::get, Router};

use crate::state::RelayState;

pub fn router(state: RelayState) -> Router {
    Router::new().route("/ws/{user_id}", get(handler::ws_upgrade)).with_state(state)
}
