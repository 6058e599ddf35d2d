use axum::extract::ws::{CloseFrame, Message, WebSocket};
use pairchat_common::protocol::ws::{encode_outbound, OutboundFrame};

use crate::error::ErrorCode;

pub(crate) async fn send_frame(socket: &mut WebSocket, frame: &OutboundFrame) -> Result<(), ()> {
    let encoded = encode_outbound(frame).map_err(|_| ())?;
    socket.send(Message::Text(encoded.into())).await.map_err(|_| ())
}

pub(crate) async fn send_close(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket.send(Message::Close(Some(CloseFrame { code, reason: reason.into() }))).await;
}

pub(crate) fn error_frame(code: ErrorCode) -> OutboundFrame {
    OutboundFrame::error(code.as_str(), code.default_message(), code.retryable())
}
