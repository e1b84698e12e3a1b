//! WebSocket upgrade handler and per-connection event loop.
//!
//! # Connection Flow
//! 1. Client requests `GET /ws?uid=<id>`; the handshake layer has already
//!    resolved the identity into that parameter
//! 2. Missing or blank `uid` rejects the request before any upgrade
//! 3. On upgrade the socket is split: a writer task owns the sink half and
//!    drains the connection's outbound channel, while the read loop feeds
//!    inbound frames to the lifecycle controller
//! 4. The read loop also selects on the handle's closed signal, so a forced
//!    eviction or supersession unblocks a pending read immediately
//! 5. Every exit path deregisters the connection

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::application::ConnectionLifecycle;
use crate::domain::foundation::UserId;

use super::sink::{ChannelSink, WireFrame};

/// State shared by every relay connection.
#[derive(Clone)]
pub struct RelayState {
    /// Lifecycle controller holding the registry and router.
    pub lifecycle: Arc<ConnectionLifecycle>,
}

impl RelayState {
    /// Creates the shared state.
    pub fn new(lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self { lifecycle }
    }
}

/// Query parameters for the upgrade request.
///
/// `uid` carries the identity resolved by the handshake collaborator.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub uid: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws?uid=<id>`
///
/// A connection without a resolved identity never reaches `Open`: the
/// request is rejected here, before the upgrade, and no registry entry is
/// ever created for it.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<RelayState>,
) -> Response {
    let user = match params
        .uid
        .as_deref()
        .map(str::trim)
        .and_then(|uid| UserId::new(uid).ok())
    {
        Some(user) => user,
        None => {
            tracing::warn!("websocket handshake rejected: missing uid");
            return (StatusCode::UNAUTHORIZED, "missing uid").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

/// Runs one established connection until either side closes it.
async fn handle_socket(socket: WebSocket, user: UserId, state: RelayState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = state
        .lifecycle
        .on_open(user, Box::new(ChannelSink::new(tx)))
        .await;

    let writer = tokio::spawn(write_frames(ws_sender, rx));

    loop {
        tokio::select! {
            // A forced eviction or supersession must unblock the pending
            // read rather than wait for the peer to answer.
            _ = handle.closed() => break,

            inbound = ws_receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    state.lifecycle.on_message(&handle, &text).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(
                        user_id = %handle.user(),
                        "received unsupported binary message"
                    );
                }
                // Protocol-level ping/pong is answered by the transport.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    tracing::debug!(user_id = %handle.user(), "client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::debug!(user_id = %handle.user(), error = %e, "websocket receive error");
                    break;
                }
                None => break,
            },
        }
    }

    state.lifecycle.on_close(&handle).await;

    // Dropping our reference lets the writer drain whatever is queued
    // (including a pending close frame) and exit once every sender to this
    // connection is gone.
    drop(handle);
    let _ = writer.await;
}

/// Writer task: owns the sink half and drains the outbound channel.
async fn write_frames(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<WireFrame>,
) {
    while let Some(frame) = rx.recv().await {
        match frame {
            WireFrame::Text(text) => {
                if let Err(e) = ws_sender.send(Message::Text(text)).await {
                    tracing::debug!(error = %e, "websocket send failed");
                    break;
                }
            }
            WireFrame::Close(reason) => {
                let frame = CloseFrame {
                    code: reason.code(),
                    reason: Cow::from(reason.as_str()),
                };
                let _ = ws_sender.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
}

/// Create the axum router for the relay endpoint.
pub fn relay_router() -> Router<RelayState> {
    Router::new().route("/ws", get(ws_handler))
}
