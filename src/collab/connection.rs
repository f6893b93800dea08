//! Connection pumps.
//!
//! Each connection runs a read pump (socket -> room) and a write pump
//! (outbound mailbox -> socket) as separate tasks. They never share state;
//! the read pump only talks to the room's edit mailbox and the write pump
//! only drains its own outbound mailbox.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::hub::Hub;
use super::room::RoomHandle;
use crate::models::EditMessage;

/// Sending half of a connection's outbound mailbox. The room holds the only
/// copy, so dropping it closes the mailbox.
pub type Outbound = mpsc::Sender<Arc<str>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Join an upgraded socket to the room for `doc_id` and run it until the
/// connection ends.
pub async fn accept_connection(hub: Arc<Hub>, doc_id: String, socket: WebSocket) {
    let room = hub.get_or_create_room(&doc_id);
    let (sink, stream) = socket.split();
    serve(room, sink, stream).await;
}

/// Register a connection with `room`, run both pumps, and send exactly one
/// unregister once either pump has ended.
pub async fn serve<W, R, E>(room: RoomHandle, sink: W, stream: R)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let id = ConnectionId::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(room.outbound_capacity());

    if let Err(e) = room.register(id, outbound_tx).await {
        error!("Failed to register connection {} with room {}: {}", id, room.doc_id(), e);
        return;
    }
    info!("WebSocket connection {} established for document {}", id, room.doc_id());

    let mut write_task = tokio::spawn(write_pump(id, sink, outbound_rx));
    let mut read_task = tokio::spawn(read_pump(id, stream, room.clone()));

    tokio::select! {
        _ = &mut read_task => {
            // The room closes the outbound mailbox, which ends the write pump.
            let _ = room.unregister(id).await;
            let _ = write_task.await;
        }
        _ = &mut write_task => {
            read_task.abort();
            let _ = room.unregister(id).await;
        }
    }

    info!("WebSocket connection {} terminated", id);
}

/// Forward decoded edits to the room until the transport closes or fails.
pub async fn read_pump<R, E>(id: ConnectionId, mut stream: R, room: RoomHandle)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = stream.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Dropping non UTF-8 frame from {}: {}", id, e);
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                debug!("Connection {} sent close", id);
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                debug!("Read error on connection {}: {}", id, e);
                break;
            }
        };

        let message: EditMessage = match serde_json::from_str(&payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse message from {} for document {}: {}", id, room.doc_id(), e);
                continue;
            }
        };
        debug!("Received {:?} from {} in room {}", message.kind, id, room.doc_id());

        if room.submit(id, message).await.is_err() {
            break;
        }
    }
}

/// Drain the outbound mailbox to the transport. Ends when the room closes
/// the mailbox or a write fails, and closes the transport either way.
pub async fn write_pump<W>(id: ConnectionId, mut sink: W, mut outbound: mpsc::Receiver<Arc<str>>)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(frame.to_string())).await {
            warn!("Write error on connection {}: {}", id, e);
            break;
        }
    }
    let _ = sink.close().await;
}
