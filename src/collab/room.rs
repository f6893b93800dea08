//! Room actor.
//!
//! A room owns one document's live text and its member set. Everything that
//! touches that state runs inside [`run`], one event at a time, so no lock is
//! needed around it. Other tasks talk to the room through a [`RoomHandle`].

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::connection::{ConnectionId, Outbound};
use crate::db::{DocumentStore, StoreError};
use crate::models::{EditMessage, MessageKind, SERVER_AUTHOR};

/// Mailbox sizes for a room and the connections that join it.
#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    pub mailbox_capacity: usize,
    pub outbound_capacity: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            outbound_capacity: 256,
        }
    }
}

/// Point in time view of a room, taken inside its loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStats {
    pub doc_id: String,
    pub members: usize,
    pub text_len: usize,
    /// Number of accepted updates since the room started
    pub revision: u64,
}

#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub stats: RoomStats,
    pub text: String,
}

/// Events on the membership mailbox.
#[derive(Debug)]
pub enum RoomEvent {
    Register { id: ConnectionId, outbound: Outbound },
    Unregister { id: ConnectionId },
}

/// An edit read off a connection, tagged with who sent it.
#[derive(Debug)]
pub struct EditSubmitted {
    pub sender: ConnectionId,
    pub message: EditMessage,
}

/// Events on the edit mailbox. `Inspect` queues behind edits already
/// submitted, so its snapshot includes them.
#[derive(Debug)]
pub enum EditEvent {
    Submitted(EditSubmitted),
    Inspect { reply: oneshot::Sender<RoomSnapshot> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomClosed {
    /// The room task is gone. Only happens if its runtime shut down.
    Stopped,
}

impl std::fmt::Display for RoomClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room event loop has stopped")
    }
}

impl std::error::Error for RoomClosed {}

/// Cloneable address of a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    doc_id: Arc<str>,
    membership: mpsc::Sender<RoomEvent>,
    edits: mpsc::Sender<EditEvent>,
    outbound_capacity: usize,
}

impl RoomHandle {
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    /// True when both handles address the same room instance.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.membership.same_channel(&other.membership)
    }

    pub async fn register(&self, id: ConnectionId, outbound: Outbound) -> Result<(), RoomClosed> {
        self.membership
            .send(RoomEvent::Register { id, outbound })
            .await
            .map_err(|_| RoomClosed::Stopped)
    }

    pub async fn unregister(&self, id: ConnectionId) -> Result<(), RoomClosed> {
        self.membership
            .send(RoomEvent::Unregister { id })
            .await
            .map_err(|_| RoomClosed::Stopped)
    }

    pub async fn submit(&self, sender: ConnectionId, message: EditMessage) -> Result<(), RoomClosed> {
        self.edits
            .send(EditEvent::Submitted(EditSubmitted { sender, message }))
            .await
            .map_err(|_| RoomClosed::Stopped)
    }

    /// Snapshot of the room, taken after every edit submitted before this
    /// call has been applied.
    pub async fn inspect(&self) -> Result<RoomSnapshot, RoomClosed> {
        let (reply, rx) = oneshot::channel();
        self.edits
            .send(EditEvent::Inspect { reply })
            .await
            .map_err(|_| RoomClosed::Stopped)?;
        rx.await.map_err(|_| RoomClosed::Stopped)
    }
}

/// State owned by the room task.
struct Room {
    doc_id: Arc<str>,
    text: String,
    revision: u64,
    members: HashMap<ConnectionId, Outbound>,
    store: Arc<dyn DocumentStore>,
    /// Latest accepted text, picked up by the room's persistence worker.
    pending: watch::Sender<Option<Arc<str>>>,
}

/// Start a room's event loop on the current runtime and return its handle.
pub fn spawn(doc_id: &str, store: Arc<dyn DocumentStore>, settings: RoomSettings) -> RoomHandle {
    let doc_id: Arc<str> = Arc::from(doc_id);
    let (membership_tx, membership_rx) = mpsc::channel(settings.mailbox_capacity.max(1));
    let (edits_tx, edits_rx) = mpsc::channel(settings.mailbox_capacity.max(1));
    let (pending_tx, pending_rx) = watch::channel(None);

    tokio::spawn(persist_worker(doc_id.clone(), store.clone(), pending_rx));

    let room = Room {
        doc_id: doc_id.clone(),
        text: String::new(),
        revision: 0,
        members: HashMap::new(),
        store,
        pending: pending_tx,
    };
    tokio::spawn(run(room, membership_rx, edits_rx));

    RoomHandle {
        doc_id,
        membership: membership_tx,
        edits: edits_tx,
        outbound_capacity: settings.outbound_capacity.max(1),
    }
}

async fn run(
    mut room: Room,
    mut membership: mpsc::Receiver<RoomEvent>,
    mut edits: mpsc::Receiver<EditEvent>,
) {
    room.hydrate().await;
    info!("Room {} started with {} bytes of text", room.doc_id, room.text.len());

    loop {
        tokio::select! {
            // Membership first: a connection's Register is queued before its
            // read pump starts, so it is always seen before that pump's edits.
            biased;
            Some(event) = membership.recv() => room.handle_event(event),
            Some(event) = edits.recv() => match event {
                EditEvent::Submitted(edit) => room.handle_edit(edit),
                EditEvent::Inspect { reply } => {
                    let _ = reply.send(room.snapshot());
                }
            },
            else => break,
        }
    }

    debug!("Room {} mailboxes closed", room.doc_id);
}

/// Write accepted text to the store one update at a time. Texts accepted
/// while a write is in flight collapse into the newest, so the store only
/// ever moves forward. Exits once the room is dropped and the last text is
/// written.
async fn persist_worker(
    doc_id: Arc<str>,
    store: Arc<dyn DocumentStore>,
    mut pending: watch::Receiver<Option<Arc<str>>>,
) {
    while pending.changed().await.is_ok() {
        let latest = pending.borrow_and_update().clone();
        let Some(text) = latest else {
            continue;
        };
        if let Err(e) = store.update_document(&doc_id, &text).await {
            error!("Failed to update document {}: {}", doc_id, e);
        }
    }
    debug!("Persistence worker for room {} stopped", doc_id);
}

impl Room {
    async fn hydrate(&mut self) {
        match self.store.get_document(&self.doc_id).await {
            Ok(doc) => self.text = doc.content,
            Err(StoreError::NotFound) => {
                debug!("No stored document for room {}, starting empty", self.doc_id);
            }
            Err(e) => {
                error!("Failed to load document {} for room: {}", self.doc_id, e);
            }
        }
    }

    fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Register { id, outbound } => self.register(id, outbound),
            RoomEvent::Unregister { id } => self.unregister(id),
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            stats: self.stats(),
            text: self.text.clone(),
        }
    }

    fn register(&mut self, id: ConnectionId, outbound: Outbound) {
        let sync = EditMessage::sync(&self.doc_id, &self.text, SERVER_AUTHOR);
        let frame = match serde_json::to_string(&sync) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode sync message for room {}: {}", self.doc_id, e);
                return;
            }
        };

        // A fresh mailbox can only refuse if the write pump is already gone.
        if outbound.try_send(Arc::from(frame)).is_err() {
            warn!("Connection {} went away before joining room {}", id, self.doc_id);
            return;
        }

        self.members.insert(id, outbound);
        info!("Client {} joined room {}. Total clients: {}", id, self.doc_id, self.members.len());
    }

    /// Dropping the stored sender closes the outbound mailbox. Unknown ids
    /// are ignored so a second unregister is a no-op.
    fn unregister(&mut self, id: ConnectionId) {
        if self.members.remove(&id).is_some() {
            info!("Client {} left room {}. Total clients: {}", id, self.doc_id, self.members.len());
        }
    }

    fn handle_edit(&mut self, edit: EditSubmitted) {
        let EditSubmitted { sender, message } = edit;
        if message.kind != MessageKind::Update {
            debug!("Ignoring {:?} message from {} in room {}", message.kind, sender, self.doc_id);
            return;
        }

        self.text = message.text;
        self.revision += 1;
        self.persist();

        let sync = EditMessage::sync(&self.doc_id, &self.text, &message.user_id);
        match serde_json::to_string(&sync) {
            Ok(frame) => self.broadcast(Arc::from(frame)),
            Err(e) => error!("Failed to encode sync message for room {}: {}", self.doc_id, e),
        }
    }

    /// Hand the new text to the persistence worker without waiting on it.
    fn persist(&self) {
        self.pending.send_replace(Some(Arc::from(self.text.as_str())));
    }

    /// Deliver to every member without blocking. Members whose mailbox is
    /// full or closed are dropped in the same step.
    fn broadcast(&mut self, frame: Arc<str>) {
        let doc_id = &self.doc_id;
        self.members.retain(|id, outbound| match outbound.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Evicting slow client {} from room {}", id, doc_id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping closed client {} from room {}", id, doc_id);
                false
            }
        });
        debug!("Broadcast revision {} of room {} to {} clients", self.revision, self.doc_id, self.members.len());
    }

    fn stats(&self) -> RoomStats {
        RoomStats {
            doc_id: self.doc_id.to_string(),
            members: self.members.len(),
            text_len: self.text.len(),
            revision: self.revision,
        }
    }
}
