//! In-memory collaboration engine: rooms, their registry, and the
//! per-connection pumps.

pub mod connection;
pub mod hub;
pub mod room;

pub use connection::{accept_connection, ConnectionId};
pub use hub::Hub;
pub use room::{RoomHandle, RoomSettings, RoomStats};
