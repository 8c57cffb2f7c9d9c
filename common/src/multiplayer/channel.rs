use std::fmt;
use std::future::Future;

use tokio::sync::watch;

use crate::{PlayerSlot, RoomCode};
use super::room::{PlayerSnapshot, RoomSettings};

/// Latest snapshot of one slot. `None` while the slot is free.
pub type SlotReceiver = watch::Receiver<Option<PlayerSnapshot>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    InvalidRoomCode(String),
    RoomAlreadyExists(RoomCode),
    RoomNotFound(RoomCode),
    RoomFull(RoomCode),
    Unavailable(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::InvalidRoomCode(code) => write!(f, "Invalid room code '{}'", code),
            ChannelError::RoomAlreadyExists(code) => write!(f, "Room {} already exists", code),
            ChannelError::RoomNotFound(code) => write!(f, "Room {} not found", code),
            ChannelError::RoomFull(code) => write!(f, "Room {} is full", code),
            ChannelError::Unavailable(reason) => write!(f, "Room channel unavailable: {}", reason),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<tonic::Status> for ChannelError {
    fn from(status: tonic::Status) -> Self {
        ChannelError::Unavailable(status.message().to_string())
    }
}

impl From<tonic::transport::Error> for ChannelError {
    fn from(error: tonic::transport::Error) -> Self {
        ChannelError::Unavailable(error.to_string())
    }
}

/// The shared realtime store two clients rendezvous through.
///
/// Each client writes only its own slot. `create_room` claims player one and
/// `join_room` claims player two; both seed the slot with
/// [`PlayerSnapshot::joined`].
pub trait RoomChannel: Send + Sync + 'static {
    fn create_room(
        &self,
        code: &RoomCode,
        settings: RoomSettings,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn join_room(&self, code: &RoomCode) -> impl Future<Output = Result<RoomSettings, ChannelError>> + Send;

    fn publish_snapshot(
        &self,
        code: &RoomCode,
        slot: PlayerSlot,
        snapshot: PlayerSnapshot,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn subscribe(
        &self,
        code: &RoomCode,
        slot: PlayerSlot,
    ) -> impl Future<Output = Result<SlotReceiver, ChannelError>> + Send;

    /// Arranges for `slot` to be cleared when this channel's connection goes away.
    fn release_slot_on_disconnect(
        &self,
        code: &RoomCode,
        slot: PlayerSlot,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}
