mod channel;
mod convert;
mod grpc_channel;
mod in_memory;
mod room;
mod sync;

pub use channel::{ChannelError, RoomChannel, SlotReceiver};
pub use convert::{error_from_proto, settings_from_proto, slot_from_proto, slot_to_proto};
pub use grpc_channel::GrpcRoomChannel;
pub use in_memory::{InMemoryRoomChannel, InMemoryRoomHub};
pub use room::{PlayerSnapshot, RemoteOpponentView, RoomSettings};
pub use sync::MultiplayerSync;
