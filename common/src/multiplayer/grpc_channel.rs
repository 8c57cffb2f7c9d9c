use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Streaming;

use crate::proto::room_client_message::Message as ClientMessage;
use crate::proto::room_server_message::Message as ServerMessage;
use crate::proto::room_service_client::RoomServiceClient;
use crate::{PlayerSlot, RoomCode, log, log_warn, proto};
use super::channel::{ChannelError, RoomChannel, SlotReceiver};
use super::convert::{error_from_proto, settings_from_proto, slot_from_proto, slot_to_proto};
use super::room::{PlayerSnapshot, RoomSettings};

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<ServerMessage>>>>;
type SlotFeeds = Arc<Mutex<HashMap<(RoomCode, PlayerSlot), watch::Sender<Option<PlayerSnapshot>>>>>;

const OUTGOING_BUFFER: usize = 128;

/// [`RoomChannel`] backed by a relay server over one bidirectional stream.
///
/// Dropping the channel closes the stream, which makes the server release
/// every slot registered through `release_slot_on_disconnect`.
pub struct GrpcRoomChannel {
    outgoing: mpsc::Sender<proto::RoomClientMessage>,
    next_request_id: AtomicU64,
    pending: PendingReplies,
    feeds: SlotFeeds,
    reader: JoinHandle<()>,
}

impl GrpcRoomChannel {
    pub async fn connect(server_address: String) -> Result<Self, ChannelError> {
        let mut client = RoomServiceClient::connect(server_address.clone()).await?;
        let (outgoing, rx) = mpsc::channel(OUTGOING_BUFFER);
        let incoming = client.room_stream(ReceiverStream::new(rx)).await?.into_inner();
        log!("Connected to room server at {}", server_address);

        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let feeds: SlotFeeds = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_server_messages(incoming, pending.clone(), feeds.clone()));

        Ok(Self {
            outgoing,
            next_request_id: AtomicU64::new(1),
            pending,
            feeds,
            reader,
        })
    }

    async fn request(&self, message: ClientMessage) -> Result<ServerMessage, ChannelError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| unavailable("pending reply lock poisoned"))?
            .insert(request_id, reply_tx);

        self.send(request_id, message).await?;
        reply_rx.await.map_err(|_| unavailable("connection to room server closed"))
    }

    async fn send(&self, request_id: u64, message: ClientMessage) -> Result<(), ChannelError> {
        self.outgoing
            .send(proto::RoomClientMessage {
                request_id,
                message: Some(message),
            })
            .await
            .map_err(|_| unavailable("connection to room server closed"))
    }
}

impl Drop for GrpcRoomChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn unavailable(reason: &str) -> ChannelError {
    ChannelError::Unavailable(reason.to_string())
}

fn expect_accepted(reply: ServerMessage, code: &RoomCode) -> Result<(), ChannelError> {
    match reply {
        ServerMessage::Accepted(_) | ServerMessage::RoomCreated(_) => Ok(()),
        ServerMessage::Error(error) => Err(error_from_proto(&error, code.as_str())),
        other => Err(ChannelError::Unavailable(format!("unexpected reply {:?}", other))),
    }
}

async fn read_server_messages(
    mut incoming: Streaming<proto::RoomServerMessage>,
    pending: PendingReplies,
    feeds: SlotFeeds,
) {
    loop {
        match incoming.message().await {
            Ok(Some(server_message)) => {
                let Some(message) = server_message.message else {
                    continue;
                };
                if let ServerMessage::PeerSnapshot(peer) = message {
                    apply_peer_snapshot(peer, &feeds);
                } else if server_message.request_id == 0 {
                    log_warn!("Room server reported: {:?}", message);
                } else if let Some(reply) = pending
                    .lock()
                    .ok()
                    .and_then(|mut p| p.remove(&server_message.request_id))
                {
                    let _ = reply.send(message);
                }
            }
            Ok(None) => {
                log!("Room server closed the stream");
                break;
            }
            Err(status) => {
                log_warn!("Room stream error: {}", status);
                break;
            }
        }
    }

    // Waiting requests observe a closed connection.
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
}

fn apply_peer_snapshot(peer: proto::PeerSnapshot, feeds: &SlotFeeds) {
    let (Some(code), Some(slot)) = (RoomCode::parse(&peer.code), slot_from_proto(peer.slot)) else {
        log_warn!("Dropping peer snapshot for room '{}'", peer.code);
        return;
    };
    let Ok(feeds) = feeds.lock() else {
        return;
    };
    if let Some(feed) = feeds.get(&(code, slot)) {
        feed.send_replace(peer.snapshot.map(PlayerSnapshot::from));
    }
}

impl RoomChannel for GrpcRoomChannel {
    async fn create_room(&self, code: &RoomCode, settings: RoomSettings) -> Result<(), ChannelError> {
        let reply = self
            .request(ClientMessage::CreateRoom(proto::CreateRoomRequest {
                code: code.to_string(),
                settings: Some(settings.into()),
            }))
            .await?;
        expect_accepted(reply, code)
    }

    async fn join_room(&self, code: &RoomCode) -> Result<RoomSettings, ChannelError> {
        let reply = self
            .request(ClientMessage::JoinRoom(proto::JoinRoomRequest {
                code: code.to_string(),
            }))
            .await?;
        match reply {
            ServerMessage::RoomJoined(joined) => joined
                .settings
                .as_ref()
                .and_then(settings_from_proto)
                .ok_or_else(|| unavailable("room server sent unknown settings")),
            ServerMessage::Error(error) => Err(error_from_proto(&error, code.as_str())),
            other => Err(ChannelError::Unavailable(format!("unexpected reply {:?}", other))),
        }
    }

    /// Sent without waiting for a reply; failures arrive later as unsolicited errors.
    async fn publish_snapshot(
        &self,
        code: &RoomCode,
        slot: PlayerSlot,
        snapshot: PlayerSnapshot,
    ) -> Result<(), ChannelError> {
        self.send(
            0,
            ClientMessage::Publish(proto::PublishRequest {
                code: code.to_string(),
                slot: slot_to_proto(slot),
                snapshot: Some((&snapshot).into()),
            }),
        )
        .await
    }

    async fn subscribe(&self, code: &RoomCode, slot: PlayerSlot) -> Result<SlotReceiver, ChannelError> {
        let receiver = self
            .feeds
            .lock()
            .map_err(|_| unavailable("slot feed lock poisoned"))?
            .entry((code.clone(), slot))
            .or_insert_with(|| watch::Sender::new(None))
            .subscribe();

        let reply = self
            .request(ClientMessage::Subscribe(proto::SubscribeRequest {
                code: code.to_string(),
                slot: slot_to_proto(slot),
            }))
            .await?;
        expect_accepted(reply, code)?;
        Ok(receiver)
    }

    async fn release_slot_on_disconnect(&self, code: &RoomCode, slot: PlayerSlot) -> Result<(), ChannelError> {
        let reply = self
            .request(ClientMessage::ReleaseOnDisconnect(proto::ReleaseOnDisconnectRequest {
                code: code.to_string(),
                slot: slot_to_proto(slot),
            }))
            .await?;
        expect_accepted(reply, code)
    }
}
