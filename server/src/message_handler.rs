use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tonic::Status;

use common::multiplayer::{
    ChannelError, InMemoryRoomChannel, PlayerSnapshot, RoomChannel, SlotReceiver, settings_from_proto,
    slot_from_proto, slot_to_proto,
};
use common::proto::room_client_message::Message as ClientMessage;
use common::proto::room_server_message::Message as ServerMessage;
use common::proto::{self, RoomClientMessage, RoomServerMessage};
use common::{PlayerSlot, RoomCode, log};

pub type ClientSender = mpsc::Sender<Result<RoomServerMessage, Status>>;

/// Serves one client stream against the shared hub.
///
/// Dropping the handler drops its hub connection, which releases every slot
/// the client registered for release, and stops its subscription forwarders.
pub struct MessageHandler {
    channel: InMemoryRoomChannel,
    tx: ClientSender,
    forwarders: Vec<JoinHandle<()>>,
}

impl MessageHandler {
    pub fn new(channel: InMemoryRoomChannel, tx: ClientSender) -> Self {
        Self {
            channel,
            tx,
            forwarders: Vec::new(),
        }
    }

    pub async fn handle_message(&mut self, client_message: RoomClientMessage) {
        let request_id = client_message.request_id;
        let Some(message) = client_message.message else {
            return;
        };

        let reply = match message {
            ClientMessage::CreateRoom(req) => self.handle_create_room(req).await,
            ClientMessage::JoinRoom(req) => self.handle_join_room(req).await,
            ClientMessage::Publish(req) => self.handle_publish(req).await,
            ClientMessage::Subscribe(req) => self.handle_subscribe(req).await,
            ClientMessage::ReleaseOnDisconnect(req) => self.handle_release(req).await,
        };

        let reply = match reply {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                log!("Request {} failed: {}", request_id, e);
                ServerMessage::Error(proto::RoomError::from(&e))
            }
        };
        send_to_client(
            &self.tx,
            RoomServerMessage {
                request_id,
                message: Some(reply),
            },
        )
        .await;
    }

    async fn handle_create_room(&self, req: proto::CreateRoomRequest) -> Result<Option<ServerMessage>, ChannelError> {
        let code = parse_code(&req.code)?;
        let settings = req
            .settings
            .as_ref()
            .and_then(settings_from_proto)
            .ok_or_else(|| ChannelError::Unavailable("unknown room settings".to_string()))?;
        self.channel.create_room(&code, settings).await?;
        Ok(Some(ServerMessage::RoomCreated(proto::RoomCreated { code: req.code })))
    }

    async fn handle_join_room(&self, req: proto::JoinRoomRequest) -> Result<Option<ServerMessage>, ChannelError> {
        let code = parse_code(&req.code)?;
        let settings = self.channel.join_room(&code).await?;
        Ok(Some(ServerMessage::RoomJoined(proto::RoomJoined {
            code: req.code,
            settings: Some(settings.into()),
        })))
    }

    /// Publishes are never acknowledged, only failures are reported.
    async fn handle_publish(&self, req: proto::PublishRequest) -> Result<Option<ServerMessage>, ChannelError> {
        let code = parse_code(&req.code)?;
        let slot = parse_slot(req.slot)?;
        let snapshot = req.snapshot.map(PlayerSnapshot::from).unwrap_or_default();
        self.channel.publish_snapshot(&code, slot, snapshot).await?;
        Ok(None)
    }

    async fn handle_subscribe(&mut self, req: proto::SubscribeRequest) -> Result<Option<ServerMessage>, ChannelError> {
        let code = parse_code(&req.code)?;
        let slot = parse_slot(req.slot)?;
        let feed = self.channel.subscribe(&code, slot).await?;
        self.forwarders.retain(|f| !f.is_finished());
        self.forwarders
            .push(spawn_forwarder(code, slot, feed, self.tx.clone()));
        Ok(Some(ServerMessage::Accepted(proto::RequestAccepted {})))
    }

    async fn handle_release(&self, req: proto::ReleaseOnDisconnectRequest) -> Result<Option<ServerMessage>, ChannelError> {
        let code = parse_code(&req.code)?;
        let slot = parse_slot(req.slot)?;
        self.channel.release_slot_on_disconnect(&code, slot).await?;
        Ok(Some(ServerMessage::Accepted(proto::RequestAccepted {})))
    }
}

impl Drop for MessageHandler {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
    }
}

fn parse_code(code: &str) -> Result<RoomCode, ChannelError> {
    RoomCode::parse(code).ok_or_else(|| ChannelError::InvalidRoomCode(code.to_string()))
}

fn parse_slot(slot: i32) -> Result<PlayerSlot, ChannelError> {
    slot_from_proto(slot).ok_or_else(|| ChannelError::Unavailable(format!("unknown player slot {}", slot)))
}

/// Pushes the slot's current value, then every change, until either side goes away.
fn spawn_forwarder(code: RoomCode, slot: PlayerSlot, mut feed: SlotReceiver, tx: ClientSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let snapshot = feed.borrow_and_update().as_ref().map(proto::PlayerSnapshot::from);
            let message = RoomServerMessage {
                request_id: 0,
                message: Some(ServerMessage::PeerSnapshot(proto::PeerSnapshot {
                    code: code.to_string(),
                    slot: slot_to_proto(slot),
                    snapshot,
                })),
            };
            if tx.send(Ok(message)).await.is_err() {
                break;
            }
            if feed.changed().await.is_err() {
                break;
            }
        }
    })
}

pub async fn send_to_client(tx: &ClientSender, message: RoomServerMessage) {
    if let Err(e) = tx.send(Ok(message)).await {
        log!("Failed to send message to client: {}", e);
    }
}
