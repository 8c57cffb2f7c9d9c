use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use common::log;
use common::multiplayer::InMemoryRoomHub;
use common::proto::room_service_server::RoomService;
use common::proto::{RoomClientMessage, RoomServerMessage};

use crate::message_handler::MessageHandler;

const CLIENT_BUFFER: usize = 128;

#[derive(Debug, Clone)]
pub struct RoomServiceImpl {
    hub: InMemoryRoomHub,
}

impl RoomServiceImpl {
    pub fn new(hub: InMemoryRoomHub) -> Self {
        Self { hub }
    }
}

#[tonic::async_trait]
impl RoomService for RoomServiceImpl {
    type RoomStreamStream = ReceiverStream<Result<RoomServerMessage, Status>>;

    async fn room_stream(
        &self,
        request: Request<tonic::Streaming<RoomClientMessage>>,
    ) -> Result<Response<Self::RoomStreamStream>, Status> {
        let peer = request
            .remote_addr()
            .map_or("unknown".to_string(), |addr| addr.to_string());
        let mut in_stream = request.into_inner();
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        let mut handler = MessageHandler::new(self.hub.connect(), tx);
        log!("Room stream opened by {}", peer);

        tokio::spawn(async move {
            while let Some(result) = in_stream.next().await {
                match result {
                    Ok(client_message) => handler.handle_message(client_message).await,
                    Err(e) => {
                        log!("Stream error from {}: {}", peer, e);
                        break;
                    }
                }
            }

            log!("Room stream closed by {}", peer);
            drop(handler);
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use common::RoomCode;
    use common::config::{GameConfig, MultiplayerConfig};
    use common::games::snake::{GridSize, Mode, Point, Settings};
    use common::session::SessionController;
    use common::multiplayer::{
        ChannelError, GrpcRoomChannel, MultiplayerSync, PlayerSnapshot, RemoteOpponentView, RoomSettings,
    };
    use common::proto::room_service_server::RoomServiceServer;
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;

    async fn spawn_server(hub: InMemoryRoomHub) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            Server::builder()
                .add_service(RoomServiceServer::new(RoomServiceImpl::new(hub)))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_two_grpc_clients_share_a_room() {
        let hub = InMemoryRoomHub::new();
        let address = spawn_server(hub.clone()).await;
        let code = RoomCode::parse("31415").unwrap();
        let room_settings = RoomSettings::from_settings(&Settings {
            mode: Mode::Speed,
            grid_size: GridSize::Size15,
            ..Settings::default()
        });

        let host_channel = Arc::new(GrpcRoomChannel::connect(address.clone()).await.unwrap());
        let mut host = MultiplayerSync::create(host_channel, code.clone(), room_settings)
            .await
            .unwrap();

        let guest_channel = Arc::new(GrpcRoomChannel::connect(address.clone()).await.unwrap());
        let (mut guest, settings) = MultiplayerSync::join(guest_channel, code.clone()).await.unwrap();
        assert_eq!(settings, room_settings);

        host.wait_for_active_opponent().await.unwrap();
        guest.wait_for_active_opponent().await.unwrap();

        let snapshot = PlayerSnapshot {
            segments: vec![Point::new(9, 7), Point::new(10, 7), Point::new(11, 7)],
            score: 10,
            active: true,
        };
        guest.publish(snapshot.clone());
        let mut view = host.opponent_view();
        while view.segments != snapshot.segments {
            view = host.opponent_changed().await.unwrap();
        }
        assert_eq!(view.score, 10);

        let third = Arc::new(GrpcRoomChannel::connect(address).await.unwrap());
        let full = MultiplayerSync::join(third, code).await;
        assert!(matches!(full, Err(ChannelError::RoomFull(_))));

        drop(guest);
        while view != RemoteOpponentView::default() {
            view = host.opponent_changed().await.unwrap();
        }
        assert_eq!(hub.room_count(), 1);
    }

    fn client_config(server_address: &str, settings: Settings) -> GameConfig {
        let mut scores_file = std::env::temp_dir();
        let random_number: u32 = rand::random();
        scores_file.push(format!("temp_snake_client_scores_{}.yaml", random_number));
        GameConfig {
            settings,
            multiplayer: MultiplayerConfig {
                server_address: server_address.to_string(),
            },
            scores_file: scores_file.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn test_configured_controllers_play_through_server() {
        let hub = InMemoryRoomHub::new();
        let address = spawn_server(hub.clone()).await;
        let host_config = client_config(
            &address,
            Settings {
                mode: Mode::Portal,
                ..Settings::default()
            },
        );
        let guest_config = client_config(&address, Settings::default());

        let mut host = SessionController::from_config(&host_config);
        let mut guest = SessionController::from_config(&guest_config);
        let host_channel = SessionController::connect_room_server(&host_config).await.unwrap();
        let guest_channel = SessionController::connect_room_server(&guest_config).await.unwrap();

        let code = host.create_room(host_channel).await.unwrap();
        guest.join_room(guest_channel, code.as_str()).await.unwrap();
        assert_eq!(guest.settings().mode, Mode::Portal);

        host.await_opponent_and_start().await.unwrap();
        guest.await_opponent_and_start().await.unwrap();
        assert!(host.is_active());
        assert!(guest.is_active());
        assert_eq!(hub.room_count(), 1);

        host.exit();
        guest.exit();
        assert!(!host.is_active());
    }
}
