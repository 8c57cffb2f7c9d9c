mod message_handler;
mod room_service;
mod server_config;

use clap::Parser;
use tonic::transport::Server;

use common::multiplayer::InMemoryRoomHub;
use common::proto::room_service_server::RoomServiceServer;
use common::{log, logger};
use room_service::RoomServiceImpl;

#[derive(Parser)]
#[command(name = "snake_room_server")]
struct Args {
    #[arg(long, default_value = server_config::DEFAULT_CONFIG_FILE)]
    config: String,

    #[arg(long)]
    use_log_prefix: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("RoomServer".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let config = server_config::get_config_manager(&args.config).get_config()?;
    let addr = config.socket_addr()?;
    let hub = InMemoryRoomHub::new();
    let room_service = RoomServiceImpl::new(hub.clone());

    log!("Snake room server listening on {}", addr);

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        log!("Shutdown signal received, {} room(s) open", hub.room_count());
    };

    Server::builder()
        .add_service(RoomServiceServer::new(room_service))
        .serve_with_shutdown(addr, shutdown_signal)
        .await?;

    log!("Server shut down gracefully");

    Ok(())
}
