pub mod proto {
    tonic::include_proto!("snake_room");
}

pub mod config;
pub mod games;
pub mod id_generator;
pub mod identifiers;
pub mod logger;
pub mod multiplayer;
pub mod session;

pub use identifiers::*;
