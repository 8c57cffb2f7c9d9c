use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{PlayerSlot, RoomCode, log, log_warn};
use super::channel::{ChannelError, RoomChannel, SlotReceiver};
use super::room::{PlayerSnapshot, RemoteOpponentView, RoomSettings};

/// Bridges the local simulation and a room: pushes our snapshot out, mirrors the peer's in.
///
/// Publishing never waits on the channel. Snapshots are queued to a background
/// task that forwards the newest one it has, so a slow channel drops
/// intermediate frames instead of stalling ticks.
pub struct MultiplayerSync<C: RoomChannel> {
    /// Held so the connection, and with it our slot, lives as long as this value.
    _connection: Arc<C>,
    code: RoomCode,
    slot: PlayerSlot,
    outgoing: mpsc::UnboundedSender<PlayerSnapshot>,
    opponent: SlotReceiver,
}

impl<C: RoomChannel> MultiplayerSync<C> {
    /// Registers the room with `settings` and claims player one.
    pub async fn create(channel: Arc<C>, code: RoomCode, settings: RoomSettings) -> Result<Self, ChannelError> {
        channel.create_room(&code, settings).await?;
        Self::attach(channel, code, PlayerSlot::PlayerOne).await
    }

    /// Claims player two and returns the host's settings.
    pub async fn join(channel: Arc<C>, code: RoomCode) -> Result<(Self, RoomSettings), ChannelError> {
        let settings = channel.join_room(&code).await?;
        let sync = Self::attach(channel, code, PlayerSlot::PlayerTwo).await?;
        Ok((sync, settings))
    }

    async fn attach(channel: Arc<C>, code: RoomCode, slot: PlayerSlot) -> Result<Self, ChannelError> {
        channel.release_slot_on_disconnect(&code, slot).await?;
        let opponent = channel.subscribe(&code, slot.other()).await?;

        let (outgoing, rx) = mpsc::unbounded_channel();
        tokio::spawn(publish_loop(channel.clone(), code.clone(), slot, rx));
        log!("Room {}: playing as {}", code, slot);

        Ok(Self {
            _connection: channel,
            code,
            slot,
            outgoing,
            opponent,
        })
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn slot(&self) -> PlayerSlot {
        self.slot
    }

    /// Best effort and at most once per call.
    pub fn publish(&self, snapshot: PlayerSnapshot) {
        let _ = self.outgoing.send(snapshot);
    }

    pub fn opponent_view(&self) -> RemoteOpponentView {
        RemoteOpponentView::from(self.opponent.borrow().as_ref())
    }

    /// Resolves on the next peer update. Errors once the room is gone.
    pub async fn opponent_changed(&mut self) -> Result<RemoteOpponentView, ChannelError> {
        self.opponent
            .changed()
            .await
            .map_err(|_| ChannelError::RoomNotFound(self.code.clone()))?;
        Ok(RemoteOpponentView::from(self.opponent.borrow_and_update().as_ref()))
    }

    /// Rendezvous: resolves as soon as the peer's slot holds an active snapshot.
    pub async fn wait_for_active_opponent(&mut self) -> Result<(), ChannelError> {
        self.opponent
            .wait_for(|snapshot| snapshot.as_ref().is_some_and(|s| s.active))
            .await
            .map(|_| ())
            .map_err(|_| ChannelError::RoomNotFound(self.code.clone()))
    }
}

async fn publish_loop<C: RoomChannel>(
    channel: Arc<C>,
    code: RoomCode,
    slot: PlayerSlot,
    mut rx: mpsc::UnboundedReceiver<PlayerSnapshot>,
) {
    let mut failure_reported = false;
    while let Some(mut latest) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            latest = newer;
        }
        if let Err(e) = channel.publish_snapshot(&code, slot, latest).await
            && !failure_reported
        {
            log_warn!("Room {}: publishing {} failed: {}", code, slot, e);
            failure_reported = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::snake::{Point, Settings};
    use crate::multiplayer::InMemoryRoomHub;

    fn room_settings() -> RoomSettings {
        RoomSettings::from_settings(&Settings::default())
    }

    #[tokio::test]
    async fn test_peer_sees_exact_published_segments() {
        let hub = InMemoryRoomHub::new();
        let code = RoomCode::parse("13579").unwrap();
        let host = MultiplayerSync::create(Arc::new(hub.connect()), code.clone(), room_settings())
            .await
            .unwrap();
        let (mut guest, settings) = MultiplayerSync::join(Arc::new(hub.connect()), code).await.unwrap();
        assert_eq!(settings, room_settings());

        let snapshot = PlayerSnapshot {
            segments: vec![Point::new(8, 12), Point::new(7, 12), Point::new(6, 12), Point::new(5, 12)],
            score: 20,
            active: true,
        };
        host.publish(snapshot.clone());

        let view = guest.opponent_changed().await.unwrap();
        assert_eq!(view.segments, snapshot.segments);
        assert_eq!(view.score, 20);
        assert_eq!(guest.opponent_view().segments, snapshot.segments);
    }

    #[tokio::test]
    async fn test_both_sides_rendezvous_on_active_peer() {
        let hub = InMemoryRoomHub::new();
        let code = RoomCode::parse("11111").unwrap();
        let mut host = MultiplayerSync::create(Arc::new(hub.connect()), code.clone(), room_settings())
            .await
            .unwrap();
        assert!(!host.opponent_view().active);

        let (mut guest, _) = MultiplayerSync::join(Arc::new(hub.connect()), code).await.unwrap();

        host.wait_for_active_opponent().await.unwrap();
        guest.wait_for_active_opponent().await.unwrap();
        assert_eq!(host.slot(), PlayerSlot::PlayerOne);
        assert_eq!(guest.slot(), PlayerSlot::PlayerTwo);
    }

    #[tokio::test]
    async fn test_disconnect_clears_opponent_view() {
        let hub = InMemoryRoomHub::new();
        let code = RoomCode::parse("22222").unwrap();
        let host = MultiplayerSync::create(Arc::new(hub.connect()), code.clone(), room_settings())
            .await
            .unwrap();
        let (mut guest, _) = MultiplayerSync::join(Arc::new(hub.connect()), code).await.unwrap();
        assert!(guest.opponent_view().active);

        drop(host);

        let view = guest.opponent_changed().await.unwrap();
        assert_eq!(view, RemoteOpponentView::default());
    }

    #[tokio::test]
    async fn test_join_unknown_room_fails() {
        let hub = InMemoryRoomHub::new();
        let code = RoomCode::parse("99999").unwrap();
        let result = MultiplayerSync::join(Arc::new(hub.connect()), code.clone()).await;
        assert!(matches!(result, Err(ChannelError::RoomNotFound(c)) if c == code));
    }
}
