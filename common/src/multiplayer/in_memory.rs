use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::{PlayerSlot, RoomCode, log};
use super::channel::{ChannelError, RoomChannel, SlotReceiver};
use super::room::{PlayerSnapshot, RoomSettings};

struct Room {
    settings: RoomSettings,
    slots: [watch::Sender<Option<PlayerSnapshot>>; 2],
}

impl Room {
    fn new(settings: RoomSettings) -> Self {
        Self {
            settings,
            slots: [watch::Sender::new(None), watch::Sender::new(None)],
        }
    }

    fn slot(&self, slot: PlayerSlot) -> &watch::Sender<Option<PlayerSnapshot>> {
        &self.slots[slot.index()]
    }

    fn is_occupied(&self, slot: PlayerSlot) -> bool {
        self.slot(slot).borrow().is_some()
    }

    fn is_empty(&self) -> bool {
        PlayerSlot::ALL.iter().all(|slot| !self.is_occupied(*slot))
    }
}

/// Process-local system of record for rooms. Cloning shares the same rooms.
#[derive(Clone, Default)]
pub struct InMemoryRoomHub {
    rooms: Arc<Mutex<HashMap<RoomCode, Room>>>,
}

impl std::fmt::Debug for InMemoryRoomHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRoomHub").finish()
    }
}

impl InMemoryRoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new connection to this hub, with its own set of slots to release on drop.
    pub fn connect(&self) -> InMemoryRoomChannel {
        InMemoryRoomChannel {
            hub: self.clone(),
            claimed: Mutex::new(HashSet::new()),
            release_on_drop: Mutex::new(HashSet::new()),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms().map(|rooms| rooms.len()).unwrap_or(0)
    }

    fn rooms(&self) -> Result<MutexGuard<'_, HashMap<RoomCode, Room>>, ChannelError> {
        self.rooms
            .lock()
            .map_err(|_| ChannelError::Unavailable("room hub lock poisoned".to_string()))
    }

    pub fn create_room(&self, code: &RoomCode, settings: RoomSettings) -> Result<(), ChannelError> {
        let mut rooms = self.rooms()?;
        if let Some(room) = rooms.get(code)
            && room.is_occupied(PlayerSlot::PlayerOne)
        {
            return Err(ChannelError::RoomAlreadyExists(code.clone()));
        }

        let room = rooms.entry(code.clone()).or_insert_with(|| Room::new(settings));
        room.settings = settings;
        room.slot(PlayerSlot::PlayerOne).send_replace(Some(PlayerSnapshot::joined()));
        log!("Room {} created", code);
        Ok(())
    }

    pub fn join_room(&self, code: &RoomCode) -> Result<RoomSettings, ChannelError> {
        let rooms = self.rooms()?;
        let room = rooms
            .get(code)
            .ok_or_else(|| ChannelError::RoomNotFound(code.clone()))?;
        if room.is_occupied(PlayerSlot::PlayerTwo) {
            return Err(ChannelError::RoomFull(code.clone()));
        }

        room.slot(PlayerSlot::PlayerTwo).send_replace(Some(PlayerSnapshot::joined()));
        log!("Room {} joined", code);
        Ok(room.settings)
    }

    pub fn publish(&self, code: &RoomCode, slot: PlayerSlot, snapshot: PlayerSnapshot) -> Result<(), ChannelError> {
        let rooms = self.rooms()?;
        let room = rooms
            .get(code)
            .ok_or_else(|| ChannelError::RoomNotFound(code.clone()))?;
        room.slot(slot).send_replace(Some(snapshot));
        Ok(())
    }

    pub fn subscribe(&self, code: &RoomCode, slot: PlayerSlot) -> Result<SlotReceiver, ChannelError> {
        let rooms = self.rooms()?;
        let room = rooms
            .get(code)
            .ok_or_else(|| ChannelError::RoomNotFound(code.clone()))?;
        Ok(room.slot(slot).subscribe())
    }

    /// Clears `slot`; the room is dropped once neither slot is occupied.
    pub fn release_slot(&self, code: &RoomCode, slot: PlayerSlot) {
        let Ok(mut rooms) = self.rooms() else {
            return;
        };
        let Some(room) = rooms.get(code) else {
            return;
        };

        room.slot(slot).send_replace(None);
        log!("Room {} released slot {}", code, slot);
        if room.is_empty() {
            rooms.remove(code);
            log!("Room {} closed", code);
        }
    }
}

type SlotKeys = Mutex<HashSet<(RoomCode, PlayerSlot)>>;

/// One client's handle on an [`InMemoryRoomHub`].
///
/// A connection may only write or release the slots it claimed through
/// `create_room` or `join_room`. Reading any slot is allowed.
pub struct InMemoryRoomChannel {
    hub: InMemoryRoomHub,
    claimed: SlotKeys,
    release_on_drop: SlotKeys,
}

impl InMemoryRoomChannel {
    /// Releases every registered slot now, as if the connection dropped.
    pub fn disconnect(&self) {
        let registered: Vec<(RoomCode, PlayerSlot)> = match self.release_on_drop.lock() {
            Ok(mut slots) => slots.drain().collect(),
            Err(_) => return,
        };
        if let Ok(mut claimed) = self.claimed.lock() {
            claimed.clear();
        }
        for (code, slot) in registered {
            self.hub.release_slot(&code, slot);
        }
    }

    fn claim(&self, code: &RoomCode, slot: PlayerSlot) -> Result<(), ChannelError> {
        self.claimed
            .lock()
            .map_err(|_| ChannelError::Unavailable("slot registry lock poisoned".to_string()))?
            .insert((code.clone(), slot));
        Ok(())
    }

    fn ensure_owned(&self, code: &RoomCode, slot: PlayerSlot) -> Result<(), ChannelError> {
        let owned = self
            .claimed
            .lock()
            .map_err(|_| ChannelError::Unavailable("slot registry lock poisoned".to_string()))?
            .contains(&(code.clone(), slot));
        if owned {
            Ok(())
        } else {
            Err(ChannelError::Unavailable(format!(
                "slot {} of room {} is not held by this connection",
                slot, code
            )))
        }
    }
}

impl Drop for InMemoryRoomChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl RoomChannel for InMemoryRoomChannel {
    async fn create_room(&self, code: &RoomCode, settings: RoomSettings) -> Result<(), ChannelError> {
        self.hub.create_room(code, settings)?;
        self.claim(code, PlayerSlot::PlayerOne)
    }

    async fn join_room(&self, code: &RoomCode) -> Result<RoomSettings, ChannelError> {
        let settings = self.hub.join_room(code)?;
        self.claim(code, PlayerSlot::PlayerTwo)?;
        Ok(settings)
    }

    async fn publish_snapshot(
        &self,
        code: &RoomCode,
        slot: PlayerSlot,
        snapshot: PlayerSnapshot,
    ) -> Result<(), ChannelError> {
        self.ensure_owned(code, slot)?;
        self.hub.publish(code, slot, snapshot)
    }

    async fn subscribe(&self, code: &RoomCode, slot: PlayerSlot) -> Result<SlotReceiver, ChannelError> {
        self.hub.subscribe(code, slot)
    }

    async fn release_slot_on_disconnect(&self, code: &RoomCode, slot: PlayerSlot) -> Result<(), ChannelError> {
        self.ensure_owned(code, slot)?;
        self.release_on_drop
            .lock()
            .map_err(|_| ChannelError::Unavailable("release registry lock poisoned".to_string()))?
            .insert((code.clone(), slot));
        Ok(())
    }
}
