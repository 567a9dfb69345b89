use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::dto::chat_dto::OutboundChatEvent;

const ROOM_CAPACITY: usize = 64;

/// In-process fan-out of chat events, one broadcast channel per prescription
/// request. Delivery is fire-and-forget: connections that are not currently
/// subscribed miss the event, and lagged receivers drop frames.
#[derive(Clone)]
pub struct ChatBroadcaster {
    rooms: Arc<Mutex<HashMap<i64, broadcast::Sender<OutboundChatEvent>>>>,
}

impl Default for ChatBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBroadcaster {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe to a request's room, creating the channel on first join.
    /// Rooms whose last receiver has gone are dropped here, so the map stays
    /// bounded by the number of rooms with live members.
    pub fn subscribe(&self, room: i64) -> broadcast::Receiver<OutboundChatEvent> {
        let mut rooms = self.rooms.lock().expect("room map poisoned");
        rooms.retain(|_, tx| tx.receiver_count() > 0);
        rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to every current member of a room. Rooms with no
    /// remaining receivers are pruned on the way out.
    pub fn publish(&self, room: i64, event: OutboundChatEvent) {
        let mut rooms = self.rooms.lock().expect("room map poisoned");
        if let Some(tx) = rooms.get(&room) {
            if tx.send(event).is_err() {
                rooms.remove(&room);
            }
        }
    }

    #[cfg(test)]
    fn room_count(&self) -> usize {
        self.rooms.lock().expect("room map poisoned").len()
    }
}
