//! Per-channel room state and membership.

use crate::event::Event;
use crate::message::Tags;

/// Known settings of one chat room.
///
/// Updates are merged: a `ROOMSTATE` carrying only `slow` leaves every
/// other setting as it was.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomState {
    /// Numeric room (channel account) id.
    pub room_id: Option<String>,
    /// Only emotes may be posted.
    pub emote_only: Option<bool>,
    /// Followers-only minimum follow age in minutes; `-1` means off.
    pub followers_only: Option<i32>,
    /// Unique-message mode.
    pub r9k: Option<bool>,
    /// Seconds between messages; `0` means off.
    pub slow: Option<u32>,
    /// Only subscribers may chat.
    pub subs_only: Option<bool>,
    /// Every tag seen so far, merged.
    pub tags: Tags,
}

impl RoomState {
    /// Merge a room-state tag set into this state.
    pub fn merge(&mut self, tags: &Tags) {
        if let Some(id) = tags.get("room-id") {
            self.room_id = Some(id.to_string());
        }
        merge_field(&mut self.emote_only, tags.flag("emote-only"));
        merge_field(&mut self.followers_only, tags.parse_value("followers-only"));
        merge_field(&mut self.r9k, tags.flag("r9k"));
        merge_field(&mut self.slow, tags.parse_value("slow"));
        merge_field(&mut self.subs_only, tags.flag("subs-only"));
        self.tags.merge(tags);
    }
}

fn merge_field<T>(field: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *field = update;
    }
}

/// A joined channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    /// Channel name without `#`.
    pub channel: String,
    /// Settings, once the first `ROOMSTATE` arrived.
    pub state: Option<RoomState>,
}

/// Change notification from the room tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoomEvent {
    /// This client joined a channel.
    Joined(String),
    /// This client left a channel.
    Parted(String),
    /// A joined channel's settings changed.
    StateChanged {
        /// Channel name without `#`.
        channel: String,
        /// The merged state.
        state: RoomState,
    },
    /// Emitted after each of the above.
    Changed(String),
}

/// Sans-IO membership and room-state table, in join order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rooms {
    rooms: Vec<Room>,
}

fn normalize(channel: &str) -> &str {
    channel.strip_prefix('#').unwrap_or(channel)
}

impl Rooms {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one connection event. Returns the resulting changes.
    pub fn on_event(&mut self, event: &Event) -> Vec<RoomEvent> {
        match event {
            Event::Join { channel } => {
                if self.is_in_channel(channel) {
                    return Vec::new();
                }
                let channel = normalize(channel).to_string();
                self.rooms.push(Room {
                    channel: channel.clone(),
                    state: None,
                });
                vec![RoomEvent::Joined(channel.clone()), RoomEvent::Changed(channel)]
            }
            Event::Part { channel } => match self.position(channel) {
                Some(idx) => {
                    let room = self.rooms.remove(idx);
                    vec![
                        RoomEvent::Parted(room.channel.clone()),
                        RoomEvent::Changed(room.channel),
                    ]
                }
                None => Vec::new(),
            },
            Event::RoomState { channel, tags } => match self.position(channel) {
                Some(idx) => {
                    let room = &mut self.rooms[idx];
                    let state = room.state.get_or_insert_with(RoomState::default);
                    state.merge(tags);
                    vec![
                        RoomEvent::StateChanged {
                            channel: room.channel.clone(),
                            state: state.clone(),
                        },
                        RoomEvent::Changed(room.channel.clone()),
                    ]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn position(&self, channel: &str) -> Option<usize> {
        let channel = normalize(channel);
        self.rooms.iter().position(|r| r.channel == channel)
    }

    /// Whether this client is in `channel` (`#` optional).
    #[must_use]
    pub fn is_in_channel(&self, channel: &str) -> bool {
        self.position(channel).is_some()
    }

    /// Settings of `channel`, if joined and known.
    #[must_use]
    pub fn channel_state(&self, channel: &str) -> Option<&RoomState> {
        self.position(channel)
            .and_then(|idx| self.rooms[idx].state.as_ref())
    }

    /// Every joined room, in join order.
    #[must_use]
    pub fn channels(&self) -> &[Room] {
        &self.rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(channel: &str) -> Event {
        Event::Join {
            channel: channel.to_string(),
        }
    }

    fn roomstate(channel: &str, tags: &str) -> Event {
        Event::RoomState {
            channel: channel.to_string(),
            tags: Tags::parse(tags),
        }
    }

    #[test]
    fn test_merge_keeps_prior_fields() {
        let mut state = RoomState::default();
        state.merge(&Tags::parse(
            "emote-only=0;followers-only=-1;r9k=0;room-id=1337;slow=0;subs-only=1",
        ));
        state.merge(&Tags::parse("room-id=1337;slow=10"));

        assert_eq!(state.slow, Some(10));
        assert_eq!(state.subs_only, Some(true));
        assert_eq!(state.followers_only, Some(-1));
        assert_eq!(state.emote_only, Some(false));
        assert_eq!(state.room_id.as_deref(), Some("1337"));
        assert_eq!(state.tags.get("subs-only"), Some("1"));
    }

    #[test]
    fn test_join_part() {
        let mut rooms = Rooms::new();
        assert_eq!(
            rooms.on_event(&join("dallas")),
            vec![
                RoomEvent::Joined("dallas".into()),
                RoomEvent::Changed("dallas".into())
            ]
        );
        assert!(rooms.on_event(&join("dallas")).is_empty());
        assert!(rooms.is_in_channel("#dallas"));

        let part = Event::Part {
            channel: "dallas".into(),
        };
        assert_eq!(rooms.on_event(&part).len(), 2);
        assert!(!rooms.is_in_channel("dallas"));
        assert!(rooms.on_event(&part).is_empty());
    }

    #[test]
    fn test_roomstate_ignored_when_not_joined() {
        let mut rooms = Rooms::new();
        assert!(rooms.on_event(&roomstate("dallas", "slow=5")).is_empty());
        assert!(rooms.channel_state("dallas").is_none());
    }

    #[test]
    fn test_roomstate_merged() {
        let mut rooms = Rooms::new();
        rooms.on_event(&join("dallas"));
        assert!(rooms.channel_state("dallas").is_none());

        rooms.on_event(&roomstate("dallas", "subs-only=1;slow=0"));
        let changes = rooms.on_event(&roomstate("dallas", "slow=30"));
        match &changes[0] {
            RoomEvent::StateChanged { channel, state } => {
                assert_eq!(channel, "dallas");
                assert_eq!(state.slow, Some(30));
                assert_eq!(state.subs_only, Some(true));
            }
            other => panic!("Expected StateChanged, got {:?}", other),
        }
        assert!(matches!(&changes[1], RoomEvent::Changed(c) if c == "dallas"));
        assert_eq!(rooms.channels().len(), 1);
    }
}
