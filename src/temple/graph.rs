use std::collections::HashMap;

use super::types::{Room, RoomId, TempleConfig};
use crate::error::{ConfigError, UnknownRoom};

/// Validated, immutable room graph.
///
/// Every connection target is known to exist, as are the start and artifact
/// rooms. Rooms keep the order they were loaded in.
#[derive(Debug, Clone)]
pub struct RoomGraph {
    rooms: Vec<Room>,
    index: HashMap<RoomId, usize>,
    start: usize,
    artifact_room: usize,
}

impl RoomGraph {
    pub fn new(
        rooms: Vec<Room>,
        start: impl Into<RoomId>,
        artifact_room: impl Into<RoomId>,
    ) -> Result<Self, ConfigError> {
        let start = start.into();
        let artifact_room = artifact_room.into();

        let mut index = HashMap::with_capacity(rooms.len());
        for (i, room) in rooms.iter().enumerate() {
            if index.insert(room.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateRoom(room.id.clone()));
            }
        }

        for room in &rooms {
            for conn in &room.connections {
                if !index.contains_key(&conn.to) {
                    return Err(ConfigError::DanglingConnection {
                        room: room.id.clone(),
                        key: conn.key.clone(),
                        target: conn.to.clone(),
                    });
                }
            }
        }

        let start = *index.get(&start).ok_or(ConfigError::MissingRoom {
            role: "start",
            id: start,
        })?;
        let artifact_room = *index.get(&artifact_room).ok_or(ConfigError::MissingRoom {
            role: "artifact",
            id: artifact_room,
        })?;

        Ok(RoomGraph {
            rooms,
            index,
            start,
            artifact_room,
        })
    }

    pub fn from_config(rooms: Vec<Room>, config: &TempleConfig) -> Result<Self, ConfigError> {
        Self::new(rooms, config.start_room.clone(), config.artifact_room.clone())
    }

    pub fn lookup(&self, id: &str) -> Result<&Room, UnknownRoom> {
        self.index
            .get(id)
            .map(|&i| &self.rooms[i])
            .ok_or_else(|| UnknownRoom(id.to_string()))
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Room at a position previously handed out by this graph.
    pub fn room(&self, position: usize) -> &Room {
        &self.rooms[position]
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn start_position(&self) -> usize {
        self.start
    }

    pub fn artifact_room(&self) -> &Room {
        &self.rooms[self.artifact_room]
    }

    pub fn artifact_position(&self) -> usize {
        self.artifact_room
    }

    /// Ids of every room flagged as a possible guard post, in load order.
    pub fn guard_eligible(&self) -> Vec<RoomId> {
        self.rooms
            .iter()
            .filter(|r| r.temple_guard_possible)
            .map(|r| r.id.clone())
            .collect()
    }
}
