use serde::Deserialize;

pub type RoomId = String;

/// The connection key that is also offered as the lettered "go back" choice.
pub const BACK_KEY: &str = "back";

#[derive(Debug, Deserialize, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub temple_guard_possible: bool,
    #[serde(default)]
    pub image_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Connection {
    pub key: String,
    pub to: RoomId,
}

impl Room {
    pub fn back(&self) -> Option<&Connection> {
        self.connections.iter().find(|c| c.key == BACK_KEY)
    }

    /// Label shown for the connection at `index`.
    ///
    /// Labels pair with connections by position. When a room lists more
    /// connections than labels the last label is reused.
    pub fn action_label(&self, index: usize) -> String {
        match self.actions.get(index).or(self.actions.last()) {
            Some(label) => label.clone(),
            None => match self.connections.get(index) {
                Some(conn) => format!("Go to {}", conn.key),
                None => String::from("Go on"),
            },
        }
    }
}

/// Top level of `temple.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct TempleConfig {
    pub artifact: String,
    pub temple_guards: usize,
    #[serde(default = "default_start_room")]
    pub start_room: RoomId,
    #[serde(default = "default_artifact_room")]
    pub artifact_room: RoomId,
    #[serde(default = "default_pendants")]
    pub pendants: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u64,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

fn default_start_room() -> RoomId {
    "entrance".to_string()
}

fn default_artifact_room() -> RoomId {
    "heart_chamber".to_string()
}

fn default_pendants() -> u32 {
    2
}

fn default_time_limit() -> u64 {
    180
}

fn default_image_dir() -> String {
    "images".to_string()
}
