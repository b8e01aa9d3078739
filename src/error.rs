use std::path::PathBuf;
use thiserror::Error;

/// Structural problems with the temple or prize configuration.
///
/// A bad temple config aborts startup before any engine exists. A bad prize
/// file only switches the prize ceremony off.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("bad room file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no room files found in {}", .0.display())]
    NoRooms(PathBuf),

    #[error("room '{0}' is defined more than once")]
    DuplicateRoom(String),

    #[error("connection '{key}' in room '{room}' points to unknown room '{target}'")]
    DanglingConnection {
        room: String,
        key: String,
        target: String,
    },

    #[error("{role} room '{id}' does not exist")]
    MissingRoom { role: &'static str, id: String },

    #[error("time limit must be greater than zero")]
    ZeroTimeLimit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown room: {0}")]
pub struct UnknownRoom(pub String);

/// A menu choice the engine refused. Never changes game state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter a number.")]
    Empty,

    #[error("Invalid choice '{0}'! Choose a number from the list.")]
    InvalidChoice(String),

    #[error("The temple run is already over.")]
    GameOver,
}
