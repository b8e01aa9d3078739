use log::{debug, info};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::graph::RoomGraph;
use super::types::{Room, TempleConfig};
use crate::error::ConfigError;

/// Everything needed to start a run, read from one temple directory.
#[derive(Debug, Clone)]
pub struct Temple {
    pub config: TempleConfig,
    pub graph: RoomGraph,
    pub root: PathBuf,
}

pub(crate) fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_room(path: &Path) -> Result<Room, ConfigError> {
    read_toml(path)
}

pub fn load_rooms(rooms_dir: &Path) -> Result<Vec<Room>, ConfigError> {
    // Escape the directory so brackets or stars in its name stay literal
    let escaped = glob::Pattern::escape(&rooms_dir.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.toml");
    let mut paths = glob::glob(&pattern.to_string_lossy())?
        .map(|entry| {
            entry.map_err(|e| ConfigError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })
        })
        .collect::<Result<Vec<PathBuf>, _>>()?;

    if paths.is_empty() {
        return Err(ConfigError::NoRooms(rooms_dir.to_path_buf()));
    }

    // Sort by filename so load order is stable across platforms
    paths.sort();

    let mut rooms = Vec::with_capacity(paths.len());
    for path in paths {
        debug!("loading room file {}", path.display());
        rooms.push(load_room(&path)?);
    }

    Ok(rooms)
}

/// Loads `temple.toml` and `rooms/*.toml` from `dir` and validates the graph.
pub fn load_temple(dir: &Path) -> Result<Temple, ConfigError> {
    let config: TempleConfig = read_toml(&dir.join("temple.toml"))?;
    if config.time_limit_seconds == 0 {
        return Err(ConfigError::ZeroTimeLimit);
    }

    let rooms = load_rooms(&dir.join("rooms"))?;
    let graph = RoomGraph::from_config(rooms, &config)?;
    info!(
        "loaded temple from {}: {} rooms, {} guard posts",
        dir.display(),
        graph.len(),
        graph.guard_eligible().len()
    );

    Ok(Temple {
        config,
        graph,
        root: dir.to_path_buf(),
    })
}
