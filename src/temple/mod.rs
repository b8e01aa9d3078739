pub mod graph;
pub mod loader;
pub mod types;

pub use graph::RoomGraph;
pub use loader::{load_temple, Temple};
pub use types::{Room, RoomId};
