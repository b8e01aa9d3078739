pub mod clock;
pub mod game;
pub mod guards;
pub mod player;

pub use clock::{Clock, SystemClock};
pub use game::{GameEngine, GameEvent, GameStatus};
pub use guards::RngSampler;
pub use player::{PlayerState, TimeWarning};
