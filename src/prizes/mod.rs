pub mod evaluator;
pub mod types;

pub use evaluator::{evaluate, sponsor_message, total_value};
pub use types::{load_prizes, PrizeTable};
