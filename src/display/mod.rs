pub mod chafa;

pub use chafa::{ImageRender, ImageRenderer};
