//! Command implementations.

mod cache;
mod config;
mod split;

pub use cache::{execute_clear, open_cache};
pub use config::{load_config, show_config};
pub use split::execute_split;
