// Library crate - exports the game core and configuration

pub mod config;
pub mod game_core;

// Re-export commonly used types
pub use config::GameConfig;
pub use game_core::*;
