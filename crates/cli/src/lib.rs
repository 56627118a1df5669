pub mod cli;
pub mod commands;
pub mod host;
pub mod notifier;
pub mod utils;

// Re-export commonly used items
pub use cli::{Cli, Commands};
pub use host::{FileHost, FileReport};
