pub mod builder;
pub mod vector;

pub use builder::{CommandBuilder, STDIN_MARKER, WINDOWS_DEFAULT_INTERPRETER};
pub use vector::CommandVector;
