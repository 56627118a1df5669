pub mod project;

pub use project::{collect_targets, detect_project_folder};
