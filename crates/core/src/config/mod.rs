//! Configuration management for phpcbf-runner

mod resolver;
mod settings;
mod store;

// Re-export main types
pub use resolver::{
    ConfigResolver, FOLDER_PLACEHOLDER, ResolvedConfig, resolve_settings, resolve_standard,
    substitute_folder,
};
pub use settings::{
    DEFAULT_STANDARD_KEY, OVERRIDE_NAMESPACE, PROJECT_SETTINGS_FILE, Settings, SettingsOverride,
    StandardSetting,
};
pub use store::{SETTINGS_ENV, SettingsStore};
