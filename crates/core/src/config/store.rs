//! Global settings layer with explicit reload

use super::Settings;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the global settings file
pub const SETTINGS_ENV: &str = "PHPCBF_RUNNER_SETTINGS";

/// Holds the global settings loaded at activation.
///
/// Read-only during a run; [`SettingsStore::reload`] replaces the whole
/// snapshot at once.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    source: Option<PathBuf>,
    settings: Settings,
}

impl SettingsStore {
    /// A store that is never backed by a file
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            source: None,
            settings,
        }
    }

    /// Load from an explicit file. A missing file yields the defaults.
    pub fn load(source: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            source: Some(source.into()),
            settings: Settings::default(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Locate the global settings file: `$PHPCBF_RUNNER_SETTINGS`, then the
    /// user configuration directory.
    pub fn default_source() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::config_dir().map(|dir| dir.join("phpcbf-runner").join("settings.json"))
    }

    pub fn reload(&mut self) -> Result<()> {
        let Some(ref source) = self.source else {
            return Ok(());
        };

        if source.exists() {
            self.settings = Settings::load_from_file(source)?;
            info!("Loaded settings from {}", source.display());
        } else {
            debug!("No settings at {}, using defaults", source.display());
            self.settings = Settings::default();
        }
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reload_picks_up_changes() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"fix_on_save": false}"#).unwrap();

        let mut store = SettingsStore::load(&path).unwrap();
        assert!(!store.settings().fix_on_save);

        fs::write(&path, r#"{"fix_on_save": true, "additional_args": ["-q"]}"#).unwrap();
        store.reload().unwrap();
        assert!(store.settings().fix_on_save);
        assert_eq!(store.settings().additional_args, vec!["-q".to_string()]);
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = SettingsStore::load(temp.path().join("absent.json")).unwrap();
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SettingsStore::load(&path),
            Err(crate::Error::Config(_))
        ));
    }
}
