use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key under which the per-view override bag is nested
pub const OVERRIDE_NAMESPACE: &str = "PHP_CBF";

/// Reserved mapping key used when no project folder matches
pub const DEFAULT_STANDARD_KEY: &str = "_default";

pub const PROJECT_SETTINGS_FILE: &str = ".phpcbf.json";

/// `phpcs_standard` is either a plain standard name or a mapping from
/// project folder base name to standard name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StandardSetting {
    Name(String),
    ByFolder(BTreeMap<String, String>),
}

impl Default for StandardSetting {
    fn default() -> Self {
        StandardSetting::Name("PSR2".to_string())
    }
}

/// Global plugin settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub php_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phpcbf_path: Option<String>,
    #[serde(default = "default_standard")]
    pub phpcs_standard: Option<StandardSetting>,
    #[serde(default)]
    pub additional_args: Vec<String>,
    #[serde(default)]
    pub fix_on_save: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub use_shell: bool,
}

fn default_standard() -> Option<StandardSetting> {
    Some(StandardSetting::default())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            php_path: None,
            phpcbf_path: None,
            phpcs_standard: default_standard(),
            additional_args: Vec::new(),
            fix_on_save: false,
            timeout_secs: None,
            use_shell: false,
        }
    }
}

/// Values a view may override. Only keys present in the bag take effect;
/// an explicit `null` on a nullable key clears the global value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SettingsOverride {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub php_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phpcbf_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phpcs_standard: Option<Option<StandardSetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_on_save: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_shell: Option<bool>,
}

/// A key that is present deserializes to `Some`, even when its value is null
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SettingsOverride {
    /// Extract the override bag from a view's settings object.
    ///
    /// Returns `Ok(None)` when the view carries no bag.
    pub fn from_view_settings(view_settings: &serde_json::Value) -> Result<Option<Self>> {
        match view_settings.get(OVERRIDE_NAMESPACE) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(bag) => {
                let parsed = serde_json::from_value(bag.clone()).map_err(|e| {
                    Error::Config(format!("Invalid {OVERRIDE_NAMESPACE} override: {e}"))
                })?;
                Ok(Some(parsed))
            }
        }
    }
}

impl Settings {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(settings)
    }

    /// Layer a view override on top of these settings
    pub fn with_override(&self, bag: &SettingsOverride) -> Settings {
        let mut merged = self.clone();
        if let Some(ref php_path) = bag.php_path {
            merged.php_path = php_path.clone();
        }
        if let Some(ref phpcbf_path) = bag.phpcbf_path {
            merged.phpcbf_path = phpcbf_path.clone();
        }
        if let Some(ref standard) = bag.phpcs_standard {
            merged.phpcs_standard = standard.clone();
        }
        if let Some(ref args) = bag.additional_args {
            merged.additional_args = args.clone();
        }
        if let Some(fix_on_save) = bag.fix_on_save {
            merged.fix_on_save = fix_on_save;
        }
        if let Some(timeout_secs) = bag.timeout_secs {
            merged.timeout_secs = timeout_secs;
        }
        if let Some(use_shell) = bag.use_shell {
            merged.use_shell = use_shell;
        }
        merged
    }

    /// Nearest project settings file at or above `start_path`
    pub fn find_project_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = if start_path.is_file() {
            start_path.parent()?
        } else {
            start_path
        };

        loop {
            let candidate = current.join(PROJECT_SETTINGS_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            current = current.parent()?;
        }
    }
}
