//! Resolves the effective configuration for one run

use super::{DEFAULT_STANDARD_KEY, Settings, SettingsOverride, SettingsStore, StandardSetting};
use crate::host::{Host, ViewId, WindowId};
use crate::platform::Platform;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Placeholder replaced by the window's first project folder
pub const FOLDER_PLACEHOLDER: &str = "${folder}";

/// Configuration consumed by a single run. Never mutated once resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub interpreter_path: Option<String>,
    pub formatter_path: Option<String>,
    pub standard: Option<String>,
    pub extra_args: Vec<String>,
    pub fix_on_save: bool,
    pub timeout_secs: Option<u64>,
    pub use_shell: bool,
    pub platform: Platform,
}

/// Layers the global settings with the active view's override bag
pub struct ConfigResolver<'a> {
    store: &'a SettingsStore,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }

    /// Resolve for the window's active view
    pub fn resolve<H: Host>(&self, host: &H, window: WindowId) -> ResolvedConfig {
        self.resolve_for_view(host, window, host.active_view(window))
    }

    /// Resolve against the override bag of `view`, which need not be active
    pub fn resolve_for_view<H: Host>(
        &self,
        host: &H,
        window: WindowId,
        view: Option<ViewId>,
    ) -> ResolvedConfig {
        let folders = host.folders(window);
        let bag = view
            .and_then(|view| host.view_settings(view))
            .and_then(|value| match SettingsOverride::from_view_settings(&value) {
                Ok(bag) => bag,
                Err(e) => {
                    warn!("Ignoring view override: {e}");
                    None
                }
            });

        let settings = match bag {
            Some(ref bag) => self.store.settings().with_override(bag),
            None => self.store.settings().clone(),
        };

        resolve_settings(&settings, &folders, host.platform())
    }

    /// Whether auto-fix-on-save is on for the window's active view
    pub fn fix_on_save<H: Host>(&self, host: &H, window: WindowId) -> bool {
        self.resolve(host, window).fix_on_save
    }
}

/// Pure resolution step, independent of any host
pub fn resolve_settings(
    settings: &Settings,
    folders: &[PathBuf],
    platform: Platform,
) -> ResolvedConfig {
    let first_folder = folders.first().map(|f| f.to_string_lossy().into_owned());

    let formatter_path = non_empty(settings.phpcbf_path.as_deref())
        .map(|path| substitute_folder(path, first_folder.as_deref()));

    let standard = resolve_standard(settings.phpcs_standard.as_ref(), folders)
        .filter(|s| !s.is_empty())
        .map(|s| substitute_folder(&s, first_folder.as_deref()));

    ResolvedConfig {
        interpreter_path: non_empty(settings.php_path.as_deref()).map(str::to_string),
        formatter_path,
        standard,
        extra_args: settings.additional_args.clone(),
        fix_on_save: settings.fix_on_save,
        timeout_secs: settings.timeout_secs.filter(|secs| *secs > 0),
        use_shell: settings.use_shell,
        platform,
    }
}

/// Pick the standard for the given project folders.
///
/// A plain name is used verbatim. A mapping is consulted folder by folder in
/// the window's order, then through `_default`.
pub fn resolve_standard(setting: Option<&StandardSetting>, folders: &[PathBuf]) -> Option<String> {
    match setting? {
        StandardSetting::Name(name) => Some(name.clone()),
        StandardSetting::ByFolder(mapping) => {
            for folder in folders {
                let Some(name) = folder.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if let Some(standard) = mapping.get(name) {
                    debug!("Standard {standard} selected by folder {name}");
                    return Some(standard.clone());
                }
            }
            mapping.get(DEFAULT_STANDARD_KEY).cloned()
        }
    }
}

/// Replace `${folder}`; without a project folder the token stays in place.
pub fn substitute_folder(value: &str, first_folder: Option<&str>) -> String {
    if !value.contains(FOLDER_PLACEHOLDER) {
        return value.to_string();
    }
    match first_folder {
        Some(folder) => value.replace(FOLDER_PLACEHOLDER, folder),
        None => {
            warn!("{FOLDER_PLACEHOLDER} used in {value:?} but the window has no project folder");
            value.to_string()
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
