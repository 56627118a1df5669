use anyhow::{Context, Result};
use phpcbf_runner_core::{CommandBuilder, ConfigResolver};
use std::path::{Path, PathBuf};

use super::CommonOptions;
use crate::host::{FileHost, WINDOW};
use crate::utils::detect_project_folder;

/// Print what a run on `file` would use, without running anything
pub fn config_command(common: &CommonOptions, file: &Path, folders: Vec<PathBuf>) -> Result<()> {
    let file = file
        .canonicalize()
        .with_context(|| format!("Cannot access {}", file.display()))?;
    let folders = if folders.is_empty() {
        detect_project_folder(&file).into_iter().collect()
    } else {
        folders
    };

    let store = common.settings_store()?;
    let mut host = FileHost::new(folders, true);
    host.open(&file)?;

    let config = ConfigResolver::new(&store).resolve(&host, WINDOW);
    let command = CommandBuilder::new(&config).build();

    match store.source() {
        Some(source) if source.exists() => println!("📁 Settings: {}", source.display()),
        Some(source) => println!("📁 Settings: defaults ({} not found)", source.display()),
        None => println!("📁 Settings: defaults"),
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("\n📌 Command: {}", command.to_shell_command());
    Ok(())
}
