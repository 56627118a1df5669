use anyhow::{Context, Result};
use phpcbf_runner_core::config::{OVERRIDE_NAMESPACE, PROJECT_SETTINGS_FILE};
use serde_json::json;
use std::{env, fs, path::Path};

pub fn init_command(cwd: Option<&Path>, force: bool) -> Result<()> {
    let project_root = match cwd {
        Some(cwd) => cwd.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let project_root = project_root
        .canonicalize()
        .context("Failed to canonicalize project root")?;

    let config_path = project_root.join(PROJECT_SETTINGS_FILE);
    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    println!("🚀 Initializing phpcbf-runner in: {}", project_root.display());

    let template = json!({
        OVERRIDE_NAMESPACE: {
            "phpcbf_path": "${folder}/vendor/bin/phpcbf",
            "phpcs_standard": {
                "_default": "PSR12"
            },
            "additional_args": [],
            "fix_on_save": true
        }
    });
    let contents = serde_json::to_string_pretty(&template)? + "\n";
    fs::write(&config_path, contents)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!("✅ Created config: {}", config_path.display());
    println!("\n📌 Settings under \"{OVERRIDE_NAMESPACE}\" override the global ones for files below this directory");
    Ok(())
}
