use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{CommonOptions, config_command, fix_command, init_command, watch_command};

/// Format PHP sources with phpcbf, the way an editor would on save
#[derive(Parser, Debug)]
#[command(name = "phpcbf-runner")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug                  Enable debug logging\n    PHPCBF_RUNNER_SETTINGS=<file>   Global settings file")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Global settings file (defaults to $PHPCBF_RUNNER_SETTINGS, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run phpcbf over a file, or every PHP file below a directory
    #[command(alias = "phpcbf")]
    Fix {
        /// File or directory to format
        path: PathBuf,

        /// Project folder substituted for ${folder} (repeatable, first wins)
        #[arg(long = "folder", value_name = "DIR")]
        folders: Vec<PathBuf>,

        /// Print the diffs without writing anything
        #[arg(short, long)]
        dry_run: bool,

        /// Linter to start after each change, e.g. "phpcs -q"
        #[arg(long, value_name = "COMMAND")]
        lint_cmd: Option<String>,
    },
    /// Watch a directory and fix PHP files when they are saved
    #[command(visible_alias = "w")]
    Watch {
        /// Directory to watch
        dir: PathBuf,

        /// Linter to start after each change, e.g. "phpcs -q"
        #[arg(long, value_name = "COMMAND")]
        lint_cmd: Option<String>,
    },
    /// Show the resolved configuration and command line for a file
    Config {
        /// PHP file the configuration applies to
        file: PathBuf,

        /// Project folder substituted for ${folder}
        #[arg(long = "folder", value_name = "DIR")]
        folders: Vec<PathBuf>,
    },
    /// Create a .phpcbf.json project settings file
    Init {
        /// Specify the directory to initialize
        #[arg(short, long)]
        cwd: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Execute the selected command
    pub fn execute(self) -> Result<()> {
        let common = CommonOptions {
            settings: self.settings,
        };
        match self.command {
            Commands::Fix {
                path,
                folders,
                dry_run,
                lint_cmd,
            } => fix_command(&common, &path, folders, dry_run, lint_cmd.as_deref()),
            Commands::Watch { dir, lint_cmd } => watch_command(&common, &dir, lint_cmd.as_deref()),
            Commands::Config { file, folders } => config_command(&common, &file, folders),
            Commands::Init { cwd, force } => init_command(cwd.as_deref(), force),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phpcbf_alias_parses_as_fix() {
        let cli = Cli::try_parse_from(["phpcbf-runner", "phpcbf", "src/A.php", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Fix { path, dry_run, .. } => {
                assert_eq!(path, PathBuf::from("src/A.php"));
                assert!(dry_run);
            }
            other => panic!("expected fix, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "phpcbf-runner",
            "config",
            "a.php",
            "--folder",
            "/p1",
            "--folder",
            "/p2",
            "-v",
            "--settings",
            "s.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("s.json")));
        match cli.command {
            Commands::Config { folders, .. } => {
                assert_eq!(folders, vec![PathBuf::from("/p1"), PathBuf::from("/p2")]);
            }
            other => panic!("expected config, got {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["phpcbf-runner"]).is_err());
    }
}
