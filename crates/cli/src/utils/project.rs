use anyhow::{Context, Result};
use phpcbf_runner_core::listener::is_auto_fix_candidate;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into when fixing a whole tree
const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules"];

/// The project folder for `file`: the nearest ancestor holding a
/// `composer.json`, else the file's own directory.
pub fn detect_project_folder(file: &Path) -> Option<PathBuf> {
    let start = if file.is_dir() { file } else { file.parent()? };
    start
        .ancestors()
        .find(|dir| dir.join("composer.json").is_file())
        .or(Some(start))
        .map(Path::to_path_buf)
}

/// Expand `path` into the files to format.
///
/// An explicit file is always taken; a directory contributes every
/// auto-fix candidate below it, in a stable order.
pub fn collect_targets(path: &Path) -> Result<Vec<PathBuf>> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))?;

    if path.is_file() {
        return Ok(vec![path]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
        })
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() && is_auto_fix_candidate(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_composer_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("proj");
        let src = root.join("src/Http");
        fs::create_dir_all(&src).unwrap();
        fs::write(root.join("composer.json"), "{}").unwrap();
        let file = src.join("Kernel.php");
        fs::write(&file, "<?php\n").unwrap();

        assert_eq!(detect_project_folder(&file), Some(root));
    }

    #[test]
    fn test_detect_falls_back_to_parent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("script.php");
        fs::write(&file, "<?php\n").unwrap();
        // An ancestor of the temp dir could hold composer.json, so only
        // require that the result contains the file
        let folder = detect_project_folder(&file).unwrap();
        assert!(file.starts_with(folder));
    }

    #[test]
    fn test_collect_skips_vendor_hidden_and_non_php() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["src", "vendor/pkg", ".git", "tests"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for file in [
            "src/B.php",
            "src/A.php",
            "src/.hidden.php",
            "src/readme.md",
            "vendor/pkg/Lib.php",
            ".git/hook.php",
            "tests/CTest.PHP",
        ] {
            fs::write(root.join(file), "<?php\n").unwrap();
        }

        let files = collect_targets(root).unwrap();
        let root = root.canonicalize().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["src/A.php", "src/B.php"]);
    }

    #[test]
    fn test_explicit_file_is_always_taken() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("template.phtml");
        fs::write(&file, "<?php\n").unwrap();
        assert_eq!(collect_targets(&file).unwrap(), vec![file.canonicalize().unwrap()]);
    }
}
