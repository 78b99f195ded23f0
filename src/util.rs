//! Filesystem listing helpers.
use crate::error::{ResolutionError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Final component of `path` as UTF-8, or an empty string.
pub fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

/// Immediate subdirectories of `dir`, sorted by name.
pub fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    list_entries(dir, true)
}

/// Immediate regular files of `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    list_entries(dir, false)
}

fn list_entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(ResolutionError::io(dir))? {
        let entry = entry.map_err(ResolutionError::io(dir))?;
        let path = entry.path();
        // Follow symlinks the same way `is_dir`/`is_file` do.
        let keep = if want_dirs {
            path.is_dir()
        } else {
            path.is_file()
        };
        if keep {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
