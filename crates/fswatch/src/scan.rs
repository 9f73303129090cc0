//! Recursive directory scanning with suffix filters and reserved-path
//! exclusion.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Enumerate files under `dirs` matching the include suffixes (all files when
/// the include list is empty) minus the exclude suffixes.  `reserved` paths
/// (the watcher's own outputs) are always dropped so the watcher never
/// observes its own writes.
pub fn scan_files(
    dirs: &[PathBuf],
    include: &[String],
    exclude: &[String],
    reserved: &[PathBuf],
) -> Vec<PathBuf> {
    let reserved: Vec<PathBuf> = reserved.iter().map(|p| absolute(p)).collect();

    let mut files = Vec::new();
    for watch_dir in dirs {
        debug!(dir = %watch_dir.display(), "scanning");
        for entry in WalkDir::new(watch_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.into_path();
            let name = path.to_string_lossy();

            if !include.is_empty() && !include.iter().any(|s| name.ends_with(s.as_str())) {
                continue;
            }
            if exclude.iter().any(|s| name.ends_with(s.as_str())) {
                continue;
            }
            if reserved.contains(&absolute(&path)) {
                continue;
            }

            files.push(path);
        }
    }
    files
}

/// Which watched directory contains `path`, if any.
pub fn dir_for_file<'a>(path: &Path, dirs: &'a [PathBuf]) -> Option<&'a PathBuf> {
    dirs.iter().find(|dir| path.starts_with(dir))
}

/// Display label for a file: `<dir-name>/<rel-path>`.
pub fn display_path(path: &Path, watch_dir: &Path) -> String {
    let dir_name = watch_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| watch_dir.display().to_string());
    match path.strip_prefix(watch_dir) {
        Ok(rel) => format!("{}/{}", dir_name, rel.display()),
        Err(_) => path.display().to_string(),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ── Tests ────────────────────────────────────────────────────────────────────
