// Cache path utilities.
// Resolves where cache artifacts live when the caller does not pick a path.

use std::ffi::OsString;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable that overrides the base cache directory.
pub const CACHE_DIR_ENV: &str = "STATIC_DATA_CACHE_DIR";

/// Get the base cache directory.
///
/// `$STATIC_DATA_CACHE_DIR` wins when set and non-empty; otherwise the
/// per-user cache directory (~/.cache/static-data-paths on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    resolve_cache_dir(std::env::var_os(CACHE_DIR_ENV))
}

fn resolve_cache_dir(override_dir: Option<OsString>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => default_cache_dir(),
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "static-data-paths").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the artifact for a named data set.
pub fn artifact_path(name: &str) -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(artifact_file_name(name)))
}

/// File name for a named artifact, e.g. `posts.json`.
pub fn artifact_file_name(name: &str) -> String {
    format!("{}.json", sanitize_name(name))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".repeat(cleaned.len().max(1)),
        _ => cleaned,
    }
}
