//! Path normalization and prefix matching for sandbox checks.
//!
//! Normalization is lexical: `~/` is expanded, the string is NFC-normalized,
//! `.` components are dropped and `..` pops the previous component.
//! [`canonical_or_normalized`] additionally resolves symlinks in the part of
//! the path that exists on disk.

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path for prefix comparison.
pub fn normalize_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = expand_home(&raw);
    let composed: String = expanded.nfc().collect();

    let mut normalized = PathBuf::new();
    for component in Path::new(&composed).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                let leading_parent = normalized.as_os_str().is_empty()
                    || matches!(normalized.components().next_back(), Some(Component::ParentDir));
                if leading_parent {
                    normalized.push("..");
                } else {
                    // `..` at the root stays at the root
                    normalized.pop();
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Normalize a string path, e.g. one read from a descriptor file.
pub fn normalize_str(path: &str) -> PathBuf {
    normalize_path(Path::new(path.trim()))
}

/// Component-wise prefix test on normalized paths; `/repo-old` is not under `/repo`.
pub fn is_under(path: &Path, prefix: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(prefix))
}

/// First prefix in `prefixes` that covers `path`.
pub fn covering_prefix<'a>(path: &Path, prefixes: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let path = normalize_path(path);
    prefixes
        .iter()
        .find(|prefix| path.starts_with(normalize_path(prefix)))
}

/// Resolve symlinks through the deepest ancestor that exists on disk and
/// keep the remaining components as written. Working directories and
/// descriptor prefixes both go through here so they compare in one form.
pub fn canonical_or_normalized(path: &Path) -> PathBuf {
    let normalized = normalize_path(path);
    let mut missing = Vec::new();
    let mut existing = normalized.as_path();
    loop {
        if let Ok(canonical) = dunce::canonicalize(existing) {
            let resolved = missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
            return normalize_path(&resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

fn expand_home(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest).to_string_lossy().into_owned();
        }
    }
    raw.to_string()
}
