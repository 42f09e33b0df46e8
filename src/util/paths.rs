//! Path helpers for layer and asset paths.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `target` relative to the directory `base`.
///
/// Returns `None` when the two paths share no common root (different drives
/// or one of them relative), in which case callers keep the absolute path.
pub fn relative_path(target: &Path, base: &Path) -> Option<PathBuf> {
    if !target.is_absolute() || !base.is_absolute() {
        return None;
    }
    let target = normalize_path(target);
    let base = normalize_path(base);

    let t: Vec<Component> = target.components().collect();
    let b: Vec<Component> = base.components().collect();

    // Prefix (drive) and root must match
    let roots = |c: &Component| matches!(c, Component::Prefix(_) | Component::RootDir);
    let t_root: Vec<_> = t.iter().take_while(|c| roots(c)).collect();
    let b_root: Vec<_> = b.iter().take_while(|c| roots(c)).collect();
    if t_root != b_root {
        return None;
    }

    let common = t.iter().zip(b.iter()).take_while(|(a, b)| a == b).count();
    let mut rel = PathBuf::new();
    for _ in common..b.len() {
        rel.push("..");
    }
    for c in &t[common..] {
        rel.push(c.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

/// Render a path the way asset paths are written in layers (forward slashes).
pub fn asset_path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
