//! Program resolution.
//!
//! Names starting with `/` or `./` are used as typed. Anything else is
//! looked up in the auxiliary binary directory first, then on `PATH`.

use std::path::{Path, PathBuf};

/// Resolve a program name to the path handed to exec.
///
/// Falls back to the bare name when nothing matches, so the OS reports
/// the failure.
pub fn resolve_program(name: &str, aux_dir: Option<&Path>) -> PathBuf {
    if name.starts_with('/') || name.starts_with("./") {
        return PathBuf::from(name);
    }

    if let Some(dir) = aux_dir {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return candidate;
        }
    }

    let path_var = std::env::var("PATH").unwrap_or_default();
    resolve_in_path(name, &path_var).unwrap_or_else(|| PathBuf::from(name))
}

/// Find an executable named `name` in a colon-separated search path.
pub fn resolve_in_path(name: &str, path_var: &str) -> Option<PathBuf> {
    path_var
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
