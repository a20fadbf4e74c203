//! Filesystem locations used by jobsh.
//!
//! | Purpose | Source | Default |
//! |---------|--------|---------|
//! | Home (`cd` with no argument) | `$HOME` | platform home directory |
//! | Data | `$XDG_DATA_HOME/jobsh` | `~/.local/share/jobsh` |
//! | Auxiliary binaries | `$JOBSH_BIN_DIR` | `<data>/bin` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Environment variable that overrides the auxiliary binary directory.
pub const BIN_DIR_ENV: &str = "JOBSH_BIN_DIR";

/// Get the user's home directory.
///
/// Returns `$HOME` when set and non-empty, otherwise asks the platform.
pub fn home_dir() -> Option<PathBuf> {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => BaseDirs::new().map(|d| d.home_dir().to_path_buf()),
    }
}

/// Get XDG data home directory.
///
/// Returns `$XDG_DATA_HOME` or falls back to `~/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
}

/// Get the jobsh data directory.
pub fn data_dir() -> PathBuf {
    xdg_data_home().join("jobsh")
}

/// Get the auxiliary binary directory searched before `PATH`.
///
/// Uses `$JOBSH_BIN_DIR` or falls back to `<data>/bin`.
pub fn bin_dir() -> PathBuf {
    match std::env::var_os(BIN_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => data_dir().join("bin"),
    }
}
