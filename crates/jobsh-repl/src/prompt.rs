//! Prompt rendering for the interactive shell.
//!
//! The prompt is `user@host:cwd$ ` (`#` for root), with `user@host` in bold
//! green and the directory in bold blue.

use std::path::Path;

use nix::unistd::{gethostname, getuid, User};
use owo_colors::OwoColorize;

/// Prompt used when the user, host or directory cannot be determined.
pub const FALLBACK_PROMPT: &str = "jobsh>> ";

/// Build the prompt for the current process.
pub fn prompt() -> String {
    let uid = getuid();
    let user = User::from_uid(uid).ok().flatten().map(|u| u.name);
    let host = gethostname().ok().and_then(|h| h.into_string().ok());
    let cwd = std::env::current_dir().ok();

    render(
        user.as_deref(),
        host.as_deref(),
        cwd.as_deref(),
        uid.is_root(),
        colors_enabled(),
    )
}

/// Render a prompt from its parts.
pub fn render(
    user: Option<&str>,
    host: Option<&str>,
    cwd: Option<&Path>,
    is_root: bool,
    color: bool,
) -> String {
    let (Some(user), Some(host), Some(cwd)) = (user, host, cwd) else {
        return FALLBACK_PROMPT.to_string();
    };
    let marker = if is_root { '#' } else { '$' };
    let who = format!("{}@{}", user, host);
    let cwd = cwd.display().to_string();

    if color {
        format!("{}:{}{} ", who.green().bold(), cwd.blue().bold(), marker)
    } else {
        format!("{}:{}{} ", who, cwd, marker)
    }
}

/// Colors are off when `NO_COLOR` is set or `TERM=dumb`.
fn colors_enabled() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    !std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt() {
        let p = render(Some("ada"), Some("box"), Some(Path::new("/tmp")), false, false);
        assert_eq!(p, "ada@box:/tmp$ ");
    }

    #[test]
    fn test_root_prompt() {
        let p = render(Some("root"), Some("box"), Some(Path::new("/")), true, false);
        assert_eq!(p, "root@box:/# ");
    }

    #[test]
    fn test_fallback_when_part_missing() {
        assert_eq!(render(None, Some("box"), Some(Path::new("/")), false, true), FALLBACK_PROMPT);
        assert_eq!(render(Some("ada"), Some("box"), None, false, true), FALLBACK_PROMPT);
    }

    #[test]
    fn test_colored_prompt_keeps_text() {
        let p = render(Some("ada"), Some("box"), Some(Path::new("/srv")), false, true);
        assert!(p.contains("\u{1b}["));
        assert!(p.contains("ada@box"));
        assert!(p.contains("/srv"));
        assert!(p.ends_with("$ "));
    }
}
