//! Stamps `jobsh --version` with the commit it was built from and the
//! build day.

use std::path::Path;
use std::process::Command;

/// Run git in the crate directory and return its trimmed stdout.
fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").current_dir(dir).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    let crate_dir = std::env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let crate_dir = Path::new(&crate_dir);

    // Source tarballs have no repository; the stamp is then "unknown".
    if let Some(git_dir) = git(crate_dir, &["rev-parse", "--absolute-git-dir"]) {
        let git_dir = Path::new(&git_dir);
        println!("cargo::rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo::rerun-if-changed={}", git_dir.join("refs/heads").display());
    }
    println!("cargo::rerun-if-changed=build.rs");

    let commit = git(crate_dir, &["rev-parse", "--short=10", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let day = chrono::Utc::now().date_naive();

    println!("cargo::rustc-env=JOBSH_GIT_HASH={commit}");
    println!("cargo::rustc-env=JOBSH_BUILD_DATE={day}");
}
