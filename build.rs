//! Build script stamping the commit and branch into the binary.
use std::process::Command;

/// Run `git` with `args` and return its trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    // Prefer explicit env vars (e.g. set by a release workflow), otherwise
    // fall back to git for local development builds.
    let commit = std::env::var("TWEAKS_BUILD_COMMIT")
        .ok()
        .or_else(|| git(&["rev-parse", "--short", "HEAD"]));
    let branch = std::env::var("TWEAKS_BUILD_BRANCH")
        .ok()
        .or_else(|| git(&["rev-parse", "--abbrev-ref", "HEAD"]));

    if let Some(commit) = commit {
        println!("cargo:rustc-env=TWEAKS_BUILD_COMMIT={commit}");
    }
    if let Some(branch) = branch {
        println!("cargo:rustc-env=TWEAKS_BUILD_BRANCH={branch}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=TWEAKS_BUILD_COMMIT");
    println!("cargo:rerun-if-env-changed=TWEAKS_BUILD_BRANCH");
}
