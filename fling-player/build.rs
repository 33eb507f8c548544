//! Build script for fling-player
//!
//! Embeds build identification (git revision, timestamp, profile) reported by
//! the startup banner and the /health endpoint.

use std::process::Command;

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn main() {
    let revision = git_revision().unwrap_or_else(|| "unknown".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=FLING_GIT_HASH={}", revision);
    println!("cargo:rustc-env=FLING_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=FLING_BUILD_PROFILE={}", profile);
    println!("cargo:rerun-if-changed=build.rs");
}
