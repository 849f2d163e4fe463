//! Embeds the build's version string as `INIEDIT_VERSION`.
//!
//! A release pipeline pins the version through the environment; local
//! builds describe the current git checkout instead. When neither is
//! available the binary reports the package version.

use std::process::Command;

const VERSION_ENV: &str = "INIEDIT_VERSION";

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}

fn main() {
    let version = std::env::var(VERSION_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(git_describe);
    if let Some(version) = version {
        println!("cargo:rustc-env={VERSION_ENV}={version}");
    }

    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
    println!("cargo:rerun-if-env-changed={VERSION_ENV}");
}
