//! Build script: embeds the version string via `MICRODOTS_VERSION`.

use std::process::Command;

fn main() {
    // Release workflows pin MICRODOTS_VERSION; local builds get the git
    // describe output, and plain source archives fall back to the cargo
    // package version at runtime.
    let version = std::env::var("MICRODOTS_VERSION")
        .ok()
        .or_else(git_describe);
    if let Some(version) = version {
        println!("cargo:rustc-env=MICRODOTS_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=MICRODOTS_VERSION");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
