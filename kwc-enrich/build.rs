//! Stamps the binary with the source revision and build time
//!
//! Exposed to the crate as `KWC_BUILD_COMMIT`, `KWC_BUILD_TIME` (UTC) and
//! `KWC_BUILD_PROFILE`; reported by the startup log and `GET /health`.

use std::path::Path;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let commit = git(&["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| "unknown".to_string());
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=KWC_BUILD_COMMIT={}", commit);
    println!("cargo:rustc-env=KWC_BUILD_TIME={}", built_at);
    println!("cargo:rustc-env=KWC_BUILD_PROFILE={}", profile);

    if let Some(head) = git(&["rev-parse", "--git-path", "HEAD"]) {
        if Path::new(&head).exists() {
            println!("cargo:rerun-if-changed={}", head);
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
}
