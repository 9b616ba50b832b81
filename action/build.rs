//! Build script for pages-await
//! Embeds the source revision and build time reported by `--version`

use chrono::Utc;
use std::process::Command;

fn short_sha(sha: &str) -> String {
    sha.trim().chars().take(7).collect()
}

fn main() {
    // Runners check out a detached commit; GITHUB_SHA names it even without .git
    let git_hash = std::env::var("GITHUB_SHA")
        .ok()
        .filter(|sha| !sha.trim().is_empty())
        .map(|sha| short_sha(&sha))
        .or_else(|| {
            Command::new("git")
                .args(["rev-parse", "--short=7", "HEAD"])
                .output()
                .ok()
                .filter(|output| output.status.success())
                .and_then(|output| String::from_utf8(output.stdout).ok())
                .map(|s| short_sha(&s))
        })
        .unwrap_or_else(|| "unknown".to_string());

    let build_time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
