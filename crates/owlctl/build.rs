// Embeds the owlctl version string, e.g. `0.1.0 (3f2a9c1)`.

use std::process::Command;

fn git_short_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    (!sha.is_empty()).then(|| sha.to_string())
}

fn main() {
    let base = std::env::var("OWLMIND_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
    let version = match git_short_sha() {
        Some(sha) => format!("{} ({})", base, sha),
        None => base,
    };

    println!("cargo:rustc-env=OWLMIND_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=OWLMIND_VERSION");
    println!("cargo:rerun-if-changed=build.rs");
    if std::path::Path::new("../../.git/HEAD").exists() {
        println!("cargo:rerun-if-changed=../../.git/HEAD");
    }
}
