use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let version = env!("CARGO_PKG_VERSION");
    let tagged = git(&["tag", "--points-at", "HEAD"])
        .map(|tags| tags.lines().any(|tag| tag == version || tag == format!("v{}", version)))
        .unwrap_or(false);
    let dirty = git(&["status", "--porcelain"]).is_some_and(|status| !status.is_empty());

    // Release builds report the bare version; anything else gets `@<hash>`.
    let build = match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if !hash.is_empty() && !(tagged && !dirty) => {
            let suffix = if dirty { "-dirty" } else { "" };
            format!("{}@{}{}", version, hash, suffix)
        }
        _ => version.to_string(),
    };

    println!("cargo:rustc-env=HEROSYNC_VERSION={}", build);
}
