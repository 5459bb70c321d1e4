use std::process::Command;

// Embeds the commit into `--version`. Packagers building outside a git
// checkout can set SITE_MONITOR_GIT_HASH instead.
fn main() {
    println!("cargo:rerun-if-env-changed=SITE_MONITOR_GIT_HASH");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let hash = std::env::var("SITE_MONITOR_GIT_HASH")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(git_short_hash)
        .unwrap_or_default();

    println!("cargo:rustc-env=GIT_HASH={}", hash);
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
