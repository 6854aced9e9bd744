use std::process::Command;

/// Run git and return trimmed stdout on success
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    // Container builds have no .git; let them pass the hash in
    let build_hash = std::env::var("CUNSLT_BUILD_HASH").ok().or_else(|| {
        let hash = git(&["rev-parse", "--short", "HEAD"])?;
        let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
            .is_some_and(|s| !s.is_empty());
        Some(if dirty { format!("{}-dirty", hash) } else { hash })
    });

    println!(
        "cargo:rustc-env=GIT_HASH={}",
        build_hash.unwrap_or_else(|| "unknown".to_string())
    );
    println!("cargo:rerun-if-env-changed=CUNSLT_BUILD_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
