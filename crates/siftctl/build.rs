// Build script for siftctl - embeds version at compile time

fn main() {
    // Release pipelines may set SIFT_VERSION; otherwise use Cargo.toml
    let version =
        std::env::var("SIFT_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=SIFT_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=SIFT_VERSION");
}
