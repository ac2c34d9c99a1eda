use std::env;
use std::path::PathBuf;
use std::process::Command;
use which::which;

const PROTO: &str = "proto/activity.proto";
const GENERATED_DIR: &str = "src/client/generated";

fn main() {
    // Set build-time environment variables
    set_build_info();
    generate_grpc_code();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed={}", PROTO);
    println!("cargo:rerun-if-env-changed=PROTOC");
}

fn set_build_info() {
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    // Commit hash is optional; source tarballs build without git
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT={}", commit);

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET_TRIPLE={}", target);
}

/// Regenerate the checked-in gRPC bindings when protoc is available
fn generate_grpc_code() {
    let protoc = env::var_os("PROTOC").map(PathBuf::from).or_else(|| which("protoc").ok());
    if protoc.is_none() {
        println!("cargo:warning=protoc not found, using checked-in gRPC bindings");
        return;
    }

    let result = tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .out_dir(GENERATED_DIR)
        .compile(&[PROTO], &["proto"]);
    if let Err(err) = result {
        println!("cargo:warning=Failed to generate gRPC code: {}", err);
    }
}
