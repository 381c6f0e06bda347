// build.rs
use std::path::Path;

fn main() {
    let proto_file = "proto/analyzer.proto";

    if !Path::new(proto_file).exists() {
        panic!("Proto file not found: {}", proto_file);
    }

    println!("cargo:rerun-if-changed={}", proto_file);

    // Regenerate into src/proto when protoc is around, otherwise keep the committed bindings.
    let result = tonic_build::configure()
        .out_dir("src/proto")
        .build_server(true)
        .build_client(true)
        .compile(&[proto_file], &["proto/"]);

    if let Err(e) = result {
        println!(
            "cargo:warning=Failed to compile protos: {}. Using pre-generated bindings.",
            e
        );
    }
}
