fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Central proto repo is at ../proto/ relative to core/
    let proto_root = "../proto";
    let source_proto = format!("{proto_root}/sparrow/config/v1/source.proto");
    let logger_proto = format!("{proto_root}/sparrow/logger/v1/logger.proto");

    println!("cargo:rerun-if-changed={source_proto}");
    println!("cargo:rerun-if-changed={logger_proto}");
    println!("cargo:rerun-if-env-changed=PROTOC");

    // Respect a caller-provided protoc, otherwise use the vendored binary.
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()
            .map_err(|e| format!("vendored protoc unavailable: {e}"))?;
        std::env::set_var("PROTOC", protoc);
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[&source_proto, &logger_proto], &[proto_root])?;

    Ok(())
}
