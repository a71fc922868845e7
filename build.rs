use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    for (proto, descriptor) in [
        ("proto/transform.proto", "transform_descriptor.bin"),
        ("proto/simplestore.proto", "simplestore_descriptor.bin"),
    ] {
        tonic_build::configure()
            .build_server(true)
            .file_descriptor_set_path(out_dir.join(descriptor))
            .compile(&[proto], &["proto"])
            .unwrap_or_else(|e| panic!("Failed to compile {proto} {:?}", e));
        println!("cargo:rerun-if-changed={proto}");
    }
    Ok(())
}
