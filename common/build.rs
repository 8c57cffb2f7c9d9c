fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc_path = protoc_bin_vendored::protoc_bin_path()?;
    unsafe {
        std::env::set_var("PROTOC", protoc_path);
    }

    println!("cargo:rerun-if-changed=proto/snake_room.proto");

    tonic_prost_build::configure().compile_protos(&["proto/snake_room.proto"], &["proto"])?;
    Ok(())
}
