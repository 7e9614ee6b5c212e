//! Generates the Rust side of every WGSL module: the shared structs, bind groups, pipeline
//! layout, entry point names and override constants. The output lands in `OUT_DIR` and is
//! pulled in by `src/shaders/mod.rs`.

use std::path::Path;

const SHADERS: &[&str] = &["particles"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let out_dir = std::env::var("OUT_DIR")?;

    let options = wgsl_to_wgpu::WriteOptions {
        derive_bytemuck_host_shareable: true,
        matrix_vector_types: wgsl_to_wgpu::MatrixVectorTypes::Glam,
        validate: Some(Default::default()),
        ..Default::default()
    };

    for name in SHADERS {
        let wgsl_file = Path::new(&manifest_dir)
            .join("src/shaders")
            .join(format!("{name}.wgsl"));
        println!("cargo:rerun-if-changed={}", wgsl_file.display());

        let wgsl_source = std::fs::read_to_string(&wgsl_file)?;
        let include_path = wgsl_file.to_string_lossy();

        let text = wgsl_to_wgpu::create_shader_module(&wgsl_source, &include_path, options)
            .inspect_err(|error| error.emit_to_stderr_with_path(&wgsl_source, &wgsl_file))
            // Don't print out same error twice
            .map_err(|_| format!("Failed to validate {name}.wgsl"))?;

        std::fs::write(Path::new(&out_dir).join(format!("{name}.rs")), text.as_bytes())?;
    }

    Ok(())
}
