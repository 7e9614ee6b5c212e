//! The WGSL module shared by the compute and render stages. Its Rust bindings are generated by
//! build.rs, so the structs, bind group layout and entry point names here always agree with
//! particles.wgsl.

#[allow(dead_code, non_snake_case)]
pub mod particles {
    include!(concat!(env!("OUT_DIR"), "/particles.rs"));
}

/// The pipeline-overridable constants for a given compute workgroup size.
pub fn override_constants(workgroup_size: u32) -> particles::OverrideConstants {
    particles::OverrideConstants {
        workgroupSize: Some(workgroup_size),
    }
}
