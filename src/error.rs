use thiserror::Error;

/// Everything that can stop us before the first frame. None of these are recoverable; `main`
/// reports them and exits.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("no GPU backend is available on this host: {0}")]
    NoBackend(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter was found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("could not open the GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface does not support any format for this adapter")]
    Surface,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration exceeds device limits: {0}")]
    DeviceLimits(String),
    #[error("failed to allocate GPU resources: {0}")]
    Allocation(wgpu::Error),
}
