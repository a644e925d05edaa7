use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("no GPU adapter: {0}")]
    NoAdapter(String),

    #[error("request_device failed: {0}")]
    Device(String),

    /// Carries the native WGSL/pipeline diagnostic verbatim.
    #[error("{program} program failed to build: {diagnostic}")]
    ShaderCompile {
        program: &'static str,
        diagnostic: String,
    },

    #[error("no {program} pipeline linked for {format}")]
    MissingProgram { program: &'static str, format: String },

    #[error("no renderable half-float format for {channels}-channel fields")]
    NoRenderableFormat { channels: u8 },

    #[error("buffer map failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("map_async channel closed")]
    MapChannelClosed,

    #[error("snapshot failed: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error("snapshot buffer does not match {width}x{height}")]
    SnapshotSize { width: u32, height: u32 },
}

pub type DemoResult<T> = Result<T, DemoError>;
