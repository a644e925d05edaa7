//! Off-screen render targets for the fluid fields.
//!
//! Velocity, density and pressure are ping-pong pairs; curl and divergence
//! are scratch targets rebuilt every frame. All of them live at the
//! simulation resolution, while the canvas lives at the drawable size.

use serde::Serialize;

use crate::error::{DemoError, DemoResult};

pub const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoubleField {
    Velocity,
    Density,
    Pressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScratchField {
    Curl,
    Divergence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Zero-sized targets are invalid, so tiny drawables clamp to one texel.
    pub fn from_drawable(width: u32, height: u32, downsample: u32) -> Self {
        Self {
            width: (width >> downsample).max(1),
            height: (height >> downsample).max(1),
        }
    }

    /// Clamps a drawable size into `1..=max_dimension` on both sides.
    pub fn fit_drawable(drawable: (u32, u32), max_dimension: u32) -> (u32, u32) {
        let max = max_dimension.max(1);
        (drawable.0.clamp(1, max), drawable.1.clamp(1, max))
    }

    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFilter {
    Linear,
    Nearest,
}

/// Texture formats chosen for each field class after probing the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFormats {
    pub velocity: wgpu::TextureFormat,
    pub density: wgpu::TextureFormat,
    pub scalar: wgpu::TextureFormat,
    /// RGBA target that fields are copied into for readback.
    pub probe: wgpu::TextureFormat,
    pub filter: FieldFilter,
}

const HALF_FLOAT_CHAIN: [(u8, wgpu::TextureFormat); 3] = [
    (1, wgpu::TextureFormat::R16Float),
    (2, wgpu::TextureFormat::Rg16Float),
    (4, wgpu::TextureFormat::Rgba16Float),
];

fn renderable(features: &wgpu::TextureFormatFeatures) -> bool {
    features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
}

fn supported_format(
    features: &impl Fn(wgpu::TextureFormat) -> wgpu::TextureFormatFeatures,
    channels: u8,
) -> DemoResult<wgpu::TextureFormat> {
    for (n, format) in HALF_FLOAT_CHAIN.iter().filter(|(n, _)| *n >= channels) {
        if renderable(&features(*format)) {
            if *n != channels {
                log::warn!("{channels}-channel fields fall back to {format:?}");
            }
            return Ok(*format);
        }
    }
    Err(DemoError::NoRenderableFormat { channels })
}

impl FieldFormats {
    pub fn select(features: impl Fn(wgpu::TextureFormat) -> wgpu::TextureFormatFeatures) -> DemoResult<Self> {
        let velocity = supported_format(&features, 2)?;
        let density = supported_format(&features, 4)?;
        let scalar = supported_format(&features, 1)?;

        let probe = if renderable(&features(wgpu::TextureFormat::Rgba32Float)) {
            wgpu::TextureFormat::Rgba32Float
        } else {
            log::warn!("Rgba32Float is not renderable, reading fields back as {density:?}");
            density
        };

        let filterable = [velocity, density, scalar]
            .iter()
            .all(|f| features(*f).flags.contains(wgpu::TextureFormatFeatureFlags::FILTERABLE));
        let filter = if filterable {
            FieldFilter::Linear
        } else {
            log::warn!("half-float fields are not filterable, sampling with nearest");
            FieldFilter::Nearest
        };

        Ok(Self {
            velocity,
            density,
            scalar,
            probe,
            filter,
        })
    }

    pub fn double(&self, field: DoubleField) -> wgpu::TextureFormat {
        match field {
            DoubleField::Velocity => self.velocity,
            DoubleField::Density => self.density,
            DoubleField::Pressure => self.scalar,
        }
    }

    /// Bytes per probe texel in a readback.
    pub fn probe_texel_bytes(&self) -> u32 {
        match self.probe {
            wgpu::TextureFormat::Rgba32Float => 16,
            _ => 8,
        }
    }

    /// Decodes probe readback bytes into RGBA texels.
    pub fn decode_probe(&self, bytes: &[u8]) -> Vec<[f32; 4]> {
        match self.probe {
            wgpu::TextureFormat::Rgba32Float => bytes.chunks_exact(16).map(bytemuck::pod_read_unaligned).collect(),
            _ => bytes
                .chunks_exact(8)
                .map(|texel| bytemuck::pod_read_unaligned::<[half::f16; 4]>(texel).map(half::f16::to_f32))
                .collect(),
        }
    }
}

/// Two buffers labelled read and write; `swap` is the only way to relabel them.
#[derive(Debug)]
pub struct DoubleTarget<T> {
    read: T,
    write: T,
}

impl<T> DoubleTarget<T> {
    pub fn new(read: T, write: T) -> Self {
        Self { read, write }
    }

    pub fn read(&self) -> &T {
        &self.read
    }

    pub fn write(&self) -> &T {
        &self.write
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
    }
}

pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        resolution: Resolution,
        format: wgpu::TextureFormat,
        extra: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: resolution.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | extra,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn pair(device: &wgpu::Device, label: &str, resolution: Resolution, format: wgpu::TextureFormat) -> DoubleTarget<Self> {
        DoubleTarget::new(
            Self::new(device, &format!("{label}-a"), resolution, format, wgpu::TextureUsages::empty()),
            Self::new(device, &format!("{label}-b"), resolution, format, wgpu::TextureUsages::empty()),
        )
    }
}

/// Every GPU target the effect draws into. Rebuilt wholesale on resize.
pub struct FieldTargets {
    pub resolution: Resolution,
    pub canvas_size: Resolution,
    pub velocity: DoubleTarget<RenderTarget>,
    pub density: DoubleTarget<RenderTarget>,
    pub pressure: DoubleTarget<RenderTarget>,
    pub curl: RenderTarget,
    pub divergence: RenderTarget,
    pub canvas: RenderTarget,
    pub probe: RenderTarget,
}

impl FieldTargets {
    pub fn allocate(device: &wgpu::Device, formats: &FieldFormats, drawable: (u32, u32), downsample: u32) -> Self {
        let resolution = Resolution::from_drawable(drawable.0, drawable.1, downsample);
        let canvas_size = Resolution::from_drawable(drawable.0, drawable.1, 0);
        log::info!(
            "allocating fluid targets at {}x{} for a {}x{} canvas",
            resolution.width,
            resolution.height,
            canvas_size.width,
            canvas_size.height
        );

        Self {
            resolution,
            canvas_size,
            velocity: RenderTarget::pair(device, "velocity", resolution, formats.velocity),
            density: RenderTarget::pair(device, "density", resolution, formats.density),
            pressure: RenderTarget::pair(device, "pressure", resolution, formats.scalar),
            curl: RenderTarget::new(device, "curl", resolution, formats.scalar, wgpu::TextureUsages::empty()),
            divergence: RenderTarget::new(device, "divergence", resolution, formats.scalar, wgpu::TextureUsages::empty()),
            canvas: RenderTarget::new(device, "canvas", canvas_size, CANVAS_FORMAT, wgpu::TextureUsages::COPY_SRC),
            probe: RenderTarget::new(device, "probe", resolution, formats.probe, wgpu::TextureUsages::COPY_SRC),
        }
    }

    pub fn double(&self, field: DoubleField) -> &DoubleTarget<RenderTarget> {
        match field {
            DoubleField::Velocity => &self.velocity,
            DoubleField::Density => &self.density,
            DoubleField::Pressure => &self.pressure,
        }
    }

    pub fn scratch(&self, field: ScratchField) -> &RenderTarget {
        match field {
            ScratchField::Curl => &self.curl,
            ScratchField::Divergence => &self.divergence,
        }
    }

    pub fn swap(&mut self, field: DoubleField) {
        match field {
            DoubleField::Velocity => self.velocity.swap(),
            DoubleField::Density => self.density.swap(),
            DoubleField::Pressure => self.pressure.swap(),
        }
    }
}
