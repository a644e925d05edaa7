use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::shaders;
use super::targets::{CANVAS_FORMAT, FieldFormats};
use crate::error::{DemoError, DemoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Clear,
    Display,
    Splat,
    Advection,
    Divergence,
    Curl,
    Vorticity,
    Pressure,
    GradientSubtract,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 9] = [
        ProgramKind::Clear,
        ProgramKind::Display,
        ProgramKind::Splat,
        ProgramKind::Advection,
        ProgramKind::Divergence,
        ProgramKind::Curl,
        ProgramKind::Vorticity,
        ProgramKind::Pressure,
        ProgramKind::GradientSubtract,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::Clear => "clear",
            ProgramKind::Display => "display",
            ProgramKind::Splat => "splat",
            ProgramKind::Advection => "advection",
            ProgramKind::Divergence => "divergence",
            ProgramKind::Curl => "curl",
            ProgramKind::Vorticity => "vorticity",
            ProgramKind::Pressure => "pressure",
            ProgramKind::GradientSubtract => "gradient-subtract",
        }
    }

    fn fragment_wgsl(self) -> &'static str {
        match self {
            ProgramKind::Clear => shaders::CLEAR_WGSL,
            ProgramKind::Display => shaders::DISPLAY_WGSL,
            ProgramKind::Splat => shaders::SPLAT_WGSL,
            ProgramKind::Advection => shaders::ADVECTION_WGSL,
            ProgramKind::Divergence => shaders::DIVERGENCE_WGSL,
            ProgramKind::Curl => shaders::CURL_WGSL,
            ProgramKind::Vorticity => shaders::VORTICITY_WGSL,
            ProgramKind::Pressure => shaders::PRESSURE_WGSL,
            ProgramKind::GradientSubtract => shaders::GRADIENT_SUBTRACT_WGSL,
        }
    }

    pub fn source(self) -> String {
        format!("{}{}", shaders::COMMON_WGSL, self.fragment_wgsl())
    }

    /// Number of field textures bound after the uniform block.
    pub fn texture_inputs(self) -> usize {
        match self {
            ProgramKind::Advection | ProgramKind::Vorticity | ProgramKind::Pressure | ProgramKind::GradientSubtract => 2,
            _ => 1,
        }
    }

    /// Render target formats this program draws into.
    fn target_formats(self, formats: &FieldFormats) -> Vec<wgpu::TextureFormat> {
        let mut out = match self {
            ProgramKind::Clear | ProgramKind::Divergence | ProgramKind::Curl | ProgramKind::Pressure => vec![formats.scalar],
            ProgramKind::Vorticity | ProgramKind::GradientSubtract => vec![formats.velocity],
            ProgramKind::Splat | ProgramKind::Advection => vec![formats.velocity, formats.density],
            ProgramKind::Display => vec![CANVAS_FORMAT, formats.probe],
        };
        out.dedup();
        out
    }
}

/// Per-pass uniforms, shared layout across every program.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassParams {
    pub texel_size: [f32; 2],
    pub dt: f32,
    pub dissipation: f32,
    pub point: [f32; 2],
    pub aspect_ratio: f32,
    pub radius: f32,
    pub color: [f32; 4],
    pub curl: f32,
    pub filter_linear: f32,
    pub _pad: [f32; 2],
}

pub struct Program {
    pub kind: ProgramKind,
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

/// Compiles `source` once and links a pipeline for every target format.
/// Any WGSL or pipeline validation error is returned with its diagnostic.
pub async fn compile_program(
    device: &wgpu::Device,
    kind: ProgramKind,
    source: &str,
    target_formats: &[wgpu::TextureFormat],
) -> DemoResult<Vec<(wgpu::TextureFormat, Program)>> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.name()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let mut programs = Vec::with_capacity(target_formats.len());
    for &format in target_formats {
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.name()),
            layout: None,
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });
        let layout = pipeline.get_bind_group_layout(0);
        programs.push((format, Program { kind, pipeline, layout }));
    }

    if let Some(err) = device.pop_error_scope().await {
        return Err(DemoError::ShaderCompile {
            program: kind.name(),
            diagnostic: err.to_string(),
        });
    }
    log::debug!("compiled {} program for {} target format(s)", kind.name(), programs.len());
    Ok(programs)
}

/// The fixed program set, one linked pipeline per (program, target format).
pub struct ProgramRegistry {
    programs: HashMap<(ProgramKind, wgpu::TextureFormat), Program>,
}

impl ProgramRegistry {
    pub async fn compile(device: &wgpu::Device, formats: &FieldFormats) -> DemoResult<Self> {
        let mut programs = HashMap::new();
        for kind in ProgramKind::ALL {
            let linked = compile_program(device, kind, &kind.source(), &kind.target_formats(formats)).await?;
            for (format, program) in linked {
                programs.insert((kind, format), program);
            }
        }
        Ok(Self { programs })
    }

    pub fn get(&self, kind: ProgramKind, format: wgpu::TextureFormat) -> DemoResult<&Program> {
        self.programs.get(&(kind, format)).ok_or(DemoError::MissingProgram {
            program: kind.name(),
            format: format!("{format:?}"),
        })
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::targets::FieldFilter;

    #[test]
    fn params_match_wgsl_uniform_layout() {
        assert_eq!(std::mem::size_of::<PassParams>(), 64);
        assert_eq!(std::mem::offset_of!(PassParams, color), 32);
        assert_eq!(std::mem::offset_of!(PassParams, curl), 48);
    }

    #[test]
    fn every_program_declares_both_stages_and_its_inputs() {
        for kind in ProgramKind::ALL {
            let src = kind.source();
            assert!(src.contains("fn vs_main"), "{}", kind.name());
            assert!(src.contains("fn fs_main"), "{}", kind.name());
            for binding in 1..=kind.texture_inputs() {
                assert!(src.contains(&format!("@binding({binding})")), "{} binding {binding}", kind.name());
            }
            assert!(!src.contains(&format!("@binding({})", kind.texture_inputs() + 1)));
        }
    }

    #[test]
    fn shared_formats_link_one_pipeline() {
        let formats = FieldFormats {
            velocity: wgpu::TextureFormat::Rgba16Float,
            density: wgpu::TextureFormat::Rgba16Float,
            scalar: wgpu::TextureFormat::R16Float,
            probe: wgpu::TextureFormat::Rgba32Float,
            filter: FieldFilter::Linear,
        };
        assert_eq!(ProgramKind::Splat.target_formats(&formats), vec![wgpu::TextureFormat::Rgba16Float]);
        assert_eq!(ProgramKind::Display.target_formats(&formats).len(), 2);

        let fallback = FieldFormats {
            probe: wgpu::TextureFormat::Rgba16Float,
            ..formats
        };
        assert_eq!(
            ProgramKind::Display.target_formats(&fallback),
            vec![CANVAS_FORMAT, wgpu::TextureFormat::Rgba16Float]
        );
    }
}
