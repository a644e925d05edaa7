//! One frame of the effect as plain data.
//!
//! Steps name logical halves of the ping-pong pairs instead of GPU objects.
//! A step may only read `Read` halves or scratch targets and may only write a
//! `Write` half, a scratch target, the canvas or the probe; writing a `Write`
//! half implies swapping that pair right after the step.

use super::config::FluidConfig;
use super::pointer::Splat;
use super::programs::{PassParams, ProgramKind};
use super::targets::{DoubleField, FieldFilter, Resolution, ScratchField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Read(DoubleField),
    Scratch(ScratchField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Write(DoubleField),
    Scratch(ScratchField),
    Canvas,
    Probe,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassStep {
    pub program: ProgramKind,
    pub sources: Vec<Source>,
    pub target: Target,
    pub params: PassParams,
}

impl PassStep {
    pub fn swaps(&self) -> Option<DoubleField> {
        match self.target {
            Target::Write(field) => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub config: &'a FluidConfig,
    pub resolution: Resolution,
    pub canvas: Resolution,
    pub dt: f32,
    pub filter: FieldFilter,
    pub splats: &'a [Splat],
}

impl FrameInputs<'_> {
    fn base(&self) -> PassParams {
        PassParams {
            texel_size: self.resolution.texel_size(),
            dt: self.dt,
            dissipation: 1.0,
            point: [0.0, 0.0],
            aspect_ratio: self.canvas.width as f32 / self.canvas.height as f32,
            radius: self.config.splat_radius,
            color: [0.0; 4],
            curl: self.config.curl,
            filter_linear: match self.filter {
                FieldFilter::Linear => 1.0,
                FieldFilter::Nearest => 0.0,
            },
            _pad: [0.0; 2],
        }
    }
}

fn step(program: ProgramKind, sources: &[Source], target: Target, params: PassParams) -> PassStep {
    PassStep {
        program,
        sources: sources.to_vec(),
        target,
        params,
    }
}

fn splat_steps(inputs: &FrameInputs<'_>, splat: &Splat, out: &mut Vec<PassStep>) {
    let base = inputs.base();
    let point = [
        splat.x / inputs.canvas.width as f32,
        splat.y / inputs.canvas.height as f32,
    ];
    let scale = inputs.config.density_splat_scale;

    out.push(step(
        ProgramKind::Splat,
        &[Source::Read(DoubleField::Velocity)],
        Target::Write(DoubleField::Velocity),
        PassParams {
            point,
            color: [splat.dx, splat.dy, 1.0, 0.0],
            ..base
        },
    ));
    out.push(step(
        ProgramKind::Splat,
        &[Source::Read(DoubleField::Density)],
        Target::Write(DoubleField::Density),
        PassParams {
            point,
            color: [splat.color[0] * scale, splat.color[1] * scale, splat.color[2] * scale, 0.0],
            ..base
        },
    ));
}

/// Builds the full pass list for one frame in pipeline order.
pub fn build_frame(inputs: &FrameInputs<'_>) -> Vec<PassStep> {
    use DoubleField::{Density, Pressure, Velocity};
    use ScratchField::{Curl, Divergence};

    let config = inputs.config;
    let base = inputs.base();
    let mut steps = Vec::with_capacity(9 + 2 * inputs.splats.len() + config.pressure_iterations as usize);

    steps.push(step(
        ProgramKind::Advection,
        &[Source::Read(Velocity), Source::Read(Velocity)],
        Target::Write(Velocity),
        PassParams {
            dissipation: config.velocity_dissipation,
            ..base
        },
    ));
    steps.push(step(
        ProgramKind::Advection,
        &[Source::Read(Velocity), Source::Read(Density)],
        Target::Write(Density),
        PassParams {
            dissipation: config.density_dissipation,
            ..base
        },
    ));

    for splat in inputs.splats {
        splat_steps(inputs, splat, &mut steps);
    }

    steps.push(step(ProgramKind::Curl, &[Source::Read(Velocity)], Target::Scratch(Curl), base));
    steps.push(step(
        ProgramKind::Vorticity,
        &[Source::Read(Velocity), Source::Scratch(Curl)],
        Target::Write(Velocity),
        base,
    ));
    steps.push(step(ProgramKind::Divergence, &[Source::Read(Velocity)], Target::Scratch(Divergence), base));
    steps.push(step(
        ProgramKind::Clear,
        &[Source::Read(Pressure)],
        Target::Write(Pressure),
        PassParams {
            dissipation: config.pressure_dissipation,
            ..base
        },
    ));
    for _ in 0..config.pressure_iterations {
        steps.push(step(
            ProgramKind::Pressure,
            &[Source::Read(Pressure), Source::Scratch(Divergence)],
            Target::Write(Pressure),
            base,
        ));
    }
    steps.push(step(
        ProgramKind::GradientSubtract,
        &[Source::Read(Pressure), Source::Read(Velocity)],
        Target::Write(Velocity),
        base,
    ));
    steps.push(step(ProgramKind::Display, &[Source::Read(Density)], Target::Canvas, base));

    steps
}

/// Copies one field into the probe target for readback.
pub fn probe_step(inputs: &FrameInputs<'_>, field: DoubleField) -> PassStep {
    step(ProgramKind::Display, &[Source::Read(field)], Target::Probe, inputs.base())
}
