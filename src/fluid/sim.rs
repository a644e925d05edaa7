use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::config::FluidConfig;
use super::pointer::{PointerEvent, PointerTracker, Splat, random_splats};
use super::programs::{PassParams, ProgramRegistry};
use super::schedule::{self, FrameInputs, PassStep, Source, Target};
use super::targets::{CANVAS_FORMAT, DoubleField, FieldFilter, FieldFormats, FieldTargets, Resolution};
use crate::error::{DemoError, DemoResult};
use crate::gpu::{self, Gpu};

#[derive(Debug, Clone, Serialize)]
pub struct FieldStats {
    pub avg_speed: f32,
    pub max_speed: f32,
    pub avg_divergence: f32,
    pub max_divergence: f32,
    pub density_footprint: f32,
    pub density_total: f32,
}

/// The splat effect: fields, programs and input state bound to one device.
pub struct FluidSim<'g> {
    gpu: &'g Gpu,
    config: FluidConfig,
    formats: FieldFormats,
    programs: ProgramRegistry,
    targets: FieldTargets,
    drawable: (u32, u32),
    pointers: PointerTracker,
    splat_stack: Vec<u32>,
    rng: StdRng,
    uniform_slots: Vec<wgpu::Buffer>,
    frames: u64,
    reallocations: u32,
}

impl<'g> FluidSim<'g> {
    pub async fn new(gpu: &'g Gpu, config: FluidConfig, drawable: (u32, u32)) -> DemoResult<Self> {
        let config = config.sanitized();
        let drawable = fit_drawable(gpu, drawable);
        let formats = FieldFormats::select(|f| gpu.format_features(f))?;
        let programs = ProgramRegistry::compile(&gpu.device, &formats).await?;
        let targets = FieldTargets::allocate(&gpu.device, &formats, drawable, config.texture_downsample);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let opening = if config.initial_splats_max > config.initial_splats_min {
            rng.gen_range(config.initial_splats_min..config.initial_splats_max)
        } else {
            config.initial_splats_min
        };

        Ok(Self {
            gpu,
            config,
            formats,
            programs,
            targets,
            drawable,
            pointers: PointerTracker::new(config.pointer_delta_scale),
            splat_stack: vec![opening],
            rng,
            uniform_slots: Vec::new(),
            frames: 0,
            reallocations: 0,
        })
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    pub fn formats(&self) -> &FieldFormats {
        &self.formats
    }

    pub fn resolution(&self) -> Resolution {
        self.targets.resolution
    }

    pub fn canvas_size(&self) -> Resolution {
        self.targets.canvas_size
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    pub fn pointers(&self) -> &PointerTracker {
        &self.pointers
    }

    pub fn handle_event(&mut self, event: &PointerEvent) {
        self.pointers.handle(event, &mut self.rng);
    }

    /// Queues a burst of random splats; one queued burst is injected per frame.
    pub fn push_burst(&mut self, count: u32) {
        self.splat_stack.push(count);
    }

    /// Reallocates every target when the drawable size changed, dropping the
    /// simulation state. Returns whether anything was reallocated.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let drawable = fit_drawable(self.gpu, (width, height));
        if self.drawable == drawable {
            return false;
        }
        self.drawable = drawable;
        self.targets = FieldTargets::allocate(&self.gpu.device, &self.formats, self.drawable, self.config.texture_downsample);
        self.reallocations += 1;
        true
    }

    fn inputs<'a>(&'a self, dt: f32, splats: &'a [Splat]) -> FrameInputs<'a> {
        FrameInputs {
            config: &self.config,
            resolution: self.targets.resolution,
            canvas: self.targets.canvas_size,
            dt,
            filter: self.formats.filter,
            splats,
        }
    }

    /// Runs one frame of the pipeline. `elapsed` is the wall time since the
    /// previous frame in seconds and is capped at `max_dt`.
    pub fn frame(&mut self, elapsed: f32) -> DemoResult<()> {
        let dt = frame_dt(elapsed, self.config.max_dt);

        let mut splats = Vec::new();
        if let Some(count) = self.splat_stack.pop() {
            splats.extend(random_splats(&mut self.rng, count, self.drawable));
        }
        splats.extend(self.pointers.take_splats());
        if !splats.is_empty() {
            log::debug!("frame {}: injecting {} splat(s)", self.frames, splats.len());
        }

        let steps = schedule::build_frame(&self.inputs(dt, &splats));
        self.execute(&steps)?;
        self.frames += 1;
        Ok(())
    }

    fn ensure_uniform_slots(&mut self, count: usize) {
        while self.uniform_slots.len() < count {
            let slot = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("pass-params"),
                size: std::mem::size_of::<PassParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.uniform_slots.push(slot);
        }
    }

    fn target_format(&self, target: Target) -> wgpu::TextureFormat {
        match target {
            Target::Write(field) => self.formats.double(field),
            Target::Scratch(_) => self.formats.scalar,
            Target::Canvas => CANVAS_FORMAT,
            Target::Probe => self.formats.probe,
        }
    }

    /// Encodes every step into one command buffer, swapping ping-pong pairs
    /// after each write, and submits it.
    fn execute(&mut self, steps: &[PassStep]) -> DemoResult<()> {
        self.ensure_uniform_slots(steps.len());
        for (step, slot) in steps.iter().zip(&self.uniform_slots) {
            self.gpu.queue.write_buffer(slot, 0, bytemuck::bytes_of(&step.params));
        }

        let device = &self.gpu.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("fluid-frame"),
        });

        for (step, slot) in steps.iter().zip(&self.uniform_slots) {
            let program = self.programs.get(step.program, self.target_format(step.target))?;
            debug_assert_eq!(step.sources.len(), step.program.texture_inputs());

            let bind_group = {
                let mut entries = vec![wgpu::BindGroupEntry {
                    binding: 0,
                    resource: slot.as_entire_binding(),
                }];
                for (i, source) in step.sources.iter().enumerate() {
                    let view = match source {
                        Source::Read(field) => &self.targets.double(*field).read().view,
                        Source::Scratch(field) => &self.targets.scratch(*field).view,
                    };
                    entries.push(wgpu::BindGroupEntry {
                        binding: i as u32 + 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    });
                }
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(step.program.name()),
                    layout: &program.layout,
                    entries: &entries,
                })
            };

            let view = match step.target {
                Target::Write(field) => &self.targets.double(field).write().view,
                Target::Scratch(field) => &self.targets.scratch(field).view,
                Target::Canvas => &self.targets.canvas.view,
                Target::Probe => &self.targets.probe.view,
            };
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(step.program.name()),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    ..Default::default()
                });
                pass.set_pipeline(&program.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            if let Some(field) = step.swaps() {
                self.targets.swap(field);
            }
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    /// Reads one field back through the probe target as RGBA texels.
    pub fn read_field(&mut self, field: DoubleField) -> DemoResult<Vec<[f32; 4]>> {
        let step = schedule::probe_step(&self.inputs(0.0, &[]), field);
        self.execute(std::slice::from_ref(&step))?;
        let bytes = gpu::read_texture(
            &self.gpu.device,
            &self.gpu.queue,
            &self.targets.probe.texture,
            self.formats.probe_texel_bytes(),
        )?;
        Ok(self.formats.decode_probe(&bytes))
    }

    /// The presented canvas as tightly packed RGBA8 rows.
    pub fn read_canvas(&self) -> DemoResult<Vec<u8>> {
        gpu::read_texture(&self.gpu.device, &self.gpu.queue, &self.targets.canvas.texture, 4)
    }

    pub fn save_snapshot(&self, path: &Path) -> DemoResult<()> {
        let size = self.targets.canvas_size;
        let pixels = self.read_canvas()?;
        let image = image::RgbaImage::from_raw(size.width, size.height, pixels).ok_or(DemoError::SnapshotSize {
            width: size.width,
            height: size.height,
        })?;
        image.save(path)?;
        log::info!("wrote {}x{} snapshot to {}", size.width, size.height, path.display());
        Ok(())
    }

    pub fn stats(&mut self) -> DemoResult<FieldStats> {
        let res = self.targets.resolution;
        let velocity = self.read_field(DoubleField::Velocity)?;
        let density = self.read_field(DoubleField::Density)?;
        Ok(field_stats(res, &velocity, &density))
    }

    pub fn filter(&self) -> FieldFilter {
        self.formats.filter
    }
}

fn fit_drawable(gpu: &Gpu, drawable: (u32, u32)) -> (u32, u32) {
    let fitted = Resolution::fit_drawable(drawable, gpu.max_texture_dimension());
    if fitted != drawable {
        log::warn!("drawable {drawable:?} clamped to {fitted:?}");
    }
    fitted
}

/// Seconds to simulate for a frame; non-finite wall times count as a stall.
fn frame_dt(elapsed: f32, max_dt: f32) -> f32 {
    if elapsed.is_finite() {
        elapsed.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

/// Speed, central-difference divergence and dye coverage over a readback.
pub fn field_stats(res: Resolution, velocity: &[[f32; 4]], density: &[[f32; 4]]) -> FieldStats {
    let cells = res.cells().max(1);
    let w = res.width as usize;
    let h = res.height as usize;

    let mut sum_speed = 0.0f32;
    let mut max_speed = 0.0f32;
    for v in velocity {
        let s = (v[0] * v[0] + v[1] * v[1]).sqrt();
        sum_speed += s;
        max_speed = max_speed.max(s);
    }

    let mut sum_div = 0.0f32;
    let mut max_div = 0.0f32;
    if velocity.len() >= w * h {
        for y in 0..h {
            let ym = y.saturating_sub(1);
            let yp = (y + 1).min(h - 1);
            for x in 0..w {
                let xm = x.saturating_sub(1);
                let xp = (x + 1).min(w - 1);
                let vl = velocity[y * w + xm][0];
                let vr = velocity[y * w + xp][0];
                let vb = velocity[ym * w + x][1];
                let vt = velocity[yp * w + x][1];
                let d = (0.5 * ((vr - vl) + (vt - vb))).abs();
                sum_div += d;
                max_div = max_div.max(d);
            }
        }
    }

    let mut density_total = 0.0f32;
    let mut covered = 0usize;
    for d in density {
        let v = d[0] + d[1] + d[2];
        density_total += v;
        if v > 0.01 {
            covered += 1;
        }
    }

    FieldStats {
        avg_speed: sum_speed / cells as f32,
        max_speed,
        avg_divergence: sum_div / cells as f32,
        max_divergence: max_div,
        density_footprint: covered as f32 / cells as f32,
        density_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_is_capped_and_finite() {
        assert_eq!(frame_dt(0.01, 0.016), 0.01);
        assert_eq!(frame_dt(0.5, 0.016), 0.016);
        assert_eq!(frame_dt(-1.0, 0.016), 0.0);
        assert_eq!(frame_dt(f32::NAN, 0.016), 0.0);
        assert_eq!(frame_dt(f32::INFINITY, 0.016), 0.0);
    }

    #[test]
    fn stats_of_still_field_are_zero() {
        let res = Resolution { width: 4, height: 3 };
        let zeros = vec![[0.0; 4]; res.cells()];
        let stats = field_stats(res, &zeros, &zeros);
        assert_eq!(stats.max_speed, 0.0);
        assert_eq!(stats.max_divergence, 0.0);
        assert_eq!(stats.density_footprint, 0.0);
    }

    #[test]
    fn uniform_flow_has_speed_but_no_divergence() {
        let res = Resolution { width: 5, height: 5 };
        let velocity = vec![[3.0, 4.0, 0.0, 1.0]; res.cells()];
        let mut density = vec![[0.0; 4]; res.cells()];
        density[12] = [1.0, 0.5, 0.5, 1.0];
        let stats = field_stats(res, &velocity, &density);
        assert_eq!(stats.avg_speed, 5.0);
        assert_eq!(stats.max_divergence, 0.0);
        assert_eq!(stats.density_total, 2.0);
        assert_eq!(stats.density_footprint, 1.0 / 25.0);
    }

    #[test]
    fn outward_flow_diverges() {
        let res = Resolution { width: 3, height: 1 };
        let velocity = vec![[-1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]];
        let stats = field_stats(res, &velocity, &[]);
        assert_eq!(stats.max_divergence, 1.0);
    }
}
