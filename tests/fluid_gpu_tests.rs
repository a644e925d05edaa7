use fluid_arcade::DemoError;
use fluid_arcade::fluid::programs::{ProgramKind, ProgramRegistry, compile_program};
use fluid_arcade::fluid::targets::{CANVAS_FORMAT, DoubleField};
use fluid_arcade::fluid::{FieldFormats, FluidConfig, FluidSim, PointerEvent, Resolution};

mod common;

fn quiet_config() -> FluidConfig {
    FluidConfig {
        pressure_iterations: 8,
        initial_splats_min: 0,
        initial_splats_max: 0,
        ..FluidConfig::default()
    }
}

#[test]
fn registry_links_every_program() {
    let Some(gpu) = common::try_gpu() else { return };
    let formats = FieldFormats::select(|f| gpu.format_features(f)).expect("half-float formats");
    let registry = pollster::block_on(ProgramRegistry::compile(&gpu.device, &formats)).expect("programs compile");

    assert!(registry.len() >= ProgramKind::ALL.len());
    assert!(registry.get(ProgramKind::Display, CANVAS_FORMAT).is_ok());
    assert!(registry.get(ProgramKind::Pressure, formats.scalar).is_ok());
    assert!(registry.get(ProgramKind::Splat, formats.density).is_ok());
    assert!(matches!(
        registry.get(ProgramKind::Pressure, CANVAS_FORMAT),
        Err(DemoError::MissingProgram { .. })
    ));
}

#[test]
fn broken_shader_is_a_fatal_compile_error() {
    let Some(gpu) = common::try_gpu() else { return };
    let formats = FieldFormats::select(|f| gpu.format_features(f)).expect("half-float formats");
    let source = format!("{}\nfn fs_main( {{", ProgramKind::Curl.source());

    let result = pollster::block_on(compile_program(&gpu.device, ProgramKind::Curl, &source, &[formats.scalar]));
    match result {
        Err(DemoError::ShaderCompile { program, diagnostic }) => {
            assert_eq!(program, "curl");
            assert!(!diagnostic.is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken WGSL compiled"),
    }
}

#[test]
fn opening_burst_runs_and_stays_finite() {
    let Some(gpu) = common::try_gpu() else { return };
    let config = FluidConfig {
        pressure_iterations: 10,
        ..FluidConfig::default()
    };
    let mut sim = pollster::block_on(FluidSim::new(&gpu, config, (64, 48))).expect("sim");
    for _ in 0..10 {
        sim.frame(1.0 / 60.0).expect("frame");
    }
    assert_eq!(sim.frames(), 10);

    let stats = sim.stats().expect("stats");
    assert!(stats.max_speed.is_finite());
    assert!(stats.max_divergence.is_finite());
    assert!(stats.density_total.is_finite());
    assert!(stats.density_total > 0.0);
    assert!(stats.max_speed > 0.0);
}

#[test]
fn resize_reallocates_at_downsampled_resolution() {
    let Some(gpu) = common::try_gpu() else { return };
    let mut sim = pollster::block_on(FluidSim::new(&gpu, quiet_config(), (64, 48))).expect("sim");
    assert_eq!(sim.resolution(), Resolution { width: 32, height: 24 });

    assert!(!sim.resize(64, 48));
    assert_eq!(sim.reallocations(), 0);

    let sizes = [(33, 17), (1, 1), (200, 3), (128, 128)];
    for (i, (w, h)) in sizes.into_iter().enumerate() {
        assert!(sim.resize(w, h));
        assert_eq!(sim.reallocations(), i as u32 + 1);
        assert_eq!(sim.resolution(), Resolution::from_drawable(w, h, 1));
        assert_eq!(sim.canvas_size(), Resolution { width: w, height: h });
        sim.frame(1.0 / 60.0).expect("frame after resize");
    }
    assert_eq!(sim.resolution(), Resolution { width: 64, height: 64 });
    assert_eq!(sim.read_canvas().expect("canvas").len(), 128 * 128 * 4);
}

#[test]
fn oversized_drawable_clamps_to_the_device_limit() {
    let Some(gpu) = common::try_gpu() else { return };
    let limit = gpu.max_texture_dimension();
    let mut sim = pollster::block_on(FluidSim::new(&gpu, quiet_config(), (64, 48))).expect("sim");

    assert!(sim.resize(limit + 2, 8));
    assert_eq!(sim.canvas_size(), Resolution { width: limit, height: 8 });
    assert_eq!(sim.resolution(), Resolution::from_drawable(limit, 8, 1));
    sim.frame(0.016).expect("frame at the texture limit");
    assert!(!sim.resize(limit + 100, 8));

    let wide = pollster::block_on(FluidSim::new(&gpu, quiet_config(), (limit * 2, 4))).expect("sim");
    assert_eq!(wide.canvas_size().width, limit);
}

fn opening_frame(gpu: &fluid_arcade::gpu::Gpu, config: FluidConfig) -> FluidSim<'_> {
    let mut sim = pollster::block_on(FluidSim::new(gpu, config, (128, 128))).expect("sim");
    sim.frame(0.016).expect("frame");
    sim
}

#[test]
fn more_pressure_iterations_leave_less_divergence() {
    let Some(gpu) = common::try_gpu() else { return };
    let config = |pressure_iterations| FluidConfig {
        curl: 0.0,
        pressure_iterations,
        ..FluidConfig::default()
    };
    let shallow = opening_frame(&gpu, config(1)).stats().expect("stats");
    let deep = opening_frame(&gpu, config(100)).stats().expect("stats");

    assert!(shallow.avg_divergence > 0.0);
    assert!(
        deep.avg_divergence < shallow.avg_divergence * 0.9,
        "{} vs {}",
        deep.avg_divergence,
        shallow.avg_divergence
    );
}

#[test]
fn vorticity_confinement_changes_the_velocity_field() {
    let Some(gpu) = common::try_gpu() else { return };
    let config = |curl| FluidConfig { curl, ..FluidConfig::default() };
    let still = opening_frame(&gpu, config(0.0)).read_field(DoubleField::Velocity).expect("velocity");
    let swirled = opening_frame(&gpu, config(28.0)).read_field(DoubleField::Velocity).expect("velocity");

    assert_eq!(still.len(), swirled.len());
    let max_change = still
        .iter()
        .zip(&swirled)
        .map(|(a, b)| (a[0] - b[0]).abs().max((a[1] - b[1]).abs()))
        .fold(0.0f32, f32::max);
    assert!(max_change > 1e-2, "max change {max_change}");
}

#[test]
fn only_moving_pointers_leave_dye() {
    let Some(gpu) = common::try_gpu() else { return };
    let mut sim = pollster::block_on(FluidSim::new(&gpu, quiet_config(), (64, 48))).expect("sim");

    sim.frame(0.016).expect("frame");
    assert_eq!(sim.stats().expect("stats").density_total, 0.0);

    sim.handle_event(&PointerEvent::MouseDown);
    sim.handle_event(&PointerEvent::MouseMove { x: 0.0, y: 0.0 });
    sim.frame(0.016).expect("frame");
    assert_eq!(sim.stats().expect("stats").density_total, 0.0);
    assert!(!sim.pointers().pointers()[0].moved);

    sim.handle_event(&PointerEvent::MouseMove { x: 10.0, y: 10.0 });
    sim.frame(0.016).expect("frame");
    assert!(sim.stats().expect("stats").density_total > 0.0);
}

#[test]
fn queued_burst_is_consumed_on_the_next_frame() {
    let Some(gpu) = common::try_gpu() else { return };
    let mut sim = pollster::block_on(FluidSim::new(&gpu, quiet_config(), (64, 48))).expect("sim");
    sim.frame(0.016).expect("frame");
    sim.push_burst(12);
    sim.frame(0.016).expect("frame");
    assert!(sim.stats().expect("stats").density_total > 0.0);
}

#[test]
fn snapshot_writes_canvas_png() {
    let Some(gpu) = common::try_gpu() else { return };
    let mut sim = pollster::block_on(FluidSim::new(&gpu, FluidConfig::default(), (40, 30))).expect("sim");
    sim.frame(0.016).expect("frame");

    let path = std::env::temp_dir().join(format!("fluid-arcade-snapshot-{}.png", std::process::id()));
    sim.save_snapshot(&path).expect("snapshot");
    let img = image::open(&path).expect("png readable");
    assert_eq!((img.width(), img.height()), (40, 30));
    let _ = std::fs::remove_file(&path);
}
