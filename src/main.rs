use anyhow::{Context, Result};
use fluid_arcade::arcade::{self, ArcadeConfig, Crash, Status, World};
use fluid_arcade::fluid::programs::ProgramRegistry;
use fluid_arcade::fluid::{FieldFilter, FieldFormats, FieldStats, FluidConfig, FluidSim, PointerEvent, Resolution};
use fluid_arcade::gpu::Gpu;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Request {
    Probe,
    FluidRun {
        #[serde(default = "default_fluid_width")]
        width: u32,
        #[serde(default = "default_fluid_height")]
        height: u32,
        #[serde(default = "default_fluid_frames")]
        frames: u32,
        #[serde(default = "default_frame_ms")]
        frame_ms: f32,
        #[serde(default)]
        config: FluidConfig,
        #[serde(default)]
        events: Vec<ScriptedEvent>,
        #[serde(default)]
        resizes: Vec<ScriptedResize>,
        snapshot: Option<PathBuf>,
    },
    ArcadeRun {
        #[serde(default = "default_arcade_width")]
        width: u32,
        #[serde(default = "default_arcade_height")]
        height: u32,
        #[serde(default = "default_arcade_frames")]
        frames: u32,
        #[serde(default = "default_frame_ms")]
        frame_ms: f32,
        #[serde(default)]
        flaps: Vec<u32>,
        #[serde(default)]
        autopilot: bool,
        seed: Option<u64>,
        #[serde(default)]
        config: ArcadeConfig,
        snapshot: Option<PathBuf>,
    },
}

fn default_fluid_width() -> u32 { 512 }
fn default_fluid_height() -> u32 { 512 }
fn default_fluid_frames() -> u32 { 60 }
fn default_arcade_width() -> u32 { 400 }
fn default_arcade_height() -> u32 { 600 }
fn default_arcade_frames() -> u32 { 600 }
fn default_frame_ms() -> f32 { 1000.0 / 60.0 }

#[derive(Debug, Deserialize)]
struct ScriptedEvent {
    frame: u32,
    event: FluidInput,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FluidInput {
    Pointer(PointerEvent),
    Burst(BurstEvent),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BurstEvent {
    Burst { count: u32 },
}

#[derive(Debug, Deserialize)]
struct ScriptedResize {
    frame: u32,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct FormatReport {
    velocity: String,
    density: String,
    scalar: String,
    probe: String,
    filter: FieldFilter,
}

impl From<&FieldFormats> for FormatReport {
    fn from(f: &FieldFormats) -> Self {
        Self {
            velocity: format!("{:?}", f.velocity),
            density: format!("{:?}", f.density),
            scalar: format!("{:?}", f.scalar),
            probe: format!("{:?}", f.probe),
            filter: f.filter,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProbeResponse {
    ok: bool,
    backend: String,
    adapter: String,
    formats: FormatReport,
    programs: usize,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct FluidReport {
    ok: bool,
    backend: String,
    canvas: Resolution,
    resolution: Resolution,
    formats: FormatReport,
    frames: u64,
    reallocations: u32,
    #[serde(flatten)]
    stats: FieldStats,
    snapshot: Option<PathBuf>,
    elapsed_ms: f64,
    fps: f64,
}

#[derive(Debug, Serialize)]
struct BirdReport {
    x: f32,
    y: f32,
    velocity: f32,
}

#[derive(Debug, Serialize)]
struct ArcadeReport {
    ok: bool,
    backend: &'static str,
    frames: u32,
    score: u32,
    best_score: u32,
    status: Status,
    crash: Option<Crash>,
    game_over_frame: Option<u32>,
    restarts: u32,
    pipes_spawned: u32,
    pipes_cleared: u32,
    bird: BirdReport,
    snapshot: Option<PathBuf>,
    elapsed_ms: f64,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        let out = serde_json::json!({"ok": false, "error": format!("{err:#}")});
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{\"ok\":false}".into())
        );
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let req: Request = if input.trim().is_empty() {
        Request::Probe
    } else {
        serde_json::from_str(&input).context("invalid JSON request")?
    };

    match req {
        Request::Probe => {
            let resp = pollster::block_on(run_probe())?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Request::FluidRun {
            width,
            height,
            frames,
            frame_ms,
            config,
            events,
            resizes,
            snapshot,
        } => {
            let resp = pollster::block_on(run_fluid(
                (width.max(1), height.max(1)),
                frames,
                frame_ms.max(0.0),
                config,
                &events,
                &resizes,
                snapshot,
            ))?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Request::ArcadeRun {
            width,
            height,
            frames,
            frame_ms,
            flaps,
            autopilot,
            seed,
            config,
            snapshot,
        } => {
            let config = ArcadeConfig {
                seed: seed.unwrap_or(config.seed),
                ..config
            };
            let resp = run_arcade(
                (width.max(1), height.max(1)),
                frames,
                frame_ms.clamp(0.0, 250.0),
                config,
                &flaps,
                autopilot,
                snapshot,
            )?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
    }

    Ok(())
}

async fn run_probe() -> Result<ProbeResponse> {
    let t0 = std::time::Instant::now();
    let gpu = Gpu::new().await?;
    let formats = FieldFormats::select(|f| gpu.format_features(f))?;
    let programs = ProgramRegistry::compile(&gpu.device, &formats)
        .await
        .context("shader programs failed to build")?;

    Ok(ProbeResponse {
        ok: true,
        backend: gpu.backend_name(),
        adapter: gpu.adapter_name(),
        formats: FormatReport::from(&formats),
        programs: programs.len(),
        elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
    })
}

async fn run_fluid(
    drawable: (u32, u32),
    frames: u32,
    frame_ms: f32,
    config: FluidConfig,
    events: &[ScriptedEvent],
    resizes: &[ScriptedResize],
    snapshot: Option<PathBuf>,
) -> Result<FluidReport> {
    let t0 = std::time::Instant::now();
    let gpu = Gpu::new().await?;
    let mut sim = FluidSim::new(&gpu, config, drawable)
        .await
        .context("fluid setup failed")?;

    for frame in 0..frames {
        for r in resizes.iter().filter(|r| r.frame == frame) {
            if sim.resize(r.width.max(1), r.height.max(1)) {
                log::info!("frame {frame}: drawable resized to {}x{}", r.width, r.height);
            }
        }
        for e in events.iter().filter(|e| e.frame == frame) {
            match &e.event {
                FluidInput::Pointer(event) => sim.handle_event(event),
                FluidInput::Burst(BurstEvent::Burst { count }) => sim.push_burst(*count),
            }
        }
        sim.frame(frame_ms / 1000.0)
            .with_context(|| format!("frame {frame} failed"))?;
    }

    let stats = sim.stats()?;
    if let Some(path) = &snapshot {
        sim.save_snapshot(path)
            .with_context(|| format!("snapshot to {}", path.display()))?;
    }

    let elapsed = t0.elapsed().as_secs_f64();
    log::info!("fluid: {} frames in {:.1} ms", sim.frames(), elapsed * 1000.0);
    Ok(FluidReport {
        ok: stats.max_speed.is_finite() && stats.density_total.is_finite(),
        backend: gpu.backend_name(),
        canvas: sim.canvas_size(),
        resolution: sim.resolution(),
        formats: FormatReport::from(sim.formats()),
        frames: sim.frames(),
        reallocations: sim.reallocations(),
        stats,
        snapshot,
        elapsed_ms: elapsed * 1000.0,
        fps: (sim.frames() as f64) / elapsed.max(1e-6),
    })
}

fn run_arcade(
    size: (u32, u32),
    frames: u32,
    frame_ms: f32,
    config: ArcadeConfig,
    flaps: &[u32],
    autopilot: bool,
    snapshot: Option<PathBuf>,
) -> Result<ArcadeReport> {
    let t0 = std::time::Instant::now();
    let mut world = World::new(config, size.0 as f32, size.1 as f32);
    let dt = frame_ms / 1000.0;

    let mut best_score = 0;
    let mut game_over_frame = None;
    let mut restarts = 0;
    for frame in 0..frames {
        let scripted = flaps.contains(&frame);
        if scripted || (autopilot && arcade::autopilot::wants_flap(&world)) {
            if world.status() == Status::GameOver {
                restarts += 1;
            }
            world.input();
        }
        world.step(dt);
        best_score = best_score.max(world.score());
        if world.status() == Status::GameOver && game_over_frame.is_none() {
            game_over_frame = Some(frame);
        }
    }

    if let Some(path) = &snapshot {
        arcade::render::save_snapshot(&world, path)
            .with_context(|| format!("snapshot to {}", path.display()))?;
    }

    let bird = world.bird();
    log::info!("arcade: {frames} frames, score {}, best {best_score}", world.score());
    Ok(ArcadeReport {
        ok: true,
        backend: "cpu",
        frames,
        score: world.score(),
        best_score,
        status: world.status(),
        crash: world.crash(),
        game_over_frame,
        restarts,
        pipes_spawned: world.pipes_spawned(),
        pipes_cleared: world.pipes_cleared(),
        bird: BirdReport {
            x: bird.x,
            y: bird.y,
            velocity: bird.velocity,
        },
        snapshot,
        elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
    })
}
