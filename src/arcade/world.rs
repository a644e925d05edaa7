use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use super::config::ArcadeConfig;
use super::entities::{Bird, Pipe};
use super::spawner::Spawner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crash {
    Pipe,
    Ground,
    Ceiling,
}

/// The whole game: one bird, the live pipes and the clocks that drive them.
#[derive(Debug, Clone)]
pub struct World {
    config: ArcadeConfig,
    width: f32,
    height: f32,
    scale: f32,
    bird: Bird,
    pipes: Vec<Pipe>,
    spawner: Spawner,
    rng: StdRng,
    status: Status,
    crash: Option<Crash>,
    score: u32,
    pipes_cleared: u32,
    clock_ms: f64,
    ground_offset: f32,
    background_offset: f32,
}

impl World {
    pub fn new(config: ArcadeConfig, width: f32, height: f32) -> Self {
        let config = config.sanitized();
        let width = width.max(1.0);
        let height = height.max(1.0);
        let scale = width / config.reference_width;
        Self {
            bird: spawn_bird(&config, scale, height),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            width,
            height,
            scale,
            pipes: Vec::new(),
            spawner: Spawner::new(),
            status: Status::Playing,
            crash: None,
            score: 0,
            pipes_cleared: 0,
            clock_ms: 0.0,
            ground_offset: 0.0,
            background_offset: 0.0,
        }
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn crash(&self) -> Option<Crash> {
        self.crash
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn pipes_spawned(&self) -> u32 {
        self.spawner.spawned()
    }

    pub fn pipes_cleared(&self) -> u32 {
        self.pipes_cleared
    }

    pub fn ground_offset(&self) -> f32 {
        self.ground_offset
    }

    pub fn background_offset(&self) -> f32 {
        self.background_offset
    }

    /// Top edge of the ground band.
    pub fn ground_y(&self) -> f32 {
        self.height * (1.0 - self.config.ground_ratio)
    }

    /// The first pipe the bird has not yet passed.
    pub fn next_pipe(&self) -> Option<&Pipe> {
        self.pipes.iter().find(|pipe| pipe.right() >= self.bird.x)
    }

    pub fn push_pipe(&mut self, pipe: Pipe) {
        self.pipes.push(pipe);
    }

    pub fn bird_mut(&mut self) -> &mut Bird {
        &mut self.bird
    }

    /// Flaps while playing; restarts the run after game over.
    pub fn input(&mut self) {
        match self.status {
            Status::Playing => {
                let c = &self.config;
                self.bird.flap(
                    c.lift,
                    self.clock_ms,
                    c.fast_flap_ms,
                    c.slow_flap_ms,
                    c.flap_nudge * self.scale,
                );
            }
            Status::GameOver => self.restart(),
        }
    }

    /// Resets the run. The RNG keeps its state so the next layout differs.
    pub fn restart(&mut self) {
        self.bird = spawn_bird(&self.config, self.scale, self.height);
        self.pipes.clear();
        self.spawner = Spawner::new();
        self.status = Status::Playing;
        self.crash = None;
        self.score = 0;
        self.pipes_cleared = 0;
        self.clock_ms = 0.0;
        self.ground_offset = 0.0;
        self.background_offset = 0.0;
    }

    /// Advances the game by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let k = dt * 60.0;
        match self.status {
            Status::Playing => self.step_playing(dt, k),
            Status::GameOver => self.step_falling(k),
        }
    }

    fn step_playing(&mut self, dt: f32, k: f32) {
        self.clock_ms += f64::from(dt) * 1000.0;
        let c = self.config;

        self.bird.update(k, c.gravity, c.damping, self.height);

        self.ground_offset = (self.ground_offset + c.ground_speed * self.scale * k) % (c.ground_tile * self.scale);
        self.background_offset = (self.background_offset + self.width * 0.00125 * k) % self.width;

        let ground_y = self.ground_y();
        if let Some(pipe) = self.spawner.tick(dt, self.score, &c, self.width, ground_y, &mut self.rng) {
            self.pipes.push(pipe);
        }

        for pipe in &mut self.pipes {
            pipe.update(k);
        }
        let mut hit = false;
        for pipe in &mut self.pipes {
            if pipe.collides(&self.bird, ground_y) {
                hit = true;
                break;
            }
            if !pipe.scored && pipe.passed_by(&self.bird) {
                pipe.scored = true;
                self.score += 1;
            }
        }
        if hit {
            self.end(Crash::Pipe);
            return;
        }

        let before = self.pipes.len();
        self.pipes.retain(|pipe| !pipe.is_off_screen());
        self.pipes_cleared += (before - self.pipes.len()) as u32;

        if self.bird.bounds().bottom() >= ground_y {
            self.end(Crash::Ground);
        } else if c.ceiling_kills && self.bird.y <= 0.0 {
            self.end(Crash::Ceiling);
        }
    }

    fn step_falling(&mut self, k: f32) {
        let rest = self.ground_y() - self.bird.height;
        if self.bird.y >= rest {
            self.bird.y = rest;
            self.bird.velocity = 0.0;
            return;
        }
        self.bird.velocity = self.config.fall_gravity;
        self.bird.y = (self.bird.y + self.bird.velocity * k).min(rest);
    }

    fn end(&mut self, crash: Crash) {
        self.status = Status::GameOver;
        self.crash = Some(crash);
        self.bird.velocity = 0.0;
        info!("arcade: game over ({crash:?}) with score {}", self.score);
    }
}

fn spawn_bird(config: &ArcadeConfig, scale: f32, height: f32) -> Bird {
    let bird_height = config.bird_height * scale;
    Bird::new(
        config.bird_x * scale,
        (height - bird_height) * 0.5,
        config.bird_width * scale,
        bird_height,
    )
}
