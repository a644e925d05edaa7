use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use super::config::ArcadeConfig;
use super::entities::Pipe;

/// Vertical room kept free above the ground band under the lowest gap.
const GROUND_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct Spawner {
    accumulator: f32,
    previous_center: Option<f32>,
    spawned: u32,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn previous_center(&self) -> Option<f32> {
        self.previous_center
    }

    /// Seconds between pipes at `score`.
    pub fn interval(config: &ArcadeConfig, score: u32) -> f32 {
        (config.base_interval - score as f32 * config.interval_step).max(config.min_interval)
    }

    /// Gap height in reference pixels at `score`.
    pub fn gap(config: &ArcadeConfig, score: u32) -> f32 {
        (config.base_gap - score as f32 * config.gap_step).max(config.min_gap)
    }

    /// Advances the clock by `dt` seconds and returns a pipe at `view_width`
    /// when the interval has elapsed.
    pub fn tick(
        &mut self,
        dt: f32,
        score: u32,
        config: &ArcadeConfig,
        view_width: f32,
        ground_y: f32,
        rng: &mut impl Rng,
    ) -> Option<Pipe> {
        self.accumulator += dt;
        let interval = Self::interval(config, score);
        if self.accumulator < interval {
            return None;
        }
        self.accumulator -= interval;

        let scale = view_width / config.reference_width;
        let gap = Self::gap(config, score) * scale;
        let top = self.place(config, scale, gap, ground_y, rng);
        self.spawned += 1;
        Some(Pipe::new(
            view_width,
            config.pipe_width * scale,
            top,
            gap,
            config.pipe_speed * scale,
        ))
    }

    /// Picks the top segment height. Candidates are drawn uniformly and one is
    /// chosen with weights growing with its distance from the previous gap
    /// center, so consecutive gaps tend to differ.
    pub fn place(
        &mut self,
        config: &ArcadeConfig,
        scale: f32,
        gap: f32,
        ground_y: f32,
        rng: &mut impl Rng,
    ) -> f32 {
        let (lo, hi) = top_range(config, scale, gap, ground_y);
        let candidates: Vec<f32> = (0..config.placement_candidates.max(1))
            .map(|_| if hi > lo { rng.gen_range(lo..=hi) } else { lo })
            .collect();

        let top = match self.previous_center {
            Some(previous) => {
                let span = hi - lo + 1.0;
                let weights: Vec<f32> = candidates
                    .iter()
                    .map(|top| 0.2 + (top + gap * 0.5 - previous).abs() / span)
                    .collect();
                match WeightedIndex::new(&weights) {
                    Ok(dist) => candidates[dist.sample(rng)],
                    Err(_) => candidates[0],
                }
            }
            None => candidates[0],
        };

        self.previous_center = Some(top + gap * 0.5);
        top
    }
}

/// Range of valid top heights: between the configured limits and never so low
/// that the bottom segment vanishes into the ground.
pub fn top_range(config: &ArcadeConfig, scale: f32, gap: f32, ground_y: f32) -> (f32, f32) {
    let lo = config.min_top * scale;
    let hi = (config.max_top * scale).min(ground_y - gap - GROUND_MARGIN * scale);
    (lo, hi.max(lo))
}
