use serde::{Deserialize, Serialize};

/// Game tuning. Lengths are in pixels of a 400px-wide reference view and are
/// scaled by `view_width / reference_width`; velocities and accelerations
/// are per 1/60 s frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub reference_width: f32,
    pub bird_x: f32,
    pub bird_width: f32,
    pub bird_height: f32,
    pub gravity: f32,
    pub lift: f32,
    pub damping: f32,
    /// Constant drop speed once the run has ended.
    pub fall_gravity: f32,
    pub pipe_width: f32,
    pub pipe_speed: f32,
    pub base_gap: f32,
    pub min_gap: f32,
    pub gap_step: f32,
    pub min_top: f32,
    pub max_top: f32,
    /// Seconds between pipes at score 0.
    pub base_interval: f32,
    pub min_interval: f32,
    pub interval_step: f32,
    pub placement_candidates: usize,
    /// Fraction of the view height covered by the ground band.
    pub ground_ratio: f32,
    pub ground_speed: f32,
    pub ground_tile: f32,
    pub fast_flap_ms: f64,
    pub slow_flap_ms: f64,
    pub flap_nudge: f32,
    pub ceiling_kills: bool,
    pub seed: u64,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            reference_width: 400.0,
            bird_x: 50.0,
            bird_width: 40.0,
            bird_height: 30.0,
            gravity: 0.6,
            lift: -15.0,
            damping: 0.9,
            fall_gravity: 4.0,
            pipe_width: 52.0,
            pipe_speed: 2.0,
            base_gap: 150.0,
            min_gap: 100.0,
            gap_step: 2.5,
            min_top: 100.0,
            max_top: 350.0,
            base_interval: 2.0,
            min_interval: 1.1,
            interval_step: 0.05,
            placement_candidates: 3,
            ground_ratio: 0.15,
            ground_speed: 2.0,
            ground_tile: 330.0,
            fast_flap_ms: 400.0,
            slow_flap_ms: 800.0,
            flap_nudge: 5.0,
            ceiling_kills: true,
            seed: 1,
        }
    }
}

impl ArcadeConfig {
    pub fn sanitized(self) -> Self {
        // Gap and bird are both reference lengths scaled by the same factor.
        let min_gap = self.min_gap.max(self.bird_height * 1.5);
        let min_interval = self.min_interval.max(0.25);
        Self {
            reference_width: self.reference_width.max(1.0),
            damping: self.damping.clamp(0.0, 1.0),
            min_gap,
            base_gap: self.base_gap.max(min_gap),
            min_top: self.min_top.max(0.0),
            max_top: self.max_top.max(self.min_top.max(0.0)),
            min_interval,
            base_interval: self.base_interval.max(min_interval),
            placement_candidates: self.placement_candidates.clamp(1, 16),
            ground_ratio: self.ground_ratio.clamp(0.0, 0.5),
            ground_tile: self.ground_tile.max(1.0),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ArcadeConfig = serde_json::from_str(r#"{"pipe_speed": 3.5, "seed": 99}"#).unwrap();
        assert_eq!(cfg.pipe_speed, 3.5);
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.gravity, 0.6);
        assert_eq!(cfg.base_gap, 150.0);
    }

    #[test]
    fn sanitize_keeps_ranges_ordered() {
        let cfg = ArcadeConfig {
            min_gap: 10.0,
            base_gap: 5.0,
            min_top: 300.0,
            max_top: 100.0,
            min_interval: 0.0,
            base_interval: 0.1,
            placement_candidates: 0,
            ground_ratio: 2.0,
            ..ArcadeConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.min_gap, 45.0);
        assert_eq!(cfg.base_gap, 45.0);
        assert_eq!(cfg.max_top, 300.0);
        assert_eq!(cfg.min_interval, 0.25);
        assert_eq!(cfg.base_interval, 0.25);
        assert_eq!(cfg.placement_candidates, 1);
        assert_eq!(cfg.ground_ratio, 0.5);
    }
}
