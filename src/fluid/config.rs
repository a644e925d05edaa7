use serde::{Deserialize, Serialize};

/// Tuning constants for the splat effect. Missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    /// Simulation targets are the drawable size shifted right by this many bits.
    pub texture_downsample: u32,
    pub density_dissipation: f32,
    pub velocity_dissipation: f32,
    pub pressure_dissipation: f32,
    pub pressure_iterations: u32,
    pub curl: f32,
    pub splat_radius: f32,
    pub max_dt: f32,
    pub pointer_delta_scale: f32,
    pub density_splat_scale: f32,
    pub initial_splats_min: u32,
    pub initial_splats_max: u32,
    pub seed: u64,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            texture_downsample: 1,
            density_dissipation: 0.98,
            velocity_dissipation: 0.99,
            pressure_dissipation: 0.8,
            pressure_iterations: 20,
            curl: 28.0,
            splat_radius: 0.004,
            max_dt: 0.016,
            pointer_delta_scale: 10.0,
            density_splat_scale: 0.02,
            initial_splats_min: 5,
            initial_splats_max: 25,
            seed: 0x5eed,
        }
    }
}

impl FluidConfig {
    pub fn sanitized(self) -> Self {
        let initial_splats_min = self.initial_splats_min.min(256);
        Self {
            texture_downsample: self.texture_downsample.min(4),
            density_dissipation: self.density_dissipation.clamp(0.0, 1.0),
            velocity_dissipation: self.velocity_dissipation.clamp(0.0, 1.0),
            pressure_dissipation: self.pressure_dissipation.clamp(0.0, 1.0),
            pressure_iterations: self.pressure_iterations.clamp(1, 200),
            curl: self.curl.max(0.0),
            splat_radius: self.splat_radius.max(1e-5),
            max_dt: self.max_dt.clamp(1e-4, 0.1),
            pointer_delta_scale: self.pointer_delta_scale,
            density_splat_scale: self.density_splat_scale.max(0.0),
            initial_splats_min,
            initial_splats_max: self.initial_splats_max.clamp(initial_splats_min, 256),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: FluidConfig = serde_json::from_str(r#"{"curl": 40.0, "pressure_iterations": 8}"#).unwrap();
        assert_eq!(cfg.curl, 40.0);
        assert_eq!(cfg.pressure_iterations, 8);
        assert_eq!(cfg.texture_downsample, 1);
        assert_eq!(cfg.density_dissipation, 0.98);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let cfg = FluidConfig {
            texture_downsample: 9,
            pressure_iterations: 0,
            velocity_dissipation: 1.5,
            initial_splats_min: 10,
            initial_splats_max: 3,
            ..FluidConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.texture_downsample, 4);
        assert_eq!(cfg.pressure_iterations, 1);
        assert_eq!(cfg.velocity_dissipation, 1.0);
        assert_eq!(cfg.initial_splats_max, 10);
    }
}
