use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "ridgeline")]
#[command(about = "Scroll-driven parallax mountain landscape for the terminal")]
pub(crate) struct Cli {
    /// Scene seed (noise texture, color jitter)
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u32,

    /// Number of mountain layers on the cylinder
    #[arg(long, default_value_t = 10)]
    pub(crate) layers: usize,

    /// Frame cap
    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    /// Palette: dusk, dawn or night
    #[arg(long, default_value = "dusk")]
    pub(crate) palette: String,

    /// Cylinder ellipticity; 0 gives plain-sine vertical motion
    #[arg(long, default_value_t = 0.35)]
    pub(crate) ellipticity: f32,

    /// Ridge amplitude multiplier
    #[arg(long, default_value_t = 1.0)]
    pub(crate) amplitude: f32,

    /// Drift forward without input
    #[arg(long, default_value_t = false)]
    pub(crate) auto_scroll: bool,

    /// Draw silhouette phases from the seed instead of fresh randomness,
    /// so shapes reproduce across runs
    #[arg(long, default_value_t = false)]
    pub(crate) seeded_shapes: bool,

    /// Cap on layers drawn in one frame
    #[arg(long, default_value_t = 12)]
    pub(crate) max_visible: usize,

    /// Keep a layer's silhouette when it swings back into view instead of
    /// regenerating it
    #[arg(long, default_value_t = false)]
    pub(crate) no_recycle: bool,
}

// The constant surface. Everything the animation feel depends on lives
// here; the few knobs worth exposing are mirrored from the CLI in
// Tuning::from_cli.
#[derive(Clone, Debug)]
pub(crate) struct Tuning {
    // input -> velocity
    pub(crate) scroll_sensitivity: f32,
    pub(crate) drag_sensitivity: f32,
    pub(crate) key_impulse: f32,
    pub(crate) wheel_step: f32,
    pub(crate) input_slowdown: f32,

    // per-frame integration
    pub(crate) easing: f32,
    pub(crate) momentum_decay: f32,
    pub(crate) min_velocity: f32,
    pub(crate) max_velocity: f32,
    pub(crate) auto_scroll_rate: f32,

    // cylinder projection
    pub(crate) rotation_speed: f32,
    pub(crate) ellipticity: f32,
    pub(crate) vertical_fraction: f32,
    pub(crate) vertical_cap: f32,
    pub(crate) global_offset_frac: f32,
    pub(crate) depth_parallax: f32,
    pub(crate) cull_threshold: f32,
    pub(crate) fade_band: f32,
    pub(crate) scale_step: f32,
    pub(crate) scale_cap: f32,
    pub(crate) debug_swing: f32,

    // terrain
    pub(crate) amplitude_scale: f32,
    pub(crate) amplitude_divisor: f32,
    pub(crate) horizon_frac: f32,
    pub(crate) horizon_spread: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            scroll_sensitivity: 0.25,
            drag_sensitivity: 1.8,
            key_impulse: 6.0,
            wheel_step: 100.0,
            input_slowdown: 0.6,

            easing: 0.08,
            momentum_decay: 0.94,
            min_velocity: 0.02,
            max_velocity: 30.0,
            auto_scroll_rate: 0.4,

            rotation_speed: 0.001,
            ellipticity: 0.35,
            vertical_fraction: 0.42,
            vertical_cap: 260.0,
            global_offset_frac: 0.08,
            depth_parallax: 0.0,
            cull_threshold: 0.1,
            fade_band: 0.05,
            scale_step: 0.02,
            scale_cap: 1.3,
            debug_swing: 24.0,

            amplitude_scale: 1.0,
            amplitude_divisor: 90.0,
            horizon_frac: 0.46,
            horizon_spread: 0.17,
        }
    }
}

impl Tuning {
    pub(crate) fn from_cli(cli: &Cli) -> Self {
        Self {
            ellipticity: cli.ellipticity.clamp(0.0, 2.0),
            amplitude_scale: cli.amplitude.max(0.0),
            ..Self::default()
        }
    }

    /// Ridge amplitude for a viewport height, before the CLI multiplier.
    pub(crate) fn layer_amplitude(&self, viewport_h: f32) -> f32 {
        viewport_h / self.amplitude_divisor * self.amplitude_scale
    }

    /// Baseline y for a layer: far layers sit near the horizon, near ones
    /// lower on screen.
    pub(crate) fn reference_y(&self, depth: f32, viewport_h: f32) -> f32 {
        viewport_h * (self.horizon_frac + self.horizon_spread * depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_knobs_land_in_tuning() {
        let cli = Cli {
            seed: 1,
            layers: 10,
            fps: 60,
            palette: "dusk".into(),
            ellipticity: 0.8,
            amplitude: 2.5,
            auto_scroll: false,
            seeded_shapes: false,
            max_visible: 12,
            no_recycle: false,
        };
        let t = Tuning::from_cli(&cli);
        assert_eq!(t.ellipticity, 0.8);
        assert_eq!(t.amplitude_scale, 2.5);
        // everything else keeps the defaults
        assert_eq!(t.easing, Tuning::default().easing);
    }

    #[test]
    fn reference_y_orders_layers_by_depth() {
        let t = Tuning::default();
        let far = t.reference_y(0.1, 400.0);
        let near = t.reference_y(1.0, 400.0);
        assert!(far < near);
        assert!(far > 0.0 && near < 400.0);
    }
}
