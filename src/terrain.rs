use std::f32::consts::TAU;

use rand::Rng;

use crate::noise::NoiseField;

// Ridge profiles: one y per column, built from two phase-shifted sinusoids
// plus a long and a short gradient-noise octave. The random scalars are
// drawn once per layer and kept, so the profile itself is a pure function
// of (noise field, params, width, amplitude, reference y).

const SECOND_AMP_RANGE: std::ops::Range<f32> = 2.0..4.0;
const NOISE_AMP_RANGE: std::ops::Range<f32> = 40.0..50.0;
const NOISE_PHASE_RANGE: std::ops::Range<f32> = 0.0..1000.0;

// long octave: 2 cycles across the width; short octave: 10 cycles, fixed weight
const LONG_NOISE_CYCLES: f32 = 2.0;
const SHORT_NOISE_CYCLES: f32 = 10.0;
const SHORT_NOISE_WEIGHT: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RidgeParams {
    pub(crate) phase1: f32,
    pub(crate) phase2: f32,
    pub(crate) second_amp: f32,
    pub(crate) noise_amp: f32,
    pub(crate) noise_phase: f32,
}

impl RidgeParams {
    /// Draw the per-layer shape scalars. The caller picks the rng: thread
    /// rng for fresh shapes every run, a seeded StdRng for reproducible
    /// ones (--seeded-shapes).
    pub(crate) fn draw(rng: &mut impl Rng, width: f32) -> Self {
        let half = (width * 0.5).max(1.0);
        Self {
            phase1: rng.gen_range(-half..half),
            phase2: rng.gen_range(-half..half),
            second_amp: rng.gen_range(SECOND_AMP_RANGE),
            noise_amp: rng.gen_range(NOISE_AMP_RANGE),
            noise_phase: rng.gen_range(NOISE_PHASE_RANGE),
        }
    }
}

/// Height profile for one layer: `width` columns around `reference_y`.
/// Identical inputs give a bit-identical profile.
pub(crate) fn generate_profile(
    noise: &NoiseField,
    p: &RidgeParams,
    width: usize,
    amplitude: f32,
    reference_y: f32,
) -> Vec<f32> {
    let w = width.max(1) as f32;
    let mut ys = Vec::with_capacity(width);
    for x in 0..width {
        let xf = x as f32;
        let dx = xf / w;

        let slow = ((xf + p.phase1) / w * TAU * 2.0).sin() * amplitude;
        let quick = ((xf + p.phase2) / w * TAU * 5.0).sin() * amplitude * p.second_amp;

        let long = (noise.sample(dx * LONG_NOISE_CYCLES + p.noise_phase, 0.0) - 0.5)
            * amplitude
            * p.noise_amp;
        let short =
            (noise.sample(dx * SHORT_NOISE_CYCLES, 37.0) - 0.5) * 2.0 * SHORT_NOISE_WEIGHT;

        ys.push(reference_y + slow + quick + long + short);
    }
    ys
}
