use crate::noise::NoiseField;

// Hue/saturation/brightness with alpha kept on a 0..360 scale. That alpha
// range is load-bearing: every stop in the palettes stores alpha-scale and
// it only becomes a 0..1 alpha at the RGB conversion boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hsb {
    pub(crate) h: f32, // 0..360
    pub(crate) s: f32, // 0..100
    pub(crate) b: f32, // 0..100
    pub(crate) a: f32, // 0..360, alpha * 360
}

impl Hsb {
    pub(crate) const fn new(h: f32, s: f32, b: f32, a: f32) -> Self {
        Self { h, s, b, a }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let f = |a: u8, b: u8| -> u8 {
            ((a as f32) + (b as f32 - a as f32) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
        }
    }

    pub(crate) fn scale(self, k: f32) -> Rgb {
        let k = k.max(0.0);
        let f = |a: u8| -> u8 { ((a as f32) * k).round().clamp(0.0, 255.0) as u8 };
        Rgb {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Rgba {
    pub(crate) rgb: Rgb,
    pub(crate) a: f32, // 0..1
}

/// HSB to RGB; alpha comes out as `hsb.a / 360`.
pub(crate) fn hsb_to_rgba(c: Hsb) -> Rgba {
    let h = (c.h.rem_euclid(360.0)) / 60.0;
    let s = (c.s / 100.0).clamp(0.0, 1.0);
    let v = (c.b / 100.0).clamp(0.0, 1.0);

    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Rgba {
        rgb: Rgb {
            r: (r.clamp(0.0, 1.0) * 255.0).round() as u8,
            g: (g.clamp(0.0, 1.0) * 255.0).round() as u8,
            b: (b.clamp(0.0, 1.0) * 255.0).round() as u8,
        },
        a: (c.a / 360.0).clamp(0.0, 1.0),
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Per-channel interpolation, alpha included.
pub(crate) fn lerp_hsb(c1: Hsb, c2: Hsb, t: f32) -> Hsb {
    Hsb {
        h: lerp(c1.h, c2.h, t),
        s: lerp(c1.s, c2.s, t),
        b: lerp(c1.b, c2.b, t),
        a: lerp(c1.a, c2.a, t),
    }
}

/// Piecewise-linear palette lookup. Index 0 is the furthest stop, the last
/// entry the closest. Callers guarantee at least two stops.
pub(crate) fn color_for_depth(depth: f32, palette: &[Hsb]) -> Hsb {
    let last = palette.len() - 1;
    if depth <= 0.0 {
        return palette[0];
    }
    if depth >= 1.0 {
        return palette[last];
    }
    let pos = depth * last as f32;
    let i = (pos.floor() as usize).min(last - 1);
    lerp_hsb(palette[i], palette[i + 1], pos - i as f32)
}

// signed shortest way from `from` to `to` on the hue circle, in [-180, 180)
fn hue_toward(from: f32, to: f32) -> f32 {
    (to - from + 540.0).rem_euclid(360.0) - 180.0
}

const NEIGHBOR_RADIUS: i32 = 3;
const NEIGHBOR_INFLUENCE: f32 = 0.3;

const ATMOS_Z_MIN: f32 = 1_000.0;
const ATMOS_Z_MAX: f32 = 200_000.0;
const ATMOS_THRESHOLD: f32 = 0.3;
const ATMOS_DESAT: f32 = 0.6;
const ATMOS_BLUE_HUE: f32 = 240.0;
const ATMOS_BLUE_SHIFT: f32 = 0.3;
const ATMOS_BRIGHTEN: f32 = 0.1;

/// Fill color for one layer: depth stop from the palette, a decaying blend
/// of up to three neighbor stops per side, seeded per-channel jitter, and
/// the z-order driven atmospheric correction.
pub(crate) fn layer_color(
    index: usize,
    count: usize,
    palette: &[Hsb],
    jitter: &NoiseField,
    z_order: i64,
) -> Hsb {
    let depth_of = |i: usize| i as f32 / count as f32;
    let base = color_for_depth(depth_of(index), palette);

    // neighbor pull, linear falloff over NEIGHBOR_RADIUS
    let mut h = base.h;
    let mut s = base.s;
    let mut b = base.b;
    let mut a = base.a;
    let mut total = 1.0;
    for off in -NEIGHBOR_RADIUS..=NEIGHBOR_RADIUS {
        if off == 0 {
            continue;
        }
        let n = index as i32 + off;
        if n < 1 || n > count as i32 {
            continue;
        }
        let w = (1.0 - off.abs() as f32 / NEIGHBOR_RADIUS as f32).max(0.0) * NEIGHBOR_INFLUENCE;
        if w <= 0.0 {
            continue;
        }
        let c = color_for_depth(depth_of(n as usize), palette);
        h += c.h * w;
        s += c.s * w;
        b += c.b * w;
        a += c.a * w;
        total += w;
    }
    h /= total;
    s /= total;
    b /= total;
    a /= total;

    // per-layer jitter, one noise sample per channel
    let jx = index as f32 * 7.31;
    h += (jitter.sample(jx, 11.7) * 2.0 - 1.0) * 30.0;
    s += (jitter.sample(jx, 53.1) * 2.0 - 1.0) * 20.0;
    b += (jitter.sample(jx, 97.9) * 2.0 - 1.0) * 15.0;

    // atmospheric perspective: far (low z) layers wash out toward blue
    let z_norm = ((z_order as f32 - ATMOS_Z_MIN) / (ATMOS_Z_MAX - ATMOS_Z_MIN)).clamp(0.0, 1.0);
    let atmos = 1.0 - z_norm;
    if atmos > ATMOS_THRESHOLD {
        let f = (atmos - ATMOS_THRESHOLD) / (1.0 - ATMOS_THRESHOLD);
        s *= 1.0 - ATMOS_DESAT * f;
        h += hue_toward(h, ATMOS_BLUE_HUE) * ATMOS_BLUE_SHIFT * f;
        b *= 1.0 + ATMOS_BRIGHTEN * f;
    }

    Hsb {
        h: h.rem_euclid(360.0),
        s: s.clamp(0.0, 100.0),
        b: b.clamp(0.0, 100.0),
        a: a.clamp(0.0, 360.0),
    }
}

// Palettes: mountain stops run furthest -> closest. Each carries the sky
// gradient pair and the mist veil color that go with it.
pub(crate) struct Palette {
    pub(crate) name: &'static str,
    pub(crate) stops: &'static [Hsb],
    pub(crate) sky_top: Hsb,
    pub(crate) sky_bottom: Hsb,
    pub(crate) mist: Hsb,
}

pub(crate) static PALETTES: [Palette; 3] = [
    Palette {
        name: "dusk",
        stops: &[
            Hsb::new(228.0, 18.0, 84.0, 360.0),
            Hsb::new(240.0, 26.0, 62.0, 360.0),
            Hsb::new(252.0, 34.0, 44.0, 360.0),
            Hsb::new(262.0, 42.0, 28.0, 360.0),
            Hsb::new(268.0, 46.0, 14.0, 360.0),
        ],
        sky_top: Hsb::new(232.0, 38.0, 30.0, 360.0),
        sky_bottom: Hsb::new(18.0, 52.0, 72.0, 360.0),
        mist: Hsb::new(230.0, 14.0, 82.0, 130.0),
    },
    Palette {
        name: "dawn",
        stops: &[
            Hsb::new(32.0, 14.0, 92.0, 360.0),
            Hsb::new(20.0, 28.0, 74.0, 360.0),
            Hsb::new(8.0, 38.0, 54.0, 360.0),
            Hsb::new(352.0, 40.0, 36.0, 360.0),
            Hsb::new(340.0, 42.0, 20.0, 360.0),
        ],
        sky_top: Hsb::new(210.0, 26.0, 66.0, 360.0),
        sky_bottom: Hsb::new(38.0, 56.0, 90.0, 360.0),
        mist: Hsb::new(36.0, 12.0, 94.0, 150.0),
    },
    Palette {
        name: "night",
        stops: &[
            Hsb::new(214.0, 30.0, 46.0, 360.0),
            Hsb::new(220.0, 36.0, 32.0, 360.0),
            Hsb::new(226.0, 42.0, 21.0, 360.0),
            Hsb::new(232.0, 46.0, 12.0, 360.0),
            Hsb::new(236.0, 48.0, 6.0, 360.0),
        ],
        sky_top: Hsb::new(230.0, 52.0, 12.0, 360.0),
        sky_bottom: Hsb::new(218.0, 44.0, 34.0, 360.0),
        mist: Hsb::new(222.0, 20.0, 50.0, 110.0),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const P: [Hsb; 3] = [
        Hsb::new(0.0, 0.0, 0.0, 0.0),
        Hsb::new(120.0, 50.0, 50.0, 180.0),
        Hsb::new(240.0, 100.0, 100.0, 360.0),
    ];

    #[test]
    fn depth_zero_and_one_hit_the_ends() {
        assert_eq!(color_for_depth(0.0, &P), P[0]);
        assert_eq!(color_for_depth(1.0, &P), P[2]);
        assert_eq!(color_for_depth(-0.5, &P), P[0]);
        assert_eq!(color_for_depth(3.0, &P), P[2]);
    }

    #[test]
    fn depth_on_a_stop_boundary_is_exact() {
        // 0.5 * (3-1) = 1.0 lands exactly on the middle stop
        let c = color_for_depth(0.5, &P);
        assert!((c.h - P[1].h).abs() < 1e-4);
        assert!((c.s - P[1].s).abs() < 1e-4);
        assert!((c.b - P[1].b).abs() < 1e-4);
        assert!((c.a - P[1].a).abs() < 1e-4);
    }

    #[test]
    fn midpoint_interpolates_per_channel() {
        let c = color_for_depth(0.25, &P);
        assert!((c.h - 60.0).abs() < 1e-4);
        assert!((c.s - 25.0).abs() < 1e-4);
        assert!((c.a - 90.0).abs() < 1e-4);
    }

    #[test]
    fn alpha_scale_is_pre_divided_by_360() {
        let full = hsb_to_rgba(Hsb::new(0.0, 0.0, 100.0, 360.0));
        assert!((full.a - 1.0).abs() < 1e-6);
        let half = hsb_to_rgba(Hsb::new(0.0, 0.0, 100.0, 180.0));
        assert!((half.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hsb_primaries_convert() {
        let red = hsb_to_rgba(Hsb::new(0.0, 100.0, 100.0, 360.0));
        assert_eq!(red.rgb, Rgb { r: 255, g: 0, b: 0 });
        let green = hsb_to_rgba(Hsb::new(120.0, 100.0, 100.0, 360.0));
        assert_eq!(green.rgb, Rgb { r: 0, g: 255, b: 0 });
        let grey = hsb_to_rgba(Hsb::new(200.0, 0.0, 50.0, 360.0));
        assert_eq!(grey.rgb.r, grey.rgb.g);
        assert_eq!(grey.rgb.g, grey.rgb.b);
    }

    #[test]
    fn lerp_hsb_endpoints() {
        let a = Hsb::new(10.0, 20.0, 30.0, 40.0);
        let b = Hsb::new(50.0, 60.0, 70.0, 80.0);
        assert_eq!(lerp_hsb(a, b, 0.0), a);
        assert_eq!(lerp_hsb(a, b, 1.0), b);
        let m = lerp_hsb(a, b, 0.5);
        assert!((m.h - 30.0).abs() < 1e-5);
        assert!((m.a - 60.0).abs() < 1e-5);
    }

    #[test]
    fn near_layers_skip_atmospheric_correction() {
        let noise = NoiseField::new(9);
        // z high enough that atmosphericEffect stays below the threshold
        let near = layer_color(10, 10, PALETTES[0].stops, &noise, 180_000);
        // identical call but far away: heavy effect
        let far = layer_color(10, 10, PALETTES[0].stops, &noise, 2_000);
        assert!(far.s < near.s, "distance should desaturate");
        assert!(far.b >= near.b, "distance should not darken");
    }

    #[test]
    fn atmospheric_hue_moves_toward_blue() {
        let noise = NoiseField::new(3);
        let near = layer_color(2, 10, PALETTES[1].stops, &noise, 180_000);
        let far = layer_color(2, 10, PALETTES[1].stops, &noise, 2_000);
        let d_near = hue_toward(near.h, ATMOS_BLUE_HUE).abs();
        let d_far = hue_toward(far.h, ATMOS_BLUE_HUE).abs();
        assert!(d_far < d_near);
    }

    #[test]
    fn layer_color_stays_in_gamut() {
        let noise = NoiseField::new(77);
        for index in 1..=16 {
            for &z in &[1_000i64, 40_000, 120_000, 200_000] {
                let c = layer_color(index, 16, PALETTES[2].stops, &noise, z);
                assert!((0.0..360.0).contains(&c.h));
                assert!((0.0..=100.0).contains(&c.s));
                assert!((0.0..=100.0).contains(&c.b));
                assert!((0.0..=360.0).contains(&c.a));
            }
        }
    }

    #[test]
    fn jitter_is_stable_per_seed() {
        let n1 = NoiseField::new(42);
        let n2 = NoiseField::new(42);
        let a = layer_color(4, 10, PALETTES[0].stops, &n1, 50_000);
        let b = layer_color(4, 10, PALETTES[0].stops, &n2, 50_000);
        assert_eq!(a, b);
    }
}
