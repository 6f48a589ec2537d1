use std::f32::consts::TAU;

use crate::config::Tuning;

// Pure cylinder projection: a layer's index and the current virtual scroll
// map to an angle on the inside of a rotating cylinder, and from there to
// frontness, opacity, vertical placement, stacking order and scale. No
// state lives here; the compositor calls this once per layer per frame.

// stacking-order constants: frontness dominates, index breaks ties, the
// depth-offset term keeps two layers from ever sharing an order
pub(crate) const Z_BASE: i64 = 1_000;
pub(crate) const Z_FRONTNESS: f32 = 190_000.0;
pub(crate) const Z_INDEX: i64 = 100;
pub(crate) const Z_DEPTH_OFFSET: i64 = 10;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projection {
    pub(crate) frontness: f32,
    pub(crate) visible: bool,
    pub(crate) opacity: f32,
    pub(crate) y_offset: f32,
    pub(crate) x_offset: f32,
    pub(crate) scale: f32,
    pub(crate) z_order: i64,
}

/// Cylinder rotation for a scroll value, folded into [0, τ).
pub(crate) fn rotation(virtual_scroll: f32, t: &Tuning) -> f32 {
    ((virtual_scroll * t.rotation_speed) % TAU + TAU) % TAU
}

/// Vertical position on the oval loop for an angle. Ellipticity `k`
/// compresses motion near the top and bottom of the rotation; k = 0 is a
/// plain sine.
pub(crate) fn oval_pos(angle: f32, k: f32) -> f32 {
    let s = angle.sin();
    s.signum() * s.abs().powf(1.0 / (1.0 + k)) * (1.0 - 0.3 * k)
}

pub(crate) fn project(
    index: usize,
    count: usize,
    virtual_scroll: f32,
    viewport_h: f32,
    debug_angle: f32,
    t: &Tuning,
) -> Projection {
    let base_angle = index as f32 / count as f32 * TAU;
    let angle = base_angle + rotation(virtual_scroll, t);

    let frontness = ((angle.cos() + 1.0) * 0.5).clamp(0.0, 1.0);

    // fade band below the cull threshold instead of a hard pop
    let (visible, opacity) = if frontness >= t.cull_threshold {
        (true, 1.0)
    } else if frontness <= t.cull_threshold - t.fade_band {
        (false, 0.0)
    } else {
        (true, (frontness - (t.cull_threshold - t.fade_band)) / t.fade_band)
    };

    let vertical_amplitude = (viewport_h * t.vertical_fraction).min(t.vertical_cap);
    let mut y_offset = oval_pos(angle, t.ellipticity) * vertical_amplitude;
    y_offset += viewport_h * t.global_offset_frac;
    if t.depth_parallax != 0.0 {
        y_offset += index as f32 / count as f32 * t.depth_parallax * viewport_h;
    }

    let z_order = Z_BASE
        + (frontness * Z_FRONTNESS).floor() as i64
        + index as i64 * Z_INDEX
        + (count - index) as i64 * Z_DEPTH_OFFSET;

    let scale = (1.0 + index as f32 * t.scale_step).min(t.scale_cap);
    let x_offset = debug_angle.sin() * frontness * t.debug_swing;

    Projection {
        frontness,
        visible,
        opacity,
        y_offset,
        x_offset,
        scale,
        z_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn frontness_is_continuous_across_the_wrap() {
        let t = tuning();
        // a scroll delta worth exactly one full revolution
        let full_turn = TAU / t.rotation_speed;
        for i in 0..40 {
            let scroll = i as f32 * 137.7 - 2000.0;
            let a = project(3, 10, scroll, 400.0, 0.0, &t);
            let b = project(3, 10, scroll + full_turn, 400.0, 0.0, &t);
            assert!(
                (a.frontness - b.frontness).abs() < 1e-3,
                "wrap discontinuity at scroll {scroll}"
            );
        }
    }

    #[test]
    fn frontness_stays_in_unit_range() {
        let t = tuning();
        for i in 1..=12 {
            for s in 0..50 {
                let p = project(i, 12, s as f32 * 91.3, 300.0, 0.0, &t);
                assert!((0.0..=1.0).contains(&p.frontness));
            }
        }
    }

    #[test]
    fn culling_fades_then_hides() {
        let t = tuning();
        // scan scrolls; every hidden layer must carry zero opacity and
        // every faded one must sit inside the band
        for s in 0..300 {
            let p = project(5, 10, s as f32 * 23.0, 400.0, 0.0, &t);
            if !p.visible {
                assert_eq!(p.opacity, 0.0);
                assert!(p.frontness <= t.cull_threshold - t.fade_band + 1e-6);
            } else if p.opacity < 1.0 {
                assert!(p.frontness < t.cull_threshold);
                assert!(p.frontness > t.cull_threshold - t.fade_band - 1e-6);
                assert!((0.0..=1.0).contains(&p.opacity));
            }
        }
    }

    #[test]
    fn z_order_follows_frontness() {
        let t = tuning();
        let mut checked = 0;
        for trial in 0..500usize {
            let scroll = trial as f32 * 77.7;
            let ia = 1 + trial % 10;
            let ib = 1 + (trial * 7 + 3) % 10;
            if ia == ib {
                continue;
            }
            let a = project(ia, 10, scroll, 400.0, 0.0, &t);
            let b = project(ib, 10, scroll, 400.0, 0.0, &t);
            // below this gap the frontness term no longer outweighs the
            // index terms and the tie-breaker takes over by design
            if (a.frontness - b.frontness).abs() < 6e-3 {
                continue;
            }
            if a.frontness > b.frontness {
                assert!(a.z_order > b.z_order);
            } else {
                assert!(b.z_order > a.z_order);
            }
            checked += 1;
        }
        assert!(checked > 100);
    }

    #[test]
    fn index_breaks_exact_frontness_ties() {
        // same frontness bucket: the nearer layer must land on top, and
        // the depth-offset term keeps the orders apart
        let z = |f: f32, i: i64| {
            Z_BASE
                + (f * Z_FRONTNESS).floor() as i64
                + i * Z_INDEX
                + (10 - i) * Z_DEPTH_OFFSET
        };
        assert!(z(0.5, 7) > z(0.5, 3));
        assert_ne!(z(0.5, 7), z(0.5, 3));
        assert!(z(0.5, 2) > z(0.5, 1));
    }

    #[test]
    fn z_order_spans_the_atmospheric_bounds() {
        let t = tuning();
        for i in 1..=10 {
            for s in 0..100 {
                let p = project(i, 10, s as f32 * 51.0, 400.0, 0.0, &t);
                assert!(p.z_order >= 1_000);
                assert!(p.z_order <= 200_000);
            }
        }
    }

    #[test]
    fn zero_ellipticity_is_a_plain_sine() {
        for i in 0..32 {
            let a = i as f32 * 0.37;
            assert!((oval_pos(a, 0.0) - a.sin()).abs() < 1e-5);
        }
    }

    #[test]
    fn oval_compresses_vertical_extremes() {
        // with k > 0 the curve sits closer to its flattened cap between
        // the extremes, so motion slows near the top/bottom
        let k = 0.6;
        let cap = 1.0 - 0.3 * k;
        for i in 0..64 {
            let a = i as f32 * 0.1;
            let v = oval_pos(a, k);
            assert!(v.abs() <= cap + 1e-6);
            assert_eq!(v.is_sign_negative(), a.sin().is_sign_negative());
        }
        // near the extreme the oval is flatter than the sine is steep
        let a0 = std::f32::consts::FRAC_PI_2;
        let a1 = a0 + 0.3;
        let sine_drop = (a1.sin() - a0.sin()).abs();
        let oval_drop = (oval_pos(a1, k) - oval_pos(a0, k)).abs();
        assert!(oval_drop < sine_drop);
    }

    #[test]
    fn scale_grows_with_index_and_caps() {
        let t = tuning();
        let mut prev = 0.0;
        for i in 1..=20 {
            let p = project(i, 20, 0.0, 400.0, 0.0, &t);
            assert!(p.scale >= prev);
            assert!(p.scale <= t.scale_cap);
            prev = p.scale;
        }
    }
}
