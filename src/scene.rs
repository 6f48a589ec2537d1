use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::color::{hsb_to_rgba, layer_color, Hsb, Palette, Rgb, PALETTES};
use crate::config::Tuning;
use crate::noise::NoiseField;
use crate::projector::{self, Projection};
use crate::render::PixelCanvas;
use crate::terrain::{generate_profile, RidgeParams};

// One mountain layer. The silhouette is generated once and kept; the
// stamp records the inputs it was generated from, so regeneration is a
// stamp comparison instead of a dirty flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Stamp {
    seed: u32,
    w: u32,
    h: u32,
    regen: u32,
}

pub(crate) struct Layer {
    pub(crate) index: usize,
    pub(crate) reference_y: f32,
    pub(crate) silhouette: Vec<f32>,
    pub(crate) regen_count: u32,
    pub(crate) was_visible: bool,
    stamp: Option<Stamp>,
}

impl Layer {
    fn new(index: usize) -> Self {
        Self {
            index,
            reference_y: 0.0,
            silhouette: Vec::new(),
            regen_count: 0,
            // layers count as seen at start so the first frame does not
            // immediately perturb their seeds
            was_visible: true,
            stamp: None,
        }
    }

    fn ensure_silhouette(
        &mut self,
        seed: u32,
        count: usize,
        w: usize,
        h: usize,
        seeded_shapes: bool,
        t: &Tuning,
    ) {
        let stamp = Stamp {
            seed,
            w: w as u32,
            h: h as u32,
            regen: self.regen_count,
        };
        if self.stamp == Some(stamp) {
            return;
        }

        let shape_seed = seed
            .wrapping_add(self.index as u32)
            .wrapping_add(self.regen_count.wrapping_mul(131));
        let noise = NoiseField::new(shape_seed);
        let params = if seeded_shapes {
            RidgeParams::draw(&mut StdRng::seed_from_u64(shape_seed as u64), w as f32)
        } else {
            RidgeParams::draw(&mut rand::thread_rng(), w as f32)
        };

        let depth = self.index as f32 / count as f32;
        self.reference_y = t.reference_y(depth, h as f32);
        let amplitude = t.layer_amplitude(h as f32);
        self.silhouette = generate_profile(&noise, &params, w, amplitude, self.reference_y);
        self.stamp = Some(stamp);
    }
}

// Bounded replacement for the original's module-level color maps: a plain
// map with a size cap that clears itself instead of growing forever.
pub(crate) struct ColorCache {
    map: HashMap<i64, (Rgb, Rgb)>,
    cap: usize,
}

impl ColorCache {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            cap: cap.max(1),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn get_or_insert_with(
        &mut self,
        key: i64,
        f: impl FnOnce() -> (Rgb, Rgb),
    ) -> (Rgb, Rgb) {
        if let Some(v) = self.map.get(&key) {
            return *v;
        }
        if self.map.len() >= self.cap {
            self.map.clear();
        }
        let v = f();
        self.map.insert(key, v);
        v
    }
}

pub(crate) struct SceneState {
    pub(crate) seed: u32,
    pub(crate) debug_angle: f32,
}

pub(crate) struct FrameStats {
    pub(crate) drawn: usize,
    pub(crate) front_layer: usize,
    pub(crate) front_frontness: f32,
}

const SKY_CACHE_CAP: usize = 512;
const SKY_BUCKET: f32 = 8.0;
const SKY_HUE_DRIFT: f32 = 9.0;
const HORIZON_VEIL_FRAC: f32 = 0.55;

pub(crate) struct Compositor {
    pub(crate) layers: Vec<Layer>,
    pub(crate) recycle: bool,
    pub(crate) seeded_shapes: bool,
    pub(crate) max_visible: usize,
    palette_idx: usize,
    jitter: NoiseField,
    jitter_seed: u32,
    sky_cache: ColorCache,
}

impl Compositor {
    pub(crate) fn new(
        seed: u32,
        count: usize,
        palette_idx: usize,
        seeded_shapes: bool,
        recycle: bool,
        max_visible: usize,
    ) -> Self {
        let count = count.max(1);
        Self {
            layers: (1..=count).map(Layer::new).collect(),
            recycle,
            seeded_shapes,
            max_visible: max_visible.max(1),
            palette_idx: palette_idx % PALETTES.len(),
            jitter: NoiseField::new(seed),
            jitter_seed: seed,
            sky_cache: ColorCache::new(SKY_CACHE_CAP),
        }
    }

    pub(crate) fn palette(&self) -> &'static Palette {
        &PALETTES[self.palette_idx]
    }

    pub(crate) fn cycle_palette(&mut self) -> &'static str {
        self.palette_idx = (self.palette_idx + 1) % PALETTES.len();
        self.palette().name
    }

    fn refresh_jitter(&mut self, seed: u32) {
        if seed != self.jitter_seed {
            self.jitter = NoiseField::new(seed);
            self.jitter_seed = seed;
        }
    }

    fn sky_colors(&mut self, virtual_scroll: f32, t: &Tuning) -> (Rgb, Rgb) {
        let bucket = (virtual_scroll / SKY_BUCKET).round();
        let key = bucket as i64;
        let palette = self.palette();
        let rotation_speed = t.rotation_speed;
        self.sky_cache.get_or_insert_with(key, || {
            // hue drifts gently with the cylinder phase
            let rot = ((bucket * SKY_BUCKET * rotation_speed) % std::f32::consts::TAU
                + std::f32::consts::TAU)
                % std::f32::consts::TAU;
            let drift = rot.sin() * SKY_HUE_DRIFT;
            let shift = |c: Hsb| -> Rgb {
                hsb_to_rgba(Hsb::new(
                    (c.h + drift).rem_euclid(360.0),
                    c.s,
                    c.b,
                    c.a,
                ))
                .rgb
            };
            (shift(palette.sky_top), shift(palette.sky_bottom))
        })
    }

    /// Render one frame into the canvas: project every layer, recycle the
    /// ones swinging back into view, then paint sky, silhouettes
    /// back-to-front and the mist veil.
    pub(crate) fn frame(
        &mut self,
        canvas: &mut PixelCanvas,
        scene: &SceneState,
        virtual_scroll: f32,
        t: &Tuning,
    ) -> FrameStats {
        self.refresh_jitter(scene.seed);

        let count = self.layers.len();
        let (w, h) = (canvas.w, canvas.h);

        let projections: Vec<Projection> = self
            .layers
            .iter()
            .map(|l| projector::project(l.index, count, virtual_scroll, h as f32, scene.debug_angle, t))
            .collect();

        for (layer, proj) in self.layers.iter_mut().zip(&projections) {
            if self.recycle && proj.visible && !layer.was_visible {
                layer.regen_count += 1;
            }
            layer.was_visible = proj.visible;
        }

        // nearest layers win the visibility cap, then draw far-to-near
        let mut order: Vec<usize> = (0..count).filter(|&i| projections[i].visible).collect();
        order.sort_by(|&a, &b| {
            projections[b]
                .frontness
                .total_cmp(&projections[a].frontness)
        });
        order.truncate(self.max_visible);
        order.reverse();

        let (sky_top, sky_bottom) = self.sky_colors(virtual_scroll, t);
        canvas.clear_gradient(sky_top, sky_bottom);

        let mut stats = FrameStats {
            drawn: 0,
            front_layer: 0,
            front_frontness: -1.0,
        };

        let palette = self.palette();
        for &i in &order {
            let proj = projections[i];
            let layer = &mut self.layers[i];
            layer.ensure_silhouette(scene.seed, count, w, h, self.seeded_shapes, t);

            let fill = hsb_to_rgba(layer_color(
                layer.index,
                count,
                palette.stops,
                &self.jitter,
                proj.z_order,
            ));
            let alpha = fill.a * proj.opacity;
            if alpha <= 0.0 {
                continue;
            }

            let crest = fill.rgb.scale(1.35);
            for x in 0..w {
                let sx = ((x as f32 - proj.x_offset) as i32).rem_euclid(w.max(1) as i32) as usize;
                let top =
                    (layer.silhouette[sx] - layer.reference_y) * proj.scale + layer.reference_y
                        + proj.y_offset;
                canvas.fill_column_down(x as i32, top, fill.rgb, alpha);
                // one-subpixel rim light along the profile
                canvas.blend_pixel(x as i32, top.floor() as i32 - 1, crest, alpha * 0.5);
            }

            stats.drawn += 1;
            if proj.frontness > stats.front_frontness {
                stats.front_frontness = proj.frontness;
                stats.front_layer = layer.index;
            }
        }

        let mist = hsb_to_rgba(palette.mist);
        canvas.vertical_veil(h as f32 * HORIZON_VEIL_FRAC, mist.rgb, mist.a);

        stats
    }
}
