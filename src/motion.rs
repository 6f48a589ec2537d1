use crate::config::Tuning;
use crate::projector;

// Scroll with inertia. Three scalars: the raw accumulated target, a
// velocity that decays geometrically, and the eased value everything else
// reads. tick() runs once per rendered frame whether or not input arrived,
// so momentum and easing always play out.

pub(crate) struct Motion {
    pub(crate) scroll_target: f32,
    pub(crate) velocity: f32,
    pub(crate) virtual_scroll: f32,
    pub(crate) auto_scroll: bool,
    pub(crate) oval_input_scaling: bool,
}

impl Motion {
    pub(crate) fn new() -> Self {
        Self {
            scroll_target: 0.0,
            velocity: 0.0,
            virtual_scroll: 0.0,
            auto_scroll: false,
            oval_input_scaling: true,
        }
    }

    // wheel deltas are in browser convention: negative means scroll up /
    // push the cylinder forward
    pub(crate) fn wheel(&mut self, delta: f32, t: &Tuning) {
        let v = -delta * t.scroll_sensitivity * self.input_multiplier(t);
        self.add_velocity(v, t);
    }

    pub(crate) fn drag(&mut self, delta: f32, t: &Tuning) {
        let v = delta * t.drag_sensitivity * self.input_multiplier(t);
        self.add_velocity(v, t);
    }

    pub(crate) fn impulse(&mut self, dir: f32, t: &Tuning) {
        self.add_velocity(dir * t.key_impulse, t);
    }

    fn add_velocity(&mut self, v: f32, t: &Tuning) {
        self.velocity = (self.velocity + v).clamp(-t.max_velocity, t.max_velocity);
    }

    // Slow input where the oval compresses vertical motion, so perceived
    // scroll speed tracks what the eye sees. Reuses the projector's oval
    // position at the current rotation.
    fn input_multiplier(&self, t: &Tuning) -> f32 {
        if !self.oval_input_scaling {
            return 1.0;
        }
        let rot = projector::rotation(self.virtual_scroll, t);
        let oval = projector::oval_pos(rot, t.ellipticity).abs();
        (1.0 - t.input_slowdown * oval).max(0.3)
    }

    /// One frame: integrate velocity into the target, decay it, ease the
    /// displayed value. Target and velocity settle before easing runs.
    pub(crate) fn tick(&mut self, t: &Tuning) {
        if self.auto_scroll {
            self.scroll_target += t.auto_scroll_rate;
        }
        self.scroll_target += self.velocity;

        self.velocity *= t.momentum_decay;
        if self.velocity.abs() < t.min_velocity {
            self.velocity = 0.0;
        }
        self.velocity = self.velocity.clamp(-t.max_velocity, t.max_velocity);

        self.virtual_scroll += (self.scroll_target - self.virtual_scroll) * t.easing;
    }
}
