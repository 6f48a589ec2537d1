use std::time::{Duration, Instant};

use anyhow::bail;

use crate::color::{Rgb, PALETTES};
use crate::config::{Cli, Tuning};
use crate::input::{collect_actions, Action, InputState};
use crate::motion::Motion;
use crate::render::{canvas_to_cells, draw_text, Terminal};
use crate::scene::{Compositor, SceneState};

// Frame scheduling as an explicit handle: start() arms it, stop() ends the
// loop, wait() blocks until the next tick.
pub(crate) struct FrameClock {
    interval: Duration,
    next: Instant,
    running: bool,
}

impl FrameClock {
    pub(crate) fn new(fps: u32) -> Self {
        let fps = fps.clamp(10, 240);
        Self {
            interval: Duration::from_secs_f32(1.0 / fps as f32),
            next: Instant::now(),
            running: false,
        }
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
        self.next = Instant::now() + self.interval;
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// Sleep out the rest of the frame, then arm the next deadline. Falls
    /// back to "now + interval" when a frame overran.
    pub(crate) fn wait(&mut self) {
        let now = Instant::now();
        if now < self.next {
            spin_sleep(self.next - now);
        }
        let now = Instant::now();
        self.next = if now > self.next + self.interval {
            now + self.interval
        } else {
            self.next + self.interval
        };
    }
}

fn spin_sleep(left: Duration) {
    let end = Instant::now() + left;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        if end - t > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

pub(crate) struct App {
    tuning: Tuning,
    term: Terminal,
    motion: Motion,
    scene: SceneState,
    comp: Compositor,
    input: InputState,
    clock: FrameClock,
    paused: bool,
    show_help: bool,
    show_hud: bool,
    fps: f32,
}

impl App {
    fn init(cli: Cli) -> anyhow::Result<Self> {
        let Some(palette_idx) = PALETTES
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(&cli.palette))
        else {
            let names: Vec<&str> = PALETTES.iter().map(|p| p.name).collect();
            bail!("unknown palette '{}' (try: {})", cli.palette, names.join(", "));
        };

        let tuning = Tuning::from_cli(&cli);
        let comp = Compositor::new(
            cli.seed,
            cli.layers.clamp(1, 64),
            palette_idx,
            cli.seeded_shapes,
            !cli.no_recycle,
            cli.max_visible,
        );
        let mut motion = Motion::new();
        motion.auto_scroll = cli.auto_scroll;

        let term = Terminal::begin()?;

        Ok(Self {
            tuning,
            term,
            motion,
            scene: SceneState {
                seed: cli.seed,
                debug_angle: 0.0,
            },
            comp,
            input: InputState::default(),
            clock: FrameClock::new(cli.fps),
            paused: false,
            show_help: true,
            show_hud: true,
            fps: 0.0,
        })
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.clock.stop(),
            Action::TogglePause => self.paused = !self.paused,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::ToggleAuto => self.motion.auto_scroll = !self.motion.auto_scroll,
            Action::ToggleOvalInput => {
                self.motion.oval_input_scaling = !self.motion.oval_input_scaling
            }
            Action::CyclePalette => {
                self.comp.cycle_palette();
            }
            Action::Reseed => self.scene.seed = rand::random(),
            Action::Wheel(delta) => self.motion.wheel(delta, &self.tuning),
            Action::Drag(delta) => self.motion.drag(delta, &self.tuning),
            Action::Impulse(dir) => self.motion.impulse(dir, &self.tuning),
            Action::DebugRotate(d) => self.scene.debug_angle += d,
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let stats = self.comp.frame(
            &mut self.term.canvas,
            &self.scene,
            self.motion.virtual_scroll,
            &self.tuning,
        );
        canvas_to_cells(&self.term.canvas, &mut self.term.cur);

        if self.show_hud {
            let flags = match (self.paused, self.motion.auto_scroll) {
                (true, _) => "  [paused]",
                (false, true) => "  [auto]",
                _ => "",
            };
            let line = format!(
                "ridgeline  seed {}  {}  scroll {:7.0}  vel {:+6.2}  front L{:<2}  drawn {:2}  fps {:3.0}{}",
                self.scene.seed,
                self.comp.palette().name,
                self.motion.virtual_scroll,
                self.motion.velocity,
                stats.front_layer,
                stats.drawn,
                self.fps,
                flags,
            );
            draw_text(
                &mut self.term.cur,
                1,
                0,
                &line,
                Rgb { r: 210, g: 210, b: 220 },
                Rgb { r: 0, g: 0, b: 0 },
            );
        }
        if self.show_help {
            let help = "Wheel/drag scroll  Up/Down push  Left/Right tilt  Space pause  A auto  \
                        O input-ease  T palette  R reseed  D hud  H help  Q quit";
            draw_text(
                &mut self.term.cur,
                1,
                1,
                help,
                Rgb { r: 160, g: 165, b: 185 },
                Rgb { r: 0, g: 0, b: 0 },
            );
        }

        self.term.present()
    }

    fn run_loop(&mut self) -> anyhow::Result<()> {
        self.clock.start();
        let mut last = Instant::now();

        while self.clock.is_running() {
            self.term.resize_if_needed()?;

            for action in collect_actions(&mut self.input, self.tuning.wheel_step)? {
                self.apply(action);
            }

            // momentum and easing run every frame; pause freezes them
            if !self.paused {
                self.motion.tick(&self.tuning);
            }

            self.render_frame()?;

            let now = Instant::now();
            let dt = (now - last).as_secs_f32().max(1e-4);
            last = now;
            self.fps = if self.fps == 0.0 {
                1.0 / dt
            } else {
                self.fps * 0.9 + (1.0 / dt) * 0.1
            };

            self.clock.wait();
        }
        Ok(())
    }
}

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app = App::init(cli)?;
    let res = app.run_loop();
    // restore the terminal no matter how the loop ended
    let end = app.term.end();
    res.and(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_stopped_and_toggles() {
        let mut c = FrameClock::new(60);
        assert!(!c.is_running());
        c.start();
        assert!(c.is_running());
        c.stop();
        assert!(!c.is_running());
    }

    #[test]
    fn clock_clamps_silly_frame_rates() {
        let slow = FrameClock::new(1);
        assert!(slow.interval <= Duration::from_millis(101));
        let fast = FrameClock::new(100_000);
        assert!(fast.interval >= Duration::from_millis(4));
    }

    #[test]
    fn wait_advances_the_deadline() {
        let mut c = FrameClock::new(240);
        c.start();
        let before = c.next;
        c.wait();
        assert!(c.next > before);
    }
}
