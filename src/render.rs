use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};

use crate::color::Rgb;

// Drawing surface: an RGB subpixel canvas (2x4 per terminal cell, braille
// resolution) with a coverage plane, downsampled into a cell buffer and
// presented with a diff against the previous frame.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Rgb,
    pub(crate) bg: Rgb,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgb { r: 255, g: 255, b: 255 },
            bg: Rgb { r: 0, g: 0, b: 0 },
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Rgb, bg: Rgb) {
    if y >= buf.h {
        return;
    }
    let mut cx = x;
    for ch in s.chars() {
        if cx >= buf.w {
            break;
        }
        buf.set(cx, y, Cell { ch, fg, bg });
        cx += 1;
    }
}

// Subpixel canvas. Colors composite with plain source-over alpha; the
// coverage plane records how much of each subpixel the mountain fills so
// the downsampler can tell ridge from sky.
pub(crate) struct PixelCanvas {
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) px: Vec<Rgb>,
    pub(crate) cov: Vec<f32>,
}

impl PixelCanvas {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![Rgb { r: 0, g: 0, b: 0 }; w * h],
            cov: vec![0.0; w * h],
        }
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    /// Repaint the whole canvas with a vertical gradient and clear
    /// coverage. This is the per-frame sky pass.
    pub(crate) fn clear_gradient(&mut self, top: Rgb, bottom: Rgb) {
        for y in 0..self.h {
            let t = if self.h > 1 {
                y as f32 / (self.h - 1) as f32
            } else {
                0.0
            };
            let row = top.lerp(bottom, t);
            let base = y * self.w;
            for x in 0..self.w {
                self.px[base + x] = row;
                self.cov[base + x] = 0.0;
            }
        }
    }

    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, c: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        let i = self.idx(x as usize, y as usize);
        self.px[i] = self.px[i].lerp(c, alpha.clamp(0.0, 1.0));
    }

    /// Fill one column of a silhouette: everything from `from_y` down to
    /// the bottom edge belongs to the ridge.
    pub(crate) fn fill_column_down(&mut self, x: i32, from_y: f32, c: Rgb, alpha: f32) {
        if x < 0 || x >= self.w as i32 || alpha <= 0.0 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let top = from_y.floor().max(0.0) as usize;
        for y in top..self.h {
            let i = self.idx(x as usize, y);
            self.px[i] = self.px[i].lerp(c, alpha);
            self.cov[i] = (self.cov[i] + alpha).min(1.0);
        }
    }

    /// Mist veil: alpha ramps linearly from zero at `from_y` to `max_a`
    /// at the bottom edge. Leaves coverage untouched.
    pub(crate) fn vertical_veil(&mut self, from_y: f32, c: Rgb, max_a: f32) {
        if max_a <= 0.0 || self.h == 0 {
            return;
        }
        let y0 = from_y.max(0.0);
        let span = (self.h as f32 - y0).max(1.0);
        let start = y0.floor() as usize;
        for y in start..self.h {
            let a = ((y as f32 - y0) / span * max_a).clamp(0.0, max_a);
            for x in 0..self.w {
                self.blend_pixel(x as i32, y as i32, c, a);
            }
        }
    }
}

const COVERAGE_ON: f32 = 0.5;
const SKY_DIM: f32 = 0.85;

fn dot_bit(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01, // dot1
        (0, 1) => 0x02, // dot2
        (0, 2) => 0x04, // dot3
        (0, 3) => 0x40, // dot7
        (1, 0) => 0x08, // dot4
        (1, 1) => 0x10, // dot5
        (1, 2) => 0x20, // dot6
        (1, 3) => 0x80, // dot8
        _ => 0,
    }
}

fn braille_char(mask: u8) -> char {
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

/// Downsample 2x4 subpixels per cell: covered subpixels become braille
/// dots in the averaged ridge color, the rest becomes a dimmed sky
/// background.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, cells: &mut CellBuffer) {
    let cols = (canvas.w / 2).min(cells.w as usize);
    let rows = (canvas.h / 4).min(cells.h as usize);

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let mut on = (0u32, 0u32, 0u32, 0u32);
            let mut off = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                for dx in 0..2 {
                    let sx = cx * 2 + dx;
                    let sy = cy * 4 + dy;
                    let i = sy * canvas.w + sx;
                    let p = canvas.px[i];
                    if canvas.cov[i] >= COVERAGE_ON {
                        mask |= dot_bit(dx, dy);
                        on = (on.0 + p.r as u32, on.1 + p.g as u32, on.2 + p.b as u32, on.3 + 1);
                    } else {
                        off =
                            (off.0 + p.r as u32, off.1 + p.g as u32, off.2 + p.b as u32, off.3 + 1);
                    }
                }
            }

            let avg = |acc: (u32, u32, u32, u32)| -> Rgb {
                let n = acc.3.max(1);
                Rgb {
                    r: (acc.0 / n) as u8,
                    g: (acc.1 / n) as u8,
                    b: (acc.2 / n) as u8,
                }
            };

            let bg = if off.3 > 0 {
                avg(off).scale(SKY_DIM)
            } else {
                // fully covered cell: fall back to the ridge color so the
                // gaps between dots do not flash sky
                avg(on).scale(0.55)
            };
            let cell = if mask == 0 {
                Cell {
                    ch: ' ',
                    fg: Rgb { r: 0, g: 0, b: 0 },
                    bg,
                }
            } else {
                Cell {
                    ch: braille_char(mask),
                    fg: avg(on),
                    bg,
                }
            };
            cells.set(cx as u16, cy as u16, cell);
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let cols = cols.max(20);
        let rows = rows.max(8);

        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as usize * 2, rows as usize * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// True when the viewport changed; buffers are rebuilt and the next
    /// present repaints everything.
    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        let c = c.max(20);
        let r = r.max(8);
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as usize * 2, r as usize * 4);
        execute!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg: Option<Rgb> = None;
        let mut last_bg: Option<Rgb> = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                self.prev.cells[i] = c;

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(
                        self.out,
                        SetForegroundColor(Color::Rgb {
                            r: c.fg.r,
                            g: c.fg.g,
                            b: c.fg.b
                        })
                    )?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(
                        self.out,
                        SetBackgroundColor(Color::Rgb {
                            r: c.bg.r,
                            g: c.bg.g,
                            b: c.bg.b
                        })
                    )?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        Ok(())
    }
}
