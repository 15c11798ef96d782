//! Scanline coverage rasterizer
//!
//! Every edge adds its signed area difference to an accumulator laid out like the
//! target image. A row is resolved by a running sum from left to right, the sum
//! at a pixel is its winding number with fractional coverage on the edges.

use crate::{Flattener, Painter};

const EPSILON: f64 = 1e-9;

const SPAN_BATCH: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FillRule {
    #[default]
    EvenOdd = 0,
    NonZero = 1,
}

impl FillRule {
    #[inline]
    #[must_use]
    pub fn coverage(self, acc: f32) -> f32 {
        match self {
            Self::NonZero => acc.abs().min(1.0),
            Self::EvenOdd => ((acc + 1.0).rem_euclid(2.0) - 1.0).abs(),
        }
    }
}

/// A run of pixels `[x0, x1)` on row `y` sharing one coverage value.
///
/// `alpha` is the coverage scaled to `0..=0xffff`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub y: usize,
    pub x0: usize,
    pub x1: usize,
    pub alpha: u32,
}

bitflags! {
    struct Outcode: u8 {
        const LEFT   = 0x01;
        const RIGHT  = 0x02;
        const TOP    = 0x04;
        const BOTTOM = 0x08;
    }
}

fn compute_outcode(x: f64, y: f64, width: f64, height: f64) -> Outcode {
    let mut outcode = Outcode::empty();
    if x < 0.0 {
        outcode.insert(Outcode::LEFT);
    }
    if y < 0.0 {
        outcode.insert(Outcode::TOP);
    }
    if x > width {
        outcode.insert(Outcode::RIGHT);
    }
    if y > height {
        outcode.insert(Outcode::BOTTOM);
    }
    outcode
}

pub struct Rasterizer {
    width: usize,
    height: usize,
    // Row stride of `cells`, two spare columns catch contributions at `x == width`
    stride: usize,
    cells: Vec<f32>,
    dirty: Option<(usize, usize)>,
    spans: Vec<Span>,

    start: (f64, f64),
    last: (f64, f64),
    open: bool,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        let stride = width + 2;
        Self {
            width,
            height,
            stride,
            cells: vec![0.0; stride * height],
            dirty: None,
            spans: Vec::with_capacity(SPAN_BATCH),
            start: (0.0, 0.0),
            last: (0.0, 0.0),
            open: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn reset(&mut self) {
        if let Some((y0, y1)) = self.dirty.take() {
            self.cells[y0 * self.stride..(y1 + 1) * self.stride].fill(0.0);
        }
        self.open = false;
    }

    pub fn add_edge(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }

        let (width, height) = (self.width as f64, self.height as f64);
        let outcode_from = compute_outcode(x0, y0, width, height);
        let outcode_to = compute_outcode(x1, y1, width, height);
        // Edges left of the image still move the winding of every pixel on their rows
        if !(outcode_from & outcode_to & (Outcode::TOP | Outcode::BOTTOM | Outcode::RIGHT))
            .is_empty()
        {
            return;
        }

        // Past the right border only columns nobody reads are affected, flatten
        // that part onto the border
        let ((x0, y0), (x1, y1)) = if x0 > width || x1 > width {
            if x0 > width && x1 > width {
                ((width, y0), (width, y1))
            } else {
                let t = (x0 - width) / (x0 - x1);
                let mid = (width, (1.0 - t) * y0 + t * y1);
                if x0 < width {
                    ((x0, y0), mid)
                } else {
                    (mid, (x1, y1))
                }
            }
        } else {
            ((x0, y0), (x1, y1))
        };

        // Left of `x == 0` the edge becomes a vertical edge on the border
        if x0 < 0.0 || x1 < 0.0 {
            if x0 >= 0.0 || x1 >= 0.0 {
                let t = x0 / (x0 - x1);
                let mid_y = (1.0 - t) * y0 + t * y1;
                if x0 < 0.0 {
                    self.accumulate(0.0, y0, 0.0, mid_y);
                    self.accumulate(0.0, mid_y, x1, y1);
                } else {
                    self.accumulate(x0, y0, 0.0, mid_y);
                    self.accumulate(0.0, mid_y, 0.0, y1);
                }
            } else {
                self.accumulate(0.0, y0, 0.0, y1);
            }
        } else {
            self.accumulate(x0, y0, x1, y1);
        }
    }

    fn accumulate(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        if (y0 - y1).abs() < EPSILON {
            return;
        }

        let (dir, (x0, y0), (x1, y1)) = if y0 < y1 {
            (1.0, (x0, y0), (x1, y1))
        } else {
            (-1.0, (x1, y1), (x0, y0))
        };

        let first_row = y0.max(0.0) as usize;
        let last_row = (y1.ceil().max(0.0) as usize).min(self.height);
        if first_row >= last_row {
            return;
        }

        let width = self.width as f64;
        let dxdy = (x1 - x0) / (y1 - y0);
        let mut x_next = if y0 < 0.0 { x0 - y0 * dxdy } else { x0 };

        for row in first_row..last_row {
            let offset = row * self.stride;
            let x = x_next.clamp(0.0, width);
            let dy = ((row + 1) as f64).min(y1) - (row as f64).max(y0);
            let d = dir * dy;
            x_next = x + dxdy * dy;
            let x_end = x_next.clamp(0.0, width);

            let (left, right) = if x < x_end { (x, x_end) } else { (x_end, x) };
            let left_floor = left.floor();
            let li = left_floor as usize;
            let right_ceil = right.ceil();
            let ri = right_ceil as usize;

            let cells = &mut self.cells[offset..offset + self.stride];
            if ri <= li + 1 {
                // inside a single pixel column
                let xmf = 0.5 * (x + x_end) - left_floor;
                cells[li] += (d * (1.0 - xmf)) as f32;
                cells[li + 1] += (d * xmf) as f32;
            } else {
                let s = (right - left).recip();
                let lf = left - left_floor;
                let rf = right - right_ceil + 1.0;
                let a0 = 0.5 * s * (1.0 - lf) * (1.0 - lf);
                let am = 0.5 * s * rf * rf;
                cells[li] += (d * a0) as f32;
                if ri == li + 2 {
                    cells[li + 1] += (d * (1.0 - a0 - am)) as f32;
                } else {
                    let a1 = s * (1.5 - lf);
                    cells[li + 1] += (d * (a1 - a0)) as f32;
                    for cell in &mut cells[li + 2..ri - 1] {
                        *cell += (d * s) as f32;
                    }
                    let a2 = a1 + (ri - li - 3) as f64 * s;
                    cells[ri - 1] += (d * (1.0 - a2 - am)) as f32;
                }
                cells[ri] += (d * am) as f32;
            }
        }

        self.dirty = Some(match self.dirty {
            None => (first_row, last_row - 1),
            Some((top, bottom)) => (top.min(first_row), bottom.max(last_row - 1)),
        });
    }

    fn close_subpath(&mut self) {
        if self.open {
            let ((x0, y0), (x1, y1)) = (self.last, self.start);
            if x0 != x1 || y0 != y1 {
                self.add_edge(x0, y0, x1, y1);
            }
            self.last = self.start;
        }
    }

    pub fn rasterize<P: Painter + ?Sized>(&mut self, painter: &mut P, rule: FillRule) {
        self.close_subpath();
        self.open = false;

        let Some((first_row, last_row)) = self.dirty.take() else {
            painter.paint(&[], true);
            return;
        };
        log::trace!("Sweeping rows {first_row}..={last_row} with {rule:?}");

        self.spans.clear();
        for y in first_row..=last_row {
            let offset = y * self.stride;
            let mut acc = 0.0f32;
            let mut run: Option<(usize, u32)> = None;

            for x in 0..self.width {
                acc += self.cells[offset + x];
                let alpha8 = (rule.coverage(acc) * 255.0 + 0.5) as u32;
                let alpha = alpha8.min(255) * 0x101;

                match run {
                    Some((_, current)) if current == alpha => {}
                    Some((x0, current)) => {
                        if current > 0 {
                            self.push_span(painter, Span { y, x0, x1: x, alpha: current });
                        }
                        run = Some((x, alpha));
                    }
                    None => run = Some((x, alpha)),
                }
            }
            if let Some((x0, alpha)) = run {
                if alpha > 0 {
                    self.push_span(painter, Span { y, x0, x1: self.width, alpha });
                }
            }

            self.cells[offset..offset + self.stride].fill(0.0);
        }

        painter.paint(&self.spans, true);
        self.spans.clear();
    }

    fn push_span<P: Painter + ?Sized>(&mut self, painter: &mut P, span: Span) {
        if self.spans.len() == SPAN_BATCH {
            painter.paint(&self.spans, false);
            self.spans.clear();
        }
        self.spans.push(span);
    }
}

impl Flattener for Rasterizer {
    fn move_to(&mut self, x: f64, y: f64) {
        self.close_subpath();
        self.start = (x, y);
        self.last = (x, y);
        self.open = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if !self.open {
            self.move_to(x, y);
            return;
        }
        let (x0, y0) = self.last;
        self.add_edge(x0, y0, x, y);
        self.last = (x, y);
    }

    fn line_join(&mut self) {}

    fn close(&mut self) {
        self.close_subpath();
    }

    fn end(&mut self) {
        self.close_subpath();
    }
}
