use crate::{
    curve::{trace_arc, trace_cubic, trace_quad},
    Matrix, Path, PathCmd, DEFAULT_FLATNESS,
};

/// Receiver of a flattened path.
pub trait Flattener {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn line_join(&mut self);
    fn close(&mut self);
    fn end(&mut self);
}

impl<F: Flattener + ?Sized> Flattener for &mut F {
    #[inline]
    fn move_to(&mut self, x: f64, y: f64) {
        (**self).move_to(x, y);
    }

    #[inline]
    fn line_to(&mut self, x: f64, y: f64) {
        (**self).line_to(x, y);
    }

    #[inline]
    fn line_join(&mut self) {
        (**self).line_join();
    }

    #[inline]
    fn close(&mut self) {
        (**self).close();
    }

    #[inline]
    fn end(&mut self) {
        (**self).end();
    }
}

pub struct Transformer<F> {
    pub tr: Matrix,
    pub next: F,
}

impl<F: Flattener> Transformer<F> {
    #[inline]
    pub fn new(tr: Matrix, next: F) -> Self {
        Self { tr, next }
    }

    pub fn into_inner(self) -> F {
        self.next
    }
}

impl<F: Flattener> Flattener for Transformer<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        let (x, y) = self.tr.transform_point(x, y);
        self.next.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let (x, y) = self.tr.transform_point(x, y);
        self.next.line_to(x, y);
    }

    #[inline]
    fn line_join(&mut self) {
        self.next.line_join();
    }

    #[inline]
    fn close(&mut self) {
        self.next.close();
    }

    #[inline]
    fn end(&mut self) {
        self.next.end();
    }
}

pub struct DemuxFlattener<'a, 'b> {
    pub flatteners: &'a mut [&'b mut dyn Flattener],
}

impl<'a, 'b> DemuxFlattener<'a, 'b> {
    pub fn new(flatteners: &'a mut [&'b mut dyn Flattener]) -> Self {
        Self { flatteners }
    }
}

impl Flattener for DemuxFlattener<'_, '_> {
    fn move_to(&mut self, x: f64, y: f64) {
        for flattener in self.flatteners.iter_mut() {
            flattener.move_to(x, y);
        }
    }

    fn line_to(&mut self, x: f64, y: f64) {
        for flattener in self.flatteners.iter_mut() {
            flattener.line_to(x, y);
        }
    }

    fn line_join(&mut self) {
        for flattener in self.flatteners.iter_mut() {
            flattener.line_join();
        }
    }

    fn close(&mut self) {
        for flattener in self.flatteners.iter_mut() {
            flattener.close();
        }
    }

    fn end(&mut self) {
        for flattener in self.flatteners.iter_mut() {
            flattener.end();
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BoundsFlattener {
    bounds: Option<(f64, f64, f64, f64)>,
}

impl BoundsFlattener {
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounds
    }

    fn add(&mut self, x: f64, y: f64) {
        self.bounds = Some(match self.bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
}

impl Flattener for BoundsFlattener {
    fn move_to(&mut self, x: f64, y: f64) {
        self.add(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.add(x, y);
    }

    fn line_join(&mut self) {}

    fn close(&mut self) {}

    fn end(&mut self) {}
}

pub fn flatten<F: Flattener + ?Sized>(path: &Path, flattener: &mut F, scale: f64) {
    flatten_with_tolerance(path, flattener, scale, DEFAULT_FLATNESS);
}

pub fn flatten_with_tolerance<F: Flattener + ?Sized>(
    path: &Path,
    flattener: &mut F,
    scale: f64,
    flatness: f64,
) {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let tolerance = flatness / (scale * scale);

    let (mut start_x, mut start_y) = (0.0, 0.0);
    let (mut x, mut y) = (0.0, 0.0);
    let mut started = false;
    let mut i = 0;

    for cmd in path.components() {
        let p = &path.points()[i..i + cmd.arity()];
        i += cmd.arity();

        if !started && *cmd != PathCmd::MoveTo {
            flattener.move_to(0.0, 0.0);
            started = true;
        }

        match cmd {
            PathCmd::MoveTo => {
                if started {
                    flattener.end();
                }
                started = true;
                (x, y) = (p[0], p[1]);
                (start_x, start_y) = (x, y);
                flattener.move_to(x, y);
            }
            PathCmd::LineTo => {
                (x, y) = (p[0], p[1]);
                flattener.line_to(x, y);
                flattener.line_join();
            }
            PathCmd::QuadCurveTo => {
                trace_quad(flattener, &[x, y, p[0], p[1], p[2], p[3]], tolerance);
                (x, y) = (p[2], p[3]);
                flattener.line_join();
            }
            PathCmd::CubicCurveTo => {
                trace_cubic(flattener, &[x, y, p[0], p[1], p[2], p[3], p[4], p[5]], tolerance);
                (x, y) = (p[4], p[5]);
                flattener.line_join();
            }
            PathCmd::ArcTo => {
                (x, y) = trace_arc(flattener, p[0], p[1], p[2], p[3], p[4], p[5], scale);
                flattener.line_join();
            }
            PathCmd::Close => {
                flattener.line_to(start_x, start_y);
                flattener.close();
                (x, y) = (start_x, start_y);
            }
        }
    }

    flattener.end();
}
