//! Polyline widening
//!
//! [LineStroker] turns the centerline it receives into closed outlines meant to
//! be filled with the non-zero rule. The outline of an open sub-path is its `+n`
//! side forward, the far cap, the `-n` side backward and the near cap. A closed
//! sub-path produces two loops of opposite orientation.

use {
    crate::{curve::arc_step, Flattener, DEFAULT_MITER_LIMIT},
    macroquad::math::DVec2,
    std::f64::consts::PI,
};

const MIN_SEGMENT_LENGTH: f64 = 1e-9;

const MIN_CAP_SEGMENTS: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineCap {
    #[default]
    Round = 0,
    Butt = 1,
    Square = 2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LineJoin {
    Bevel = 0,
    #[default]
    Round = 1,
    Miter = 2,
}

/// Offset point buffers, kept between strokes to reuse their allocations
#[derive(Debug, Default)]
pub struct StrokeBuffers {
    outer: Vec<DVec2>,
    inner: Vec<DVec2>,
}

impl StrokeBuffers {
    pub fn capacity(&self) -> usize {
        self.outer.capacity().min(self.inner.capacity())
    }
}

pub struct LineStroker<F> {
    next: F,
    half_width: f64,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f64,
    scale: f64,

    outer: Vec<DVec2>,
    inner: Vec<DVec2>,

    start: DVec2,
    start_normal: DVec2,
    start_dir: DVec2,
    last: DVec2,
    last_normal: DVec2,
    last_dir: DVec2,
    segments: usize,
    has_point: bool,
    // The vertex at `last` was marked by `line_join`
    pending_join: bool,
}

impl<F: Flattener> LineStroker<F> {
    pub fn new(next: F, width: f64, cap: LineCap, join: LineJoin) -> Self {
        Self::with_buffers(next, width, cap, join, StrokeBuffers::default())
    }

    pub fn with_buffers(
        next: F,
        width: f64,
        cap: LineCap,
        join: LineJoin,
        buffers: StrokeBuffers,
    ) -> Self {
        let StrokeBuffers { mut outer, mut inner } = buffers;
        outer.clear();
        inner.clear();

        let half_width = if width.is_finite() && width > 0.0 {
            width / 2.0
        } else {
            log::debug!("Stroke width {width} draws nothing");
            0.0
        };

        Self {
            next,
            half_width,
            cap,
            join,
            miter_limit: DEFAULT_MITER_LIMIT,
            scale: 1.0,
            outer,
            inner,
            start: DVec2::ZERO,
            start_normal: DVec2::ZERO,
            start_dir: DVec2::ZERO,
            last: DVec2::ZERO,
            last_normal: DVec2::ZERO,
            last_dir: DVec2::ZERO,
            segments: 0,
            has_point: false,
            pending_join: false,
        }
    }

    #[must_use]
    pub fn with_miter_limit(mut self, miter_limit: f64) -> Self {
        self.miter_limit = miter_limit;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    pub fn into_inner(self) -> F {
        self.next
    }

    pub fn into_parts(self) -> (F, StrokeBuffers) {
        let buffers = StrokeBuffers {
            outer: self.outer,
            inner: self.inner,
        };
        (self.next, buffers)
    }

    fn reset(&mut self) {
        self.outer.clear();
        self.inner.clear();
        self.segments = 0;
        self.pending_join = false;
    }

    fn arc_segments(&self, sweep: f64, min: usize) -> usize {
        let step = arc_step(self.half_width, self.half_width, self.scale);
        let segments = if step.is_finite() && step > 0.0 {
            (sweep.abs() / step).ceil() as usize
        } else {
            min
        };
        segments.clamp(min, 1024)
    }

    fn add_join(&mut self, pivot: DVec2, n1: DVec2, d1: DVec2, n2: DVec2, d2: DVec2, join: LineJoin) {
        let cross = d1.perp_dot(d2);
        let dot = d1.dot(d2);
        if cross.abs() < 1e-12 && dot > 0.0 {
            self.outer.push(pivot + n2);
            self.inner.push(pivot - n2);
            return;
        }

        // `s` picks the side on the outside of the turn
        let s = if cross > 0.0 { 1.0 } else { -1.0 };
        let hw = self.half_width;
        let round_segments = match join {
            LineJoin::Round => {
                let a1 = (n1 * s).y.atan2((n1 * s).x);
                let a2 = (n2 * s).y.atan2((n2 * s).x);
                let sweep = if cross.abs() < 1e-12 {
                    PI * (n1 * s).perp_dot(d1).signum()
                } else {
                    let mut sweep = a2 - a1;
                    if sweep > PI {
                        sweep -= 2.0 * PI;
                    } else if sweep < -PI {
                        sweep += 2.0 * PI;
                    }
                    sweep
                };
                Some((a1, sweep, self.arc_segments(sweep, 1)))
            }
            _ => None,
        };

        let (outside, inside) = if s > 0.0 {
            (&mut self.outer, &mut self.inner)
        } else {
            (&mut self.inner, &mut self.outer)
        };

        match (join, round_segments) {
            (LineJoin::Round, Some((a1, sweep, segments))) => {
                for i in 1..segments {
                    let angle = a1 + sweep * i as f64 / segments as f64;
                    outside.push(pivot + DVec2::new(angle.cos(), angle.sin()) * hw);
                }
            }
            (LineJoin::Miter, _) => {
                let cos_half = ((1.0 + n1.dot(n2) / (hw * hw)) / 2.0).max(0.0).sqrt();
                if cos_half > 1e-9 && 1.0 / cos_half <= self.miter_limit {
                    let bisector = (n1 + n2).normalize_or_zero() * s;
                    outside.push(pivot + bisector * (hw / cos_half));
                }
            }
            _ => {}
        }
        outside.push(pivot + n2 * s);

        inside.push(pivot);
        inside.push(pivot - n2 * s);
    }

    fn add_segment(&mut self, to: DVec2) -> bool {
        let delta = to - self.last;
        let length = delta.length();
        if !length.is_finite() || length < MIN_SEGMENT_LENGTH {
            return false;
        }

        let dir = delta / length;
        let n = DVec2::new(dir.y, -dir.x) * self.half_width;

        if self.segments == 0 {
            self.start_normal = n;
            self.start_dir = dir;
            self.outer.push(self.last + n);
            self.inner.push(self.last - n);
        } else {
            let join = if self.pending_join { self.join } else { LineJoin::Bevel };
            self.add_join(self.last, self.last_normal, self.last_dir, n, dir, join);
        }

        self.outer.push(to + n);
        self.inner.push(to - n);
        self.last = to;
        self.last_normal = n;
        self.last_dir = dir;
        self.segments += 1;
        self.pending_join = false;
        true
    }

    fn emit_cap(&mut self, center: DVec2, n: DVec2, dir: DVec2) {
        match self.cap {
            LineCap::Butt => {}
            LineCap::Square => {
                let extension = dir * self.half_width;
                let (a, b) = (center + n + extension, center - n + extension);
                self.next.line_to(a.x, a.y);
                self.next.line_to(b.x, b.y);
            }
            LineCap::Round => {
                let segments = self.arc_segments(PI, MIN_CAP_SEGMENTS);
                let start = n.y.atan2(n.x);
                for i in 1..segments {
                    let angle = start + PI * i as f64 / segments as f64;
                    let p = center + DVec2::new(angle.cos(), angle.sin()) * self.half_width;
                    self.next.line_to(p.x, p.y);
                }
            }
        }
    }

    fn flush_open(&mut self) {
        if self.segments == 0 || self.half_width == 0.0 {
            self.reset();
            return;
        }

        let first = self.outer[0];
        self.next.move_to(first.x, first.y);
        for i in 1..self.outer.len() {
            let p = self.outer[i];
            self.next.line_to(p.x, p.y);
        }

        self.emit_cap(self.last, self.last_normal, self.last_dir);

        for i in (0..self.inner.len()).rev() {
            let p = self.inner[i];
            self.next.line_to(p.x, p.y);
        }

        self.emit_cap(self.start, -self.start_normal, -self.start_dir);
        self.next.close();
        self.reset();
    }

    fn flush_closed(&mut self) {
        if self.segments == 0 || self.half_width == 0.0 {
            self.reset();
            return;
        }

        let (start_normal, start_dir) = (self.start_normal, self.start_dir);
        self.add_join(self.start, self.last_normal, self.last_dir, start_normal, start_dir, self.join);

        // `-n` side reversed so the two loops wind in opposite directions
        self.emit_loop(false);
        self.emit_loop(true);
        self.reset();
    }

    fn emit_loop(&mut self, reversed: bool) {
        let side = if reversed { &self.inner } else { &self.outer };
        let n = side.len();
        if n == 0 {
            return;
        }

        let point = |i: usize| if reversed { side[n - 1 - i] } else { side[i] };
        let first = point(0);
        self.next.move_to(first.x, first.y);
        for i in 1..n {
            let p = point(i);
            self.next.line_to(p.x, p.y);
        }
        self.next.close();
    }
}

impl<F: Flattener> Flattener for LineStroker<F> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.flush_open();
        let point = DVec2::new(x, y);
        if !point.is_finite() {
            self.has_point = false;
            return;
        }
        self.start = point;
        self.last = point;
        self.has_point = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if !self.has_point {
            self.move_to(x, y);
            return;
        }
        self.add_segment(DVec2::new(x, y));
    }

    #[inline]
    fn line_join(&mut self) {
        if self.segments > 0 {
            self.pending_join = true;
        }
    }

    fn close(&mut self) {
        if !self.has_point {
            return;
        }
        let start = self.start;
        self.add_segment(start);
        self.flush_closed();
        self.last = start;
    }

    fn end(&mut self) {
        self.flush_open();
        self.has_point = false;
        self.next.end();
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::testing::{Event, Recorder},
        super::*,
    };

    fn stroke_segment(cap: LineCap) -> Recorder {
        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 20.0, cap, LineJoin::Round);
        stroker.move_to(50.0, 50.0);
        stroker.line_to(80.0, 50.0);
        stroker.end();
        recorder
    }

    fn has_point(recorder: &Recorder, x: f64, y: f64) -> bool {
        recorder
            .points()
            .iter()
            .any(|p| (p.0 - x).abs() < 1e-6 && (p.1 - y).abs() < 1e-6)
    }

    #[test]
    fn butt_cap_is_a_rectangle() {
        let recorder = stroke_segment(LineCap::Butt);
        assert_eq!(
            recorder.points(),
            vec![(50.0, 40.0), (80.0, 40.0), (80.0, 60.0), (50.0, 60.0)]
        );
        assert!((recorder.signed_area().abs() - 600.0).abs() < 1e-9);
        assert_eq!(&recorder.events[4..], &[Event::Close, Event::End]);
    }

    #[test]
    fn square_cap_extends_by_half_width() {
        let recorder = stroke_segment(LineCap::Square);
        assert!((recorder.signed_area().abs() - 1000.0).abs() < 1e-9);
        assert!(has_point(&recorder, 90.0, 40.0));
        assert!(has_point(&recorder, 40.0, 60.0));
    }

    #[test]
    fn round_cap_adds_two_half_discs() {
        let recorder = stroke_segment(LineCap::Round);
        let expected = 600.0 + PI * 100.0;
        let area = recorder.signed_area().abs();
        assert!(area < expected && expected - area < 10.0, "area {area}");
        assert!(has_point(&recorder, 90.0, 50.0) || recorder.points().len() > 20);
        assert!(recorder.points().iter().all(|p| p.0 >= 40.0 - 1e-9 && p.0 <= 90.0 + 1e-9));
    }

    fn stroke_corner(join: LineJoin, miter_limit: f64) -> Recorder {
        let mut recorder = Recorder::default();
        let mut stroker =
            LineStroker::new(&mut recorder, 2.0, LineCap::Butt, join).with_miter_limit(miter_limit);
        stroker.move_to(0.0, 0.0);
        stroker.line_to(10.0, 0.0);
        stroker.line_join();
        stroker.line_to(10.0, 10.0);
        stroker.end();
        recorder
    }

    #[test]
    fn miter_join_reaches_the_corner() {
        let recorder = stroke_corner(LineJoin::Miter, 10.0);
        assert!(has_point(&recorder, 11.0, -1.0));

        // sqrt(2) exceeds the limit, falls back to bevel
        let recorder = stroke_corner(LineJoin::Miter, 1.2);
        assert!(!has_point(&recorder, 11.0, -1.0));
        assert!(has_point(&recorder, 10.0, -1.0) && has_point(&recorder, 11.0, 0.0));
    }

    #[test]
    fn round_join_stays_on_the_circle() {
        let recorder = stroke_corner(LineJoin::Round, 10.0);
        let bevel = stroke_corner(LineJoin::Bevel, 10.0);
        assert!(recorder.points().len() > bevel.points().len());
        for p in recorder.points() {
            if p.0 > 10.0 && p.1 < 0.0 {
                let r = ((p.0 - 10.0).powi(2) + p.1.powi(2)).sqrt();
                assert!((r - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn unmarked_vertices_are_beveled() {
        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 2.0, LineCap::Butt, LineJoin::Miter);
        stroker.move_to(0.0, 0.0);
        stroker.line_to(10.0, 0.0);
        stroker.line_to(10.0, 10.0);
        stroker.end();
        assert!(!has_point(&recorder, 11.0, -1.0));
    }

    #[test]
    fn closed_path_emits_two_loops() {
        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 2.0, LineCap::Square, LineJoin::Miter);
        stroker.move_to(0.0, 0.0);
        for (x, y) in [(10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            stroker.line_to(x, y);
            stroker.line_join();
        }
        stroker.line_to(0.0, 0.0);
        stroker.close();
        stroker.end();

        let closes = recorder.events.iter().filter(|e| **e == Event::Close).count();
        assert_eq!(closes, 2);
        for (x, y) in [(-1.0, -1.0), (11.0, -1.0), (11.0, 11.0), (-1.0, 11.0)] {
            assert!(has_point(&recorder, x, y), "missing miter tip ({x}, {y})");
        }
        // no square caps on a closed path
        assert!(!has_point(&recorder, -1.0, 1.0));
    }

    #[test]
    fn buffers_are_handed_back() {
        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 2.0, LineCap::Butt, LineJoin::Bevel);
        stroker.move_to(0.0, 0.0);
        for i in 1..100 {
            stroker.line_to(f64::from(i), f64::from(i % 2));
        }
        let (_, buffers) = stroker.into_parts();
        let capacity = buffers.outer.capacity();
        assert!(capacity >= 100);

        let mut again = Recorder::default();
        let mut stroker =
            LineStroker::with_buffers(&mut again, 2.0, LineCap::Butt, LineJoin::Bevel, buffers);
        stroker.move_to(0.0, 0.0);
        stroker.line_to(10.0, 0.0);
        stroker.end();
        let (_, buffers) = stroker.into_parts();
        assert_eq!(buffers.outer.capacity(), capacity);
        assert_eq!(
            again.points(),
            vec![(0.0, -1.0), (10.0, -1.0), (10.0, 1.0), (0.0, 1.0)]
        );
    }

    #[test]
    fn degenerate_input_draws_nothing() {
        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 0.0, LineCap::Round, LineJoin::Round);
        stroker.move_to(0.0, 0.0);
        stroker.line_to(10.0, 0.0);
        stroker.end();
        assert_eq!(recorder.events, vec![Event::End]);

        let mut recorder = Recorder::default();
        let mut stroker = LineStroker::new(&mut recorder, 4.0, LineCap::Round, LineJoin::Round);
        stroker.move_to(5.0, 5.0);
        stroker.line_to(5.0, 5.0);
        stroker.line_to(f64::NAN, 5.0);
        stroker.end();
        assert_eq!(recorder.events, vec![Event::End]);
    }
}
