use {
    crate::Flattener,
    macroquad::math::DVec2,
};

// Patterns shorter than this are drawn solid
const MIN_DASH_PERIOD: f64 = 1e-3;

// Most dash boundaries cut into a single segment
const MAX_DASH_BOUNDARIES: usize = 1 << 16;

/// Cuts the incoming polyline into dashes.
///
/// `dash` alternates on and off lengths, starting with on. An empty pattern
/// forwards everything unchanged.
pub struct Dasher<'a, F> {
    next: F,
    dash: &'a [f64],
    offset: f64,
    pos: DVec2,
    index: usize,
    traveled: f64,
    drawing: bool,
    started: bool,
}

impl<'a, F: Flattener> Dasher<'a, F> {
    pub fn new(dash: &'a [f64], offset: f64, next: F) -> Self {
        let period: f64 = dash.iter().sum();
        let dash: &'a [f64] = if !dash.iter().all(|len| len.is_finite() && *len > 0.0) {
            log::debug!("Ignoring invalid dash pattern {dash:?}");
            &[]
        } else if !dash.is_empty() && period < MIN_DASH_PERIOD {
            log::debug!("Dash pattern {dash:?} is too fine, drawing solid lines");
            &[]
        } else {
            dash
        };

        Self {
            next,
            dash,
            offset: if offset.is_finite() { offset } else { 0.0 },
            pos: DVec2::ZERO,
            index: 0,
            traveled: 0.0,
            drawing: false,
            started: false,
        }
    }

    pub fn into_inner(self) -> F {
        self.next
    }

    #[inline]
    fn is_on(&self) -> bool {
        self.index % 2 == 0
    }

    fn advance_dash(&mut self) {
        self.index = (self.index + 1) % self.dash.len();
        self.traveled = 0.0;
    }

    fn finish(&mut self) {
        if self.drawing {
            self.next.end();
            self.drawing = false;
        }
    }

    fn draw_solid(&mut self, to: DVec2) {
        if !self.drawing {
            self.next.move_to(self.pos.x, self.pos.y);
            self.drawing = true;
        }
        self.next.line_to(to.x, to.y);
        self.pos = to;
        self.index = 0;
        self.traveled = 0.0;
    }
}

impl<F: Flattener> Flattener for Dasher<'_, F> {
    fn move_to(&mut self, x: f64, y: f64) {
        if self.dash.is_empty() {
            self.next.move_to(x, y);
            return;
        }

        self.finish();
        self.pos = DVec2::new(x, y);
        self.started = true;

        // Skip whole dash entries covered by the offset
        let total: f64 = self.dash.iter().sum();
        self.index = 0;
        self.traveled = self.offset.rem_euclid(total);
        while self.traveled >= self.dash[self.index] {
            self.traveled -= self.dash[self.index];
            self.index = (self.index + 1) % self.dash.len();
        }

        if self.is_on() {
            self.next.move_to(x, y);
            self.drawing = true;
        }
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if self.dash.is_empty() {
            self.next.line_to(x, y);
            return;
        }
        if !self.started {
            self.move_to(x, y);
            return;
        }

        let to = DVec2::new(x, y);
        let length = self.pos.distance(to);
        if !length.is_finite() || length == 0.0 {
            return;
        }

        let direction = (to - self.pos) / length;
        let mut remaining = length;
        let mut left = self.dash[self.index] - self.traveled;
        let mut boundaries = 0;

        while remaining >= left {
            if boundaries == MAX_DASH_BOUNDARIES {
                log::debug!("Too many dashes on a segment of length {length}, drawing the rest solid");
                self.draw_solid(to);
                return;
            }
            boundaries += 1;

            let boundary = self.pos + direction * left;
            if self.is_on() {
                self.next.line_to(boundary.x, boundary.y);
                self.finish();
            } else {
                self.next.move_to(boundary.x, boundary.y);
                self.drawing = true;
            }

            self.pos = boundary;
            remaining -= left;
            self.advance_dash();
            left = self.dash[self.index];
        }

        self.traveled += remaining;
        if self.is_on() && remaining > 0.0 {
            self.next.line_to(x, y);
        }
        self.pos = to;
    }

    fn line_join(&mut self) {
        if self.dash.is_empty() || self.drawing {
            self.next.line_join();
        }
    }

    fn close(&mut self) {
        if self.dash.is_empty() {
            self.next.close();
        } else {
            // The closing edge has already been walked, dashes never wrap around
            self.finish();
        }
    }

    fn end(&mut self) {
        if self.dash.is_empty() {
            self.next.end();
        } else {
            self.finish();
            self.started = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::testing::{Event, Recorder},
        super::*,
    };

    fn on_length(recorder: &Recorder) -> f64 {
        recorder
            .polylines()
            .iter()
            .map(|polyline| {
                polyline
                    .windows(2)
                    .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
                    .sum::<f64>()
            })
            .sum()
    }

    #[test]
    fn empty_pattern_passes_through() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(10.0, 0.0);
        dasher.close();
        dasher.end();
        assert_eq!(
            recorder.events,
            vec![Event::MoveTo(0.0, 0.0), Event::LineTo(10.0, 0.0), Event::Close, Event::End]
        );
    }

    #[test]
    fn dashes_split_a_line() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[4.0, 2.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(10.0, 0.0);
        dasher.end();

        assert_eq!(
            recorder.polylines(),
            vec![vec![(0.0, 0.0), (4.0, 0.0)], vec![(6.0, 0.0), (10.0, 0.0)]]
        );
        assert_eq!(recorder.events.last(), Some(&Event::End));
    }

    #[test]
    fn on_length_is_conserved() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[4.0, 2.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(60.0, 0.0);
        dasher.end();
        assert!((on_length(&recorder) - 40.0).abs() < 1e-9);

        // dashes carry across polyline vertices
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[4.0, 2.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(29.0, 0.0);
        dasher.line_join();
        dasher.line_to(29.0, 31.0);
        dasher.end();
        assert!((on_length(&recorder) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn offset_shifts_the_pattern() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[4.0, 2.0], 5.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(10.0, 0.0);
        dasher.end();

        // offset 5 starts one unit into the gap
        assert_eq!(
            recorder.polylines(),
            vec![vec![(1.0, 0.0), (5.0, 0.0)], vec![(7.0, 0.0), (10.0, 0.0)]]
        );
    }

    #[test]
    fn close_ends_the_last_dash() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[3.0, 1.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(10.0, 0.0);
        dasher.line_to(0.0, 0.0);
        dasher.close();
        dasher.end();
        assert!(!recorder.events.contains(&Event::Close));
        assert_eq!(recorder.events.last(), Some(&Event::End));
    }

    #[test]
    fn tiny_dashes_draw_a_solid_line() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[1e-12, 1e-12], 0.0, &mut recorder);
        dasher.move_to(0.0, 50.0);
        dasher.line_to(100.0, 50.0);
        dasher.end();
        assert_eq!(
            recorder.events,
            vec![Event::MoveTo(0.0, 50.0), Event::LineTo(100.0, 50.0), Event::End]
        );
    }

    #[test]
    fn dash_count_per_segment_is_bounded() {
        // a short on entry hidden in a long period
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[1e-9, 1.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(1e6, 0.0);
        dasher.end();

        let moves = recorder.events.iter().filter(|e| matches!(e, Event::MoveTo(..))).count();
        assert!(moves <= MAX_DASH_BOUNDARIES / 2 + 2);
        assert_eq!(recorder.points().last(), Some(&(1e6, 0.0)));
        assert_eq!(recorder.events.last(), Some(&Event::End));
    }

    #[test]
    fn invalid_pattern_disables_dashing() {
        let mut recorder = Recorder::default();
        let mut dasher = Dasher::new(&[4.0, -1.0], 0.0, &mut recorder);
        dasher.move_to(0.0, 0.0);
        dasher.line_to(10.0, 0.0);
        assert_eq!(recorder.events.len(), 2);
    }
}
