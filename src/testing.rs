use crate::Flattener;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    LineJoin,
    Close,
    End,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                Event::MoveTo(x, y) | Event::LineTo(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn polylines(&self) -> Vec<Vec<(f64, f64)>> {
        let mut polylines: Vec<Vec<(f64, f64)>> = Vec::new();
        for event in &self.events {
            match *event {
                Event::MoveTo(x, y) => polylines.push(vec![(x, y)]),
                Event::LineTo(x, y) => match polylines.last_mut() {
                    Some(polyline) => polyline.push((x, y)),
                    None => polylines.push(vec![(x, y)]),
                },
                _ => {}
            }
        }
        polylines
    }

    pub fn signed_area(&self) -> f64 {
        self.polylines()
            .iter()
            .map(|polyline| {
                let n = polyline.len();
                (0..n)
                    .map(|i| {
                        let (x0, y0) = polyline[i];
                        let (x1, y1) = polyline[(i + 1) % n];
                        x0 * y1 - x1 * y0
                    })
                    .sum::<f64>()
                    / 2.0
            })
            .sum()
    }
}

impl Flattener for Recorder {
    fn move_to(&mut self, x: f64, y: f64) {
        self.events.push(Event::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.events.push(Event::LineTo(x, y));
    }

    fn line_join(&mut self) {
        self.events.push(Event::LineJoin);
    }

    fn close(&mut self) {
        self.events.push(Event::Close);
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }
}
