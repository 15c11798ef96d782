use {
    crate::{BoundsFlattener, Error, Result},
    std::{f64::consts::TAU, fmt},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathCmd {
    MoveTo,
    LineTo,
    QuadCurveTo,
    CubicCurveTo,
    /// `(cx, cy, rx, ry, start_angle, sweep)`
    ArcTo,
    Close,
}

impl PathCmd {
    #[inline]
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::MoveTo | Self::LineTo => 2,
            Self::QuadCurveTo => 4,
            Self::CubicCurveTo | Self::ArcTo => 6,
            Self::Close => 0,
        }
    }
}

pub trait PathBuilder {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quad_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn cubic_curve_to(&mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64);

    /// Add an elliptical arc. Angles are in radians, clockwise from +X on a
    /// Y-down surface; a positive `sweep` runs clockwise.
    fn arc_to(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, sweep: f64);
    fn close(&mut self);
    fn last_point(&self) -> (f64, f64);
    fn is_empty(&self) -> bool;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    components: Vec<PathCmd>,
    points: Vec<f64>,
    // Last point, the anchor for the next command
    x: f64,
    y: f64,
    // Start of the current sub-path
    start_x: f64,
    start_y: f64,
}

impl Path {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(components: Vec<PathCmd>, points: Vec<f64>) -> Result<Self> {
        let expected: usize = components.iter().map(|cmd| cmd.arity()).sum();
        if expected != points.len() {
            return Err(Error::InvalidPath("coordinate count does not match commands"));
        }

        if points.iter().any(|value| !value.is_finite()) {
            return Err(Error::InvalidPath("non-finite coordinate"));
        }

        if let Some(first) = components.iter().find(|cmd| **cmd != PathCmd::Close) {
            if *first != PathCmd::MoveTo {
                return Err(Error::InvalidPath("path must start with a move"));
            }
        }

        let mut path = Self {
            components: Vec::with_capacity(components.len()),
            points: Vec::with_capacity(points.len()),
            ..Self::default()
        };
        let mut i = 0;
        for cmd in components {
            let p = &points[i..i + cmd.arity()];
            match cmd {
                PathCmd::MoveTo => path.move_to(p[0], p[1]),
                PathCmd::LineTo => path.line_to(p[0], p[1]),
                PathCmd::QuadCurveTo => path.quad_curve_to(p[0], p[1], p[2], p[3]),
                PathCmd::CubicCurveTo => path.cubic_curve_to(p[0], p[1], p[2], p[3], p[4], p[5]),
                PathCmd::ArcTo => {
                    // stored arcs are already connected to the point before them
                    let sweep = clamp_sweep(p[5]);
                    let end_angle = p[4] + sweep;
                    path.append_command(PathCmd::ArcTo, &[p[0], p[1], p[2], p[3], p[4], sweep]);
                    path.x = p[0] + end_angle.cos() * p[2];
                    path.y = p[1] + end_angle.sin() * p[3];
                }
                PathCmd::Close => path.close(),
            }
            i += cmd.arity();
        }
        Ok(path)
    }

    #[inline]
    #[must_use]
    pub fn components(&self) -> &[PathCmd] {
        &self.components
    }

    #[inline]
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    #[inline]
    pub fn clear(&mut self) {
        self.components.clear();
        self.points.clear();
        self.x = 0.0;
        self.y = 0.0;
        self.start_x = 0.0;
        self.start_y = 0.0;
    }

    fn append_command(&mut self, cmd: PathCmd, points: &[f64]) {
        debug_assert_eq!(cmd.arity(), points.len());
        self.components.push(cmd);
        self.points.extend_from_slice(points);
    }

    fn ensure_started(&mut self) {
        if self.components.is_empty() {
            self.move_to(0.0, 0.0);
        }
    }

    pub fn append(&mut self, other: &Path) {
        if other.is_empty() {
            return;
        }
        self.components.extend_from_slice(&other.components);
        self.points.extend_from_slice(&other.points);
        self.x = other.x;
        self.y = other.y;
        self.start_x = other.start_x;
        self.start_y = other.start_y;
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        let mut i = 0;
        for cmd in &self.components {
            let arity = match cmd {
                // only the center of an arc is a position
                PathCmd::ArcTo => 2,
                other => other.arity(),
            };
            for point in self.points[i..i + arity].chunks_exact_mut(2) {
                point[0] += dx;
                point[1] += dy;
            }
            i += cmd.arity();
        }
        self.x += dx;
        self.y += dy;
        self.start_x += dx;
        self.start_y += dy;
    }

    #[must_use]
    pub fn vertical_flip(&self) -> Self {
        let mut flipped = self.clone();
        let mut i = 0;
        for cmd in &flipped.components {
            let points = &mut flipped.points[i..i + cmd.arity()];
            if *cmd == PathCmd::ArcTo {
                // Mirroring an arc negates its center and reverses both angles
                points[1] = -points[1];
                points[4] = -points[4];
                points[5] = -points[5];
            } else {
                for point in points.chunks_exact_mut(2) {
                    point[1] = -point[1];
                }
            }
            i += cmd.arity();
        }
        flipped.y = -flipped.y;
        flipped.start_y = -flipped.start_y;
        flipped
    }

    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let mut bounds = BoundsFlattener::default();
        crate::flatten(self, &mut bounds, 1.0);
        bounds.bounds().ok_or(Error::DegeneratePath)
    }

    fn push_arc(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, sweep: f64) {
        let (start_x, start_y) = (cx + start_angle.cos() * rx, cy + start_angle.sin() * ry);
        if self.components.is_empty() {
            self.move_to(start_x, start_y);
        } else {
            self.line_to(start_x, start_y);
        }

        let end_angle = start_angle + sweep;
        self.append_command(PathCmd::ArcTo, &[cx, cy, rx, ry, start_angle, sweep]);
        self.x = cx + end_angle.cos() * rx;
        self.y = cy + end_angle.sin() * ry;
    }
}

// Sweeps past a full turn draw the full ellipse once
#[inline]
fn clamp_sweep(sweep: f64) -> f64 {
    sweep.clamp(-TAU, TAU)
}

#[inline]
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

impl PathBuilder for Path {
    fn move_to(&mut self, x: f64, y: f64) {
        if !all_finite(&[x, y]) {
            log::debug!("Ignoring move to non-finite point ({x}, {y})");
            return;
        }
        self.append_command(PathCmd::MoveTo, &[x, y]);
        self.x = x;
        self.y = y;
        self.start_x = x;
        self.start_y = y;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if !all_finite(&[x, y]) {
            log::debug!("Ignoring line to non-finite point ({x}, {y})");
            return;
        }
        self.ensure_started();
        self.append_command(PathCmd::LineTo, &[x, y]);
        self.x = x;
        self.y = y;
    }

    fn quad_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        if !all_finite(&[cx, cy, x, y]) {
            log::debug!("Ignoring quadratic curve with non-finite coordinates");
            return;
        }
        self.ensure_started();
        self.append_command(PathCmd::QuadCurveTo, &[cx, cy, x, y]);
        self.x = x;
        self.y = y;
    }

    fn cubic_curve_to(&mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64) {
        if !all_finite(&[cx1, cy1, cx2, cy2, x, y]) {
            log::debug!("Ignoring cubic curve with non-finite coordinates");
            return;
        }
        self.ensure_started();
        self.append_command(PathCmd::CubicCurveTo, &[cx1, cy1, cx2, cy2, x, y]);
        self.x = x;
        self.y = y;
    }

    fn arc_to(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, sweep: f64) {
        if !all_finite(&[cx, cy, rx, ry, start_angle, sweep]) {
            log::debug!("Ignoring arc with non-finite parameters");
            return;
        }

        let sweep = clamp_sweep(sweep);
        if rx == 0.0 || ry == 0.0 || sweep == 0.0 {
            // Nothing to sweep, the arc collapses onto its start point
            let (x, y) = (cx + start_angle.cos() * rx, cy + start_angle.sin() * ry);
            if self.components.is_empty() {
                self.move_to(x, y);
            } else {
                self.line_to(x, y);
            }
            return;
        }

        self.push_arc(cx, cy, rx, ry, start_angle, sweep);
    }

    fn close(&mut self) {
        if self.components.is_empty() {
            return;
        }
        self.append_command(PathCmd::Close, &[]);
        self.x = self.start_x;
        self.y = self.start_y;
    }

    #[inline]
    fn last_point(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut i = 0;
        for cmd in &self.components {
            let p = &self.points[i..i + cmd.arity()];
            match cmd {
                PathCmd::MoveTo => writeln!(f, "MoveTo: {:.6}, {:.6}", p[0], p[1])?,
                PathCmd::LineTo => writeln!(f, "LineTo: {:.6}, {:.6}", p[0], p[1])?,
                PathCmd::QuadCurveTo => writeln!(
                    f,
                    "QuadCurveTo: {:.6}, {:.6}, {:.6}, {:.6}",
                    p[0], p[1], p[2], p[3]
                )?,
                PathCmd::CubicCurveTo => writeln!(
                    f,
                    "CubicCurveTo: {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}",
                    p[0], p[1], p[2], p[3], p[4], p[5]
                )?,
                PathCmd::ArcTo => writeln!(
                    f,
                    "ArcTo: {:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {:.6}",
                    p[0], p[1], p[2], p[3], p[4], p[5]
                )?,
                PathCmd::Close => writeln!(f, "Close")?,
            }
            i += cmd.arity();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        std::f64::consts::PI,
        super::*,
    };

    #[test]
    fn drawing_without_move_starts_at_origin() {
        let mut path = Path::new();
        path.line_to(10.0, 5.0);
        assert_eq!(path.components(), &[PathCmd::MoveTo, PathCmd::LineTo]);
        assert_eq!(path.points(), &[0.0, 0.0, 10.0, 5.0]);

        let mut path = Path::new();
        path.cubic_curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 0.0);
        assert_eq!(path.components()[0], PathCmd::MoveTo);
        assert_eq!(path.last_point(), (3.0, 0.0));
    }

    #[test]
    fn copies_are_independent() {
        let mut original = Path::new();
        original.move_to(1.0, 1.0);
        original.line_to(2.0, 2.0);

        let mut copy = original.clone();
        copy.line_to(3.0, 3.0);
        copy.translate(10.0, 10.0);

        assert_eq!(original.components().len(), 2);
        assert_eq!(original.points(), &[1.0, 1.0, 2.0, 2.0]);
        assert_eq!(copy.components().len(), 3);
    }

    #[test]
    fn arc_connects_to_current_point() {
        let mut path = Path::new();
        path.arc_to(50.0, 50.0, 10.0, 10.0, 0.0, PI);
        assert_eq!(path.components(), &[PathCmd::MoveTo, PathCmd::ArcTo]);
        assert_eq!(&path.points()[..2], &[60.0, 50.0]);

        let (x, y) = path.last_point();
        assert!((x - 40.0).abs() < 1e-9 && (y - 50.0).abs() < 1e-9);

        path.arc_to(0.0, 0.0, 5.0, 5.0, 0.0, -PI);
        assert_eq!(path.components()[2], PathCmd::LineTo);
        assert_eq!(path.components()[3], PathCmd::ArcTo);
    }

    #[test]
    fn degenerate_arc_becomes_line() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.arc_to(10.0, 10.0, 0.0, 5.0, 0.0, PI);
        assert_eq!(path.components(), &[PathCmd::MoveTo, PathCmd::LineTo]);
        assert_eq!(path.last_point(), (10.0, 10.0));
    }

    #[test]
    fn sweep_is_limited_to_one_turn() {
        let mut path = Path::new();
        path.arc_to(50.0, 50.0, 40.0, 40.0, 0.0, 1e12);
        assert_eq!(path.points()[7], TAU);
        let (x, y) = path.last_point();
        assert!((x - 90.0).abs() < 1e-9 && (y - 50.0).abs() < 1e-9);

        path.arc_to(50.0, 50.0, 40.0, 40.0, 0.0, -7.0);
        assert_eq!(path.points().last(), Some(&-TAU));

        let rebuilt = Path::from_parts(
            vec![PathCmd::MoveTo, PathCmd::ArcTo],
            vec![90.0, 50.0, 50.0, 50.0, 40.0, 40.0, 0.0, -1e12],
        )
        .unwrap();
        assert_eq!(rebuilt.points()[7], -TAU);
        let (x, _) = rebuilt.last_point();
        assert!((x - 90.0).abs() < 1e-9);
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let mut path = Path::new();
        path.close();
        assert!(path.is_empty());

        path.move_to(5.0, 5.0);
        path.line_to(10.0, 5.0);
        path.line_to(10.0, 10.0);
        path.close();
        assert_eq!(path.last_point(), (5.0, 5.0));
    }

    #[test]
    fn non_finite_input_is_dropped() {
        let mut path = Path::new();
        path.move_to(f64::NAN, 0.0);
        path.line_to(1.0, f64::INFINITY);
        assert!(path.is_empty());
    }

    #[test]
    fn vertical_flip_negates_y() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.quad_curve_to(3.0, 4.0, 5.0, 6.0);
        let flipped = path.vertical_flip();
        assert_eq!(flipped.points(), &[1.0, -2.0, 3.0, -4.0, 5.0, -6.0]);
        assert_eq!(flipped.last_point(), (5.0, -6.0));
        assert_eq!(path.points()[1], 2.0);
    }

    #[test]
    fn vertical_flip_mirrors_arcs() {
        let mut path = Path::new();
        path.arc_to(0.0, 10.0, 10.0, 10.0, 0.0, PI / 2.0);
        let flipped = path.vertical_flip();
        let (bx0, by0, bx1, by1) = flipped.bounds().unwrap();
        assert!((bx0 - 0.0).abs() < 0.5 && (bx1 - 10.0).abs() < 0.5);
        assert!((by0 + 20.0).abs() < 0.5 && (by1 + 10.0).abs() < 0.5);
    }

    #[test]
    fn from_parts_validates_arity() {
        assert_eq!(
            Path::from_parts(vec![PathCmd::MoveTo, PathCmd::LineTo], vec![0.0, 0.0, 1.0]),
            Err(Error::InvalidPath("coordinate count does not match commands"))
        );
        assert!(Path::from_parts(vec![PathCmd::LineTo], vec![1.0, 1.0]).is_err());

        let path = Path::from_parts(
            vec![PathCmd::MoveTo, PathCmd::LineTo, PathCmd::Close],
            vec![0.0, 0.0, 4.0, 4.0],
        )
        .unwrap();
        assert_eq!(path.last_point(), (0.0, 0.0));

        let mut arc = Path::new();
        arc.move_to(0.0, 0.0);
        arc.arc_to(20.0, 0.0, 10.0, 10.0, PI, PI);
        let rebuilt = Path::from_parts(arc.components().to_vec(), arc.points().to_vec()).unwrap();
        assert_eq!(rebuilt, arc);
    }

    #[test]
    fn bounds_of_empty_path_is_an_error() {
        assert_eq!(Path::new().bounds(), Err(Error::DegeneratePath));
    }

    #[test]
    fn display_dumps_commands() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, 4.0);
        path.close();
        assert_eq!(
            path.to_string(),
            "MoveTo: 1.000000, 2.000000\nLineTo: 3.000000, 4.000000\nClose\n"
        );
    }
}
