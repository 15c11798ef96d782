use crate::{Flattener, CURVE_RECURSION_LIMIT};

// [x1, y1, cx, cy, x2, y2]
pub type QuadCurve = [f64; 6];
pub type CubicCurve = [f64; 8];

#[must_use]
pub fn subdivide_cubic(c: &CubicCurve) -> (CubicCurve, CubicCurve) {
    let [x1, y1, cx1, cy1, cx2, cy2, x2, y2] = *c;

    let (ax, ay) = ((x1 + cx1) / 2.0, (y1 + cy1) / 2.0);
    let (bx, by) = ((cx1 + cx2) / 2.0, (cy1 + cy2) / 2.0);
    let (cx, cy) = ((cx2 + x2) / 2.0, (cy2 + y2) / 2.0);
    let (abx, aby) = ((ax + bx) / 2.0, (ay + by) / 2.0);
    let (bcx, bcy) = ((bx + cx) / 2.0, (by + cy) / 2.0);
    let (mx, my) = ((abx + bcx) / 2.0, (aby + bcy) / 2.0);

    (
        [x1, y1, ax, ay, abx, aby, mx, my],
        [mx, my, bcx, bcy, cx, cy, x2, y2],
    )
}

#[must_use]
pub fn subdivide_quad(c: &QuadCurve) -> (QuadCurve, QuadCurve) {
    let [x1, y1, cx, cy, x2, y2] = *c;

    let (ax, ay) = ((x1 + cx) / 2.0, (y1 + cy) / 2.0);
    let (bx, by) = ((cx + x2) / 2.0, (cy + y2) / 2.0);
    let (mx, my) = ((ax + bx) / 2.0, (ay + by) / 2.0);

    ([x1, y1, ax, ay, mx, my], [mx, my, bx, by, x2, y2])
}

#[must_use]
pub fn cubic_point(c: &CubicCurve, t: f64) -> (f64, f64) {
    let mt = 1.0 - t;
    let (a, b, cc, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
    (
        a * c[0] + b * c[2] + cc * c[4] + d * c[6],
        a * c[1] + b * c[3] + cc * c[5] + d * c[7],
    )
}

/// Flatten a cubic into `line_to` calls.
///
/// `tolerance` bounds the squared distance between the curve and its chords.
/// The start point is assumed to be the current point of `flattener`.
pub fn trace_cubic<F: Flattener + ?Sized>(flattener: &mut F, curve: &CubicCurve, tolerance: f64) {
    let mut stack = [[0.0; 8]; CURVE_RECURSION_LIMIT];
    stack[0] = *curve;
    let mut top = 0usize;

    loop {
        let c = stack[top];
        let (dx, dy) = (c[6] - c[0], c[7] - c[1]);
        let d2 = ((c[2] - c[6]) * dy - (c[3] - c[7]) * dx).abs();
        let d3 = ((c[4] - c[6]) * dy - (c[5] - c[7]) * dx).abs();

        if (d2 + d3) * (d2 + d3) <= tolerance * (dx * dx + dy * dy)
            || top == CURVE_RECURSION_LIMIT - 1
        {
            flattener.line_to(c[6], c[7]);
            if top == 0 {
                return;
            }
            top -= 1;
        } else {
            // left half on top, processed first
            let (left, right) = subdivide_cubic(&c);
            stack[top] = right;
            stack[top + 1] = left;
            top += 1;
        }
    }
}

pub fn trace_quad<F: Flattener + ?Sized>(flattener: &mut F, curve: &QuadCurve, tolerance: f64) {
    let mut stack = [[0.0; 6]; CURVE_RECURSION_LIMIT];
    stack[0] = *curve;
    let mut top = 0usize;

    loop {
        let c = stack[top];
        let (dx, dy) = (c[4] - c[0], c[5] - c[1]);
        let d = ((c[2] - c[4]) * dy - (c[3] - c[5]) * dx).abs();

        if d * d <= tolerance * (dx * dx + dy * dy) || top == CURVE_RECURSION_LIMIT - 1 {
            flattener.line_to(c[4], c[5]);
            if top == 0 {
                return;
            }
            top -= 1;
        } else {
            let (left, right) = subdivide_quad(&c);
            stack[top] = right;
            stack[top + 1] = left;
            top += 1;
        }
    }
}

// Most segments a single arc is flattened into
const ARC_SEGMENT_LIMIT: f64 = 65536.0;

#[must_use]
pub fn arc_step(rx: f64, ry: f64, scale: f64) -> f64 {
    let ra = (rx.abs() + ry.abs()) / 2.0;
    2.0 * (ra / (ra + 0.125 / scale)).acos()
}

#[allow(clippy::too_many_arguments)]
pub fn trace_arc<F: Flattener + ?Sized>(
    flattener: &mut F,
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
    start: f64,
    sweep: f64,
    scale: f64,
) -> (f64, f64) {
    let end = start + sweep;
    let end_point = (x + end.cos() * rx, y + end.sin() * ry);
    let clockwise = sweep >= 0.0;

    let mut da = arc_step(rx, ry, scale).max(sweep.abs() / ARC_SEGMENT_LIMIT);
    if da.is_finite() && da > 0.0 {
        if !clockwise {
            da = -da;
        }
        let mut angle = start + da;
        while (angle < end - da / 4.0) == clockwise {
            flattener.line_to(x + angle.cos() * rx, y + angle.sin() * ry);
            angle += da;
        }
    }

    flattener.line_to(end_point.0, end_point.1);
    end_point
}
