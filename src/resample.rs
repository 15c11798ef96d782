use crate::{Bitmap, Matrix};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageFilter {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

/// Composite `src` over `dest`, `tr` maps source pixels into destination pixels.
///
/// Every destination pixel whose center maps inside the source is sampled
/// there with `filter`. A singular transform draws nothing.
pub fn draw_image(dest: &mut Bitmap, src: &Bitmap, tr: &Matrix, filter: ImageFilter) {
    if src.width == 0 || src.height == 0 {
        return;
    }
    if !tr.is_finite() || tr.determinant().abs() < 1e-12 {
        log::debug!("Skipping image draw through singular transform {tr}");
        return;
    }

    let (x0, y0, x1, y1) = tr.transform_rectangle(0.0, 0.0, src.width as f64, src.height as f64);
    let x_start = x0.floor().max(0.0) as usize;
    let y_start = y0.floor().max(0.0) as usize;
    let x_end = (x1.ceil().max(0.0) as usize).min(dest.width);
    let y_end = (y1.ceil().max(0.0) as usize).min(dest.height);
    log::trace!("Drawing {}x{} image into [{x_start}, {x_end}) x [{y_start}, {y_end})", src.width, src.height);

    let inverse = tr.inverted();
    let (w, h) = (src.width as f64, src.height as f64);
    for y in y_start..y_end {
        for x in x_start..x_end {
            let (u, v) = inverse.transform_point(x as f64 + 0.5, y as f64 + 0.5);
            if u < 0.0 || v < 0.0 || u >= w || v >= h {
                continue;
            }

            let color = match filter {
                ImageFilter::Nearest => src.premultiplied(u as usize, v as usize),
                ImageFilter::Bilinear => bilinear(src, u, v),
                ImageFilter::Bicubic => bicubic(src, u, v),
            };
            if color[3] <= 0.0 {
                continue;
            }

            let dst = dest.premultiplied(x, y);
            let keep = 1.0 - color[3];
            dest.set_premultiplied(
                x,
                y,
                [
                    color[0] + dst[0] * keep,
                    color[1] + dst[1] * keep,
                    color[2] + dst[2] * keep,
                    color[3] + dst[3] * keep,
                ],
            );
        }
    }
}

#[inline]
fn clamped(src: &Bitmap, x: isize, y: isize) -> [f64; 4] {
    let x = x.clamp(0, src.width as isize - 1) as usize;
    let y = y.clamp(0, src.height as isize - 1) as usize;
    src.premultiplied(x, y)
}

fn bilinear(src: &Bitmap, u: f64, v: f64) -> [f64; 4] {
    let (u, v) = (u - 0.5, v - 0.5);
    let (fx, fy) = (u.floor(), v.floor());
    let (tx, ty) = (u - fx, v - fy);
    let (x, y) = (fx as isize, fy as isize);

    let (c00, c10) = (clamped(src, x, y), clamped(src, x + 1, y));
    let (c01, c11) = (clamped(src, x, y + 1), clamped(src, x + 1, y + 1));

    let mut out = [0.0; 4];
    for i in 0..4 {
        let top = c00[i] + (c10[i] - c00[i]) * tx;
        let bottom = c01[i] + (c11[i] - c01[i]) * tx;
        out[i] = top + (bottom - top) * ty;
    }
    out
}

fn catmull_rom(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

fn bicubic(src: &Bitmap, u: f64, v: f64) -> [f64; 4] {
    let (u, v) = (u - 0.5, v - 0.5);
    let (fx, fy) = (u.floor(), v.floor());
    let (wx, wy) = (catmull_rom(u - fx), catmull_rom(v - fy));
    let (x, y) = (fx as isize, fy as isize);

    let mut out = [0.0; 4];
    for (j, wy) in wy.iter().enumerate() {
        for (i, wx) in wx.iter().enumerate() {
            let c = clamped(src, x + i as isize - 1, y + j as isize - 1);
            for k in 0..4 {
                out[k] += c[k] * wx * wy;
            }
        }
    }

    // Cubic overshoot must not leave the premultiplied range
    let a = out[3].clamp(0.0, 1.0);
    [out[0].clamp(0.0, a), out[1].clamp(0.0, a), out[2].clamp(0.0, a), a]
}
