use {
    crate::{Bitmap, GraphicContext, LineCap, PathBuilder},
    macroquad::color::Color,
    std::f64::consts::{PI, TAU},
};

pub fn rectangle<P: PathBuilder + ?Sized>(path: &mut P, x1: f64, y1: f64, x2: f64, y2: f64) {
    path.move_to(x1, y1);
    path.line_to(x2, y1);
    path.line_to(x2, y2);
    path.line_to(x1, y2);
    path.close();
}

pub fn rounded_rectangle<P: PathBuilder + ?Sized>(
    path: &mut P,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    arc_width: f64,
    arc_height: f64,
) {
    let (rx, ry) = (arc_width / 2.0, arc_height / 2.0);
    path.move_to(x1, y1 + ry);
    path.quad_curve_to(x1, y1, x1 + rx, y1);
    path.line_to(x2 - rx, y1);
    path.quad_curve_to(x2, y1, x2, y1 + ry);
    path.line_to(x2, y2 - ry);
    path.quad_curve_to(x2, y2, x2 - rx, y2);
    path.line_to(x1 + rx, y2);
    path.quad_curve_to(x1, y2, x1, y2 - ry);
    path.close();
}

pub fn ellipse<P: PathBuilder + ?Sized>(path: &mut P, cx: f64, cy: f64, rx: f64, ry: f64) {
    path.arc_to(cx, cy, rx, ry, 0.0, -TAU);
    path.close();
}

pub fn circle<P: PathBuilder + ?Sized>(path: &mut P, cx: f64, cy: f64, radius: f64) {
    ellipse(path, cx, cy, radius, radius);
}

pub fn droid(gc: &mut GraphicContext, x: f64, y: f64) {
    gc.set_line_cap(LineCap::Round);
    gc.set_line_width(5.0);

    // antennas
    gc.move_to(x + 80.0, y + 70.0);
    gc.line_to(x + 110.0, y + 100.0);
    gc.move_to(x + 180.0, y + 70.0);
    gc.line_to(x + 150.0, y + 100.0);
    gc.stroke(&[]);

    // head
    gc.move_to(x + 180.0, y + 120.0);
    gc.arc_to(x + 130.0, y + 120.0, 50.0, 50.0, 0.0, -PI);
    gc.close();
    gc.fill_stroke(&[]);

    // eyes are holes in the head
    gc.save();
    gc.set_fill_color(gc.stroke_color());
    circle(gc, x + 110.0, y + 95.0, 5.0);
    gc.fill(&[]);
    circle(gc, x + 150.0, y + 95.0, 5.0);
    gc.fill(&[]);
    gc.restore();

    // body
    rounded_rectangle(gc, x + 80.0, y + 130.0, x + 180.0, y + 230.0, 10.0, 10.0);
    gc.fill_stroke(&[]);
    rectangle(gc, x + 80.0, y + 130.0, x + 180.0, y + 150.0);
    gc.fill_stroke(&[]);

    // arms
    rounded_rectangle(gc, x + 50.0, y + 130.0, x + 75.0, y + 210.0, 20.0, 20.0);
    gc.fill_stroke(&[]);
    rounded_rectangle(gc, x + 185.0, y + 130.0, x + 210.0, y + 210.0, 20.0, 20.0);
    gc.fill_stroke(&[]);

    // legs
    rounded_rectangle(gc, x + 97.0, y + 220.0, x + 123.0, y + 275.0, 20.0, 20.0);
    gc.fill_stroke(&[]);
    rounded_rectangle(gc, x + 137.0, y + 220.0, x + 163.0, y + 275.0, 20.0, 20.0);
    gc.fill_stroke(&[]);
}

pub fn bresenham(img: &mut Bitmap, color: Color, x0: i32, y0: i32, x1: i32, y1: i32) {
    // Always walk the same direction so swapped endpoints set the same pixels
    let ((mut x, mut y), (x1, y1)) = if (x0, y0) <= (x1, y1) {
        ((x0, y0), (x1, y1))
    } else {
        ((x1, y1), (x0, y0))
    };

    let a = f64::from(color.a.clamp(0.0, 1.0));
    let value = [
        f64::from(color.r) * a,
        f64::from(color.g) * a,
        f64::from(color.b) * a,
        a,
    ];

    let (dx, dy) = ((x1 - x).abs(), (y1 - y).abs());
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        if x >= 0 && y >= 0 && (x as usize) < img.width && (y as usize) < img.height {
            img.set_premultiplied(x as usize, y as usize, value);
        }
        if x == x1 && y == y1 {
            return;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{Path, PathCmd, PixelFormat},
        std::collections::HashSet,
        super::*,
    };

    fn set_pixels(img: &Bitmap) -> HashSet<(usize, usize)> {
        let mut pixels = HashSet::new();
        for y in 0..img.height {
            for x in 0..img.width {
                if img.pixel(x, y)[3] != 0 {
                    pixels.insert((x, y));
                }
            }
        }
        pixels
    }

    #[test]
    fn rectangle_is_closed() {
        let mut path = Path::new();
        rectangle(&mut path, 1.0, 2.0, 3.0, 4.0);
        assert_eq!(path.components().last(), Some(&PathCmd::Close));
        assert_eq!(path.bounds(), Ok((1.0, 2.0, 3.0, 4.0)));
        assert_eq!(path.last_point(), (1.0, 2.0));
    }

    #[test]
    fn rounded_rectangle_stays_inside() {
        let mut path = Path::new();
        rounded_rectangle(&mut path, 0.0, 0.0, 40.0, 20.0, 10.0, 10.0);
        assert_eq!(
            path.components().iter().filter(|cmd| **cmd == PathCmd::QuadCurveTo).count(),
            4
        );
        let (x0, y0, x1, y1) = path.bounds().unwrap();
        assert!(x0 >= 0.0 && y0 >= 0.0 && x1 <= 40.0 && y1 <= 20.0);
    }

    #[test]
    fn circle_spans_its_radius() {
        let mut path = Path::new();
        circle(&mut path, 50.0, 50.0, 20.0);
        assert_eq!(path.components(), &[PathCmd::MoveTo, PathCmd::ArcTo, PathCmd::Close]);

        let (x0, y0, x1, y1) = path.bounds().unwrap();
        assert!((x0 - 30.0).abs() < 0.5 && (x1 - 70.0).abs() < 1e-9);
        assert!((y0 - 30.0).abs() < 0.5 && (y1 - 70.0).abs() < 0.5);
    }

    #[test]
    fn bresenham_endpoints_and_symmetry() {
        let red = Color::from_rgba(255, 0, 0, 255);
        for (x0, y0, x1, y1) in [(1, 1, 17, 6), (3, 15, 12, 0), (0, 0, 19, 19), (5, 2, 5, 9)] {
            let mut forward = Bitmap::new(20, 20, PixelFormat::Rgba);
            let mut backward = Bitmap::new(20, 20, PixelFormat::Rgba);
            bresenham(&mut forward, red, x0, y0, x1, y1);
            bresenham(&mut backward, red, x1, y1, x0, y0);

            assert_eq!(forward.pixel(x0 as usize, y0 as usize), [255, 0, 0, 255]);
            assert_eq!(forward.pixel(x1 as usize, y1 as usize), [255, 0, 0, 255]);
            assert_eq!(set_pixels(&forward), set_pixels(&backward));
            let (dx, dy) = ((x1 - x0).abs() as usize, (y1 - y0).abs() as usize);
            assert_eq!(set_pixels(&forward).len(), dx.max(dy) + 1);
        }
    }

    #[test]
    fn bresenham_clips_to_the_image() {
        let mut img = Bitmap::new(4, 4, PixelFormat::Nrgba);
        bresenham(&mut img, Color::from_rgba(0, 0, 0, 255), -5, 1, 10, 1);
        assert_eq!(set_pixels(&img).len(), 4);
    }

    #[test]
    fn droid_draws_inside_its_box() {
        let mut image = Bitmap::new(300, 300, PixelFormat::Rgba);
        let mut gc = GraphicContext::new(&mut image).unwrap();
        gc.set_stroke_color(Color::from_rgba(0x44, 0x44, 0x44, 0xff));
        gc.set_fill_color(Color::from_rgba(0xa4, 0xc6, 0x39, 0xff));
        droid(&mut gc, 10.0, 10.0);

        // the body
        assert_eq!(image.pixel(140, 200), [0xa4, 0xc6, 0x39, 0xff]);
        // an eye
        assert_eq!(image.pixel(120, 105), [0x44, 0x44, 0x44, 0xff]);
        assert_eq!(image.pixel(5, 5), [0, 0, 0, 0]);
        assert_eq!(image.pixel(295, 295), [0, 0, 0, 0]);
    }
}
