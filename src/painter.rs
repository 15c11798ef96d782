use {
    crate::{Bitmap, Error, PixelFormat, Result, Span},
    macroquad::color::Color,
};

const M: u32 = 0xffff;

pub trait Painter {
    fn set_color(&mut self, color: Color);

    fn paint(&mut self, spans: &[Span], done: bool);
}

#[must_use]
pub fn premultiplied16(color: Color) -> [u32; 4] {
    let to_u16 = |c: f32| (c.clamp(0.0, 1.0) * 65535.0 + 0.5) as u32;
    let a = to_u16(color.a);
    [
        (to_u16(color.r) * a + M / 2) / M,
        (to_u16(color.g) * a + M / 2) / M,
        (to_u16(color.b) * a + M / 2) / M,
        a,
    ]
}

#[inline]
fn to_u8(v: u32) -> u8 {
    ((v * 255 + 0x7fff) / M) as u8
}

#[inline]
fn over(dst: [u32; 4], color: [u32; 4], ma: u32) -> [u32; 4] {
    let a = M - (color[3] * ma + M / 2) / M;
    [
        (dst[0] * a + color[0] * ma + M / 2) / M,
        (dst[1] * a + color[1] * ma + M / 2) / M,
        (dst[2] * a + color[2] * ma + M / 2) / M,
        (dst[3] * a + color[3] * ma + M / 2) / M,
    ]
}

pub struct RgbaPainter<'a> {
    image: &'a mut Bitmap,
    color: [u32; 4],
}

impl<'a> RgbaPainter<'a> {
    pub fn new(image: &'a mut Bitmap) -> Result<Self> {
        if image.format != PixelFormat::Rgba {
            return Err(Error::UnsupportedImageFormat(image.format));
        }
        Ok(Self {
            image,
            color: [0, 0, 0, M],
        })
    }
}

impl Painter for RgbaPainter<'_> {
    fn set_color(&mut self, color: Color) {
        self.color = premultiplied16(color);
    }

    fn paint(&mut self, spans: &[Span], _done: bool) {
        let (width, height) = (self.image.width, self.image.height);
        for span in spans {
            if span.y >= height {
                continue;
            }
            let x1 = span.x1.min(width);
            let ma = span.alpha.min(M);
            let row = span.y * self.image.stride;

            for x in span.x0..x1 {
                let i = row + x * 4;
                let px = &mut self.image.pix[i..i + 4];
                let dst = [px[0], px[1], px[2], px[3]].map(|c| u32::from(c) * 0x101);
                let out = over(dst, self.color, ma);
                for (channel, value) in px.iter_mut().zip(out) {
                    *channel = to_u8(value);
                }
            }
        }
    }
}

pub struct NrgbaPainter<'a> {
    image: &'a mut Bitmap,
    color: [u32; 4],
}

impl<'a> NrgbaPainter<'a> {
    pub fn new(image: &'a mut Bitmap) -> Result<Self> {
        if image.format != PixelFormat::Nrgba {
            return Err(Error::UnsupportedImageFormat(image.format));
        }
        Ok(Self {
            image,
            color: [0, 0, 0, M],
        })
    }
}

impl Painter for NrgbaPainter<'_> {
    fn set_color(&mut self, color: Color) {
        self.color = premultiplied16(color);
    }

    fn paint(&mut self, spans: &[Span], _done: bool) {
        let (width, height) = (self.image.width, self.image.height);
        for span in spans {
            if span.y >= height {
                continue;
            }
            let x1 = span.x1.min(width);
            let ma = span.alpha.min(M);
            let row = span.y * self.image.stride;

            for x in span.x0..x1 {
                let i = row + x * 4;
                let px = &mut self.image.pix[i..i + 4];

                let da = u32::from(px[3]) * 0x101;
                let dst = [
                    (u32::from(px[0]) * 0x101 * da + M / 2) / M,
                    (u32::from(px[1]) * 0x101 * da + M / 2) / M,
                    (u32::from(px[2]) * 0x101 * da + M / 2) / M,
                    da,
                ];
                let [r, g, b, a] = over(dst, self.color, ma);

                if a == 0 {
                    px.copy_from_slice(&[0, 0, 0, 0]);
                } else {
                    px[0] = to_u8(((r * M + a / 2) / a).min(M));
                    px[1] = to_u8(((g * M + a / 2) / a).min(M));
                    px[2] = to_u8(((b * M + a / 2) / a).min(M));
                    px[3] = to_u8(a);
                }
            }
        }
    }
}

pub enum ImagePainter<'a> {
    Rgba(RgbaPainter<'a>),
    Nrgba(NrgbaPainter<'a>),
}

impl<'a> ImagePainter<'a> {
    pub fn new(image: &'a mut Bitmap) -> Result<Self> {
        match image.format {
            PixelFormat::Rgba => RgbaPainter::new(image).map(Self::Rgba),
            PixelFormat::Nrgba => NrgbaPainter::new(image).map(Self::Nrgba),
            format => Err(Error::UnsupportedImageFormat(format)),
        }
    }
}

impl Painter for ImagePainter<'_> {
    fn set_color(&mut self, color: Color) {
        match self {
            Self::Rgba(painter) => painter.set_color(color),
            Self::Nrgba(painter) => painter.set_color(color),
        }
    }

    fn paint(&mut self, spans: &[Span], done: bool) {
        match self {
            Self::Rgba(painter) => painter.paint(spans, done),
            Self::Nrgba(painter) => painter.paint(spans, done),
        }
    }
}
