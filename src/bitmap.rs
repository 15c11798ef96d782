use {
    crate::{Error, Result},
    macroquad::texture::Image,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba,
    Nrgba,
    Gray,
    Alpha,
}

impl PixelFormat {
    #[inline]
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba | Self::Nrgba => 4,
            Self::Gray | Self::Alpha => 1,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_paintable(self) -> bool {
        matches!(self, Self::Rgba | Self::Nrgba)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    // Bytes per row
    pub stride: usize,
    pub format: PixelFormat,
    pub pix: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel();
        Self {
            width,
            height,
            stride,
            format,
            pix: vec![0; stride * height],
        }
    }

    pub fn from_raw(width: usize, height: usize, format: PixelFormat, pix: Vec<u8>) -> Result<Self> {
        let stride = width * format.bytes_per_pixel();
        if pix.len() != stride * height {
            return Err(Error::InvalidBitmap(pix.len(), stride * height));
        }
        Ok(Self {
            width,
            height,
            stride,
            format,
            pix,
        })
    }

    pub fn from_image(image: &Image) -> Self {
        Self {
            width: image.width as usize,
            height: image.height as usize,
            stride: image.width as usize * 4,
            format: PixelFormat::Nrgba,
            pix: image.bytes.clone(),
        }
    }

    pub fn to_image(&self) -> Result<Image> {
        let (Ok(width), Ok(height)) = (u16::try_from(self.width), u16::try_from(self.height)) else {
            return Err(Error::ImageTooLarge(self.width, self.height));
        };

        let mut bytes = Vec::with_capacity(self.width * self.height * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                bytes.extend_from_slice(&self.straight(x, y));
            }
        }
        Ok(Image {
            bytes,
            width,
            height,
        })
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * self.format.bytes_per_pixel()
    }

    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.offset(x, y);
        match self.format {
            PixelFormat::Rgba | PixelFormat::Nrgba => {
                [self.pix[i], self.pix[i + 1], self.pix[i + 2], self.pix[i + 3]]
            }
            PixelFormat::Gray | PixelFormat::Alpha => [self.pix[i], 0, 0, 0],
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: [u8; 4]) {
        let i = self.offset(x, y);
        match self.format {
            PixelFormat::Rgba | PixelFormat::Nrgba => self.pix[i..i + 4].copy_from_slice(&value),
            PixelFormat::Gray | PixelFormat::Alpha => self.pix[i] = value[0],
        }
    }

    #[must_use]
    pub fn straight(&self, x: usize, y: usize) -> [u8; 4] {
        let [r, g, b, a] = self.pixel(x, y);
        match self.format {
            PixelFormat::Nrgba => [r, g, b, a],
            PixelFormat::Rgba => {
                if a == 0 {
                    [0, 0, 0, 0]
                } else {
                    let unmultiply = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
                    [unmultiply(r), unmultiply(g), unmultiply(b), a]
                }
            }
            PixelFormat::Gray => [r, r, r, 255],
            PixelFormat::Alpha => [255, 255, 255, r],
        }
    }

    #[must_use]
    pub fn premultiplied(&self, x: usize, y: usize) -> [f64; 4] {
        let [r, g, b, a] = self.pixel(x, y).map(|c| f64::from(c) / 255.0);
        match self.format {
            PixelFormat::Rgba => [r, g, b, a],
            PixelFormat::Nrgba => [r * a, g * a, b * a, a],
            PixelFormat::Gray => [r, r, r, 1.0],
            PixelFormat::Alpha => [r, r, r, r],
        }
    }

    pub fn set_premultiplied(&mut self, x: usize, y: usize, color: [f64; 4]) {
        let to_u8 = |c: f64| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        let [r, g, b, a] = color;
        let value = match self.format {
            PixelFormat::Rgba => [to_u8(r), to_u8(g), to_u8(b), to_u8(a)],
            PixelFormat::Nrgba => {
                if a <= 0.0 {
                    [0, 0, 0, 0]
                } else {
                    [to_u8(r / a), to_u8(g / a), to_u8(b / a), to_u8(a)]
                }
            }
            PixelFormat::Gray => {
                let luma = 0.299 * r + 0.587 * g + 0.114 * b;
                [to_u8(luma), 0, 0, 0]
            }
            PixelFormat::Alpha => [to_u8(a), 0, 0, 0],
        };
        self.set_pixel(x, y, value);
    }
}
