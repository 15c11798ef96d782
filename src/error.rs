use {
    crate::PixelFormat,
    thiserror::Error,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unsupported image format {0:?}, expected Rgba or Nrgba")]
    UnsupportedImageFormat(PixelFormat),

    #[error("font not found: {0}")]
    FontNotFound(String),

    #[error("invalid dash length {0}, dash lengths must be finite and positive")]
    InvalidDashPattern(f64),

    #[error("bitmap buffer holds {0} bytes, expected {1}")]
    InvalidBitmap(usize, usize),

    #[error("{0}x{1} bitmap is too large for an image")]
    ImageTooLarge(usize, usize),

    #[error("path has no geometry")]
    DegeneratePath,

    #[error("invalid path: {0}")]
    InvalidPath(&'static str),
}
