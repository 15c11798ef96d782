// Software canvas for macroquad: paths are flattened, stroked and rasterized on the CPU
// into a Bitmap, which converts to a macroquad Image for upload.

#[macro_use]
extern crate bitflags;

mod bitmap;
pub mod curve;
mod dasher;
mod error;
mod flattener;
mod font;
mod gc;
pub mod kit;
mod matrix;
mod painter;
mod path;
mod raster;
mod resample;
mod stroker;
#[cfg(test)]
mod testing;

pub use {
    bitmap::{Bitmap, PixelFormat},
    dasher::Dasher,
    error::{Error, Result},
    flattener::{
        flatten, flatten_with_tolerance, BoundsFlattener, DemuxFlattener, Flattener, Transformer,
    },
    font::{
        append_contour, default_glyph_cache, default_registry, font_scale, render_glyph, Font,
        FontData, FontFamily, FontProvider, FontRegistry, FontStyle, Glyph, GlyphCache, GlyphKey,
        OutlineFont, OutlinePoint,
    },
    gc::{ContextState, GraphicContext},
    matrix::Matrix,
    painter::{ImagePainter, NrgbaPainter, Painter, RgbaPainter},
    path::{Path, PathBuilder, PathCmd},
    raster::{FillRule, Rasterizer, Span},
    resample::{draw_image, ImageFilter},
    stroker::{LineCap, LineJoin, LineStroker, StrokeBuffers},
};

/// Default maximum squared distance, in pixels, between a curve and its flattening
pub const DEFAULT_FLATNESS: f64 = 0.5;

/// Miter joins longer than this many half widths are drawn as bevels
pub const DEFAULT_MITER_LIMIT: f64 = 10.0;

pub const DEFAULT_DPI: u32 = 92;

/// In points
pub const DEFAULT_FONT_SIZE: f64 = 10.0;

/// Depth of the subdivision stack used to flatten one curve
pub const CURVE_RECURSION_LIMIT: usize = 32;
