use {
    crate::{Error, Path, PathBuilder, Result},
    parking_lot::RwLock,
    std::{
        collections::HashMap,
        fmt,
        hash::{Hash, Hasher},
        sync::{Arc, LazyLock},
    },
};

bitflags! {
    #[derive(Default)]
    pub struct FontStyle: u8 {
        const NORMAL = 0;
        const BOLD   = 0x01;
        const ITALIC = 0x02;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FontFamily {
    #[default]
    Sans = 0,
    Serif = 1,
    Mono = 2,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontData {
    pub name: String,
    pub family: FontFamily,
    pub style: FontStyle,
}

impl FontData {
    pub fn new(name: impl Into<String>, family: FontFamily, style: FontStyle) -> Self {
        Self {
            name: name.into(),
            family,
            style,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        let mut file_name = self.name.clone();
        file_name.push(match self.family {
            FontFamily::Sans => 's',
            FontFamily::Serif => 'r',
            FontFamily::Mono => 'm',
        });
        file_name.push(if self.style.contains(FontStyle::BOLD) { 'b' } else { 'r' });
        if self.style.contains(FontStyle::ITALIC) {
            file_name.push('i');
        }
        file_name.push_str(".ttf");
        file_name
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlinePoint {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
}

impl OutlinePoint {
    #[inline]
    pub const fn on(x: f64, y: f64) -> Self {
        Self { x, y, on_curve: true }
    }

    #[inline]
    pub const fn off(x: f64, y: f64) -> Self {
        Self { x, y, on_curve: false }
    }
}

/// A parsed font. Glyph indices are font specific, index 0 is the missing glyph.
pub trait Font: Send + Sync {
    fn units_per_em(&self) -> f64;
    fn index(&self, ch: char) -> u16;
    fn advance_width(&self, index: u16) -> f64;
    fn kern(&self, left: u16, right: u16) -> f64;
    fn outline(&self, index: u16) -> Vec<Vec<OutlinePoint>>;
}

pub trait FontProvider: Send + Sync {
    fn load(&self, font_data: &FontData) -> Result<Arc<dyn Font>>;
}

struct OutlineGlyph {
    advance: f64,
    contours: Vec<Vec<OutlinePoint>>,
}

pub struct OutlineFont {
    units_per_em: f64,
    indices: HashMap<char, u16>,
    glyphs: Vec<OutlineGlyph>,
    kerning: HashMap<(u16, u16), f64>,
}

impl OutlineFont {
    pub fn new(units_per_em: f64, missing_advance: f64) -> Self {
        Self {
            units_per_em,
            indices: HashMap::new(),
            glyphs: vec![OutlineGlyph {
                advance: missing_advance,
                contours: Vec::new(),
            }],
            kerning: HashMap::new(),
        }
    }

    pub fn add_glyph(&mut self, ch: char, advance: f64, contours: Vec<Vec<OutlinePoint>>) -> u16 {
        let index = self.glyphs.len() as u16;
        self.glyphs.push(OutlineGlyph { advance, contours });
        self.indices.insert(ch, index);
        index
    }

    pub fn add_kerning(&mut self, left: char, right: char, adjustment: f64) {
        let (left, right) = (self.index(left), self.index(right));
        self.kerning.insert((left, right), adjustment);
    }
}

impl Font for OutlineFont {
    fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    fn index(&self, ch: char) -> u16 {
        self.indices.get(&ch).copied().unwrap_or(0)
    }

    fn advance_width(&self, index: u16) -> f64 {
        self.glyphs.get(usize::from(index)).map_or(0.0, |glyph| glyph.advance)
    }

    fn kern(&self, left: u16, right: u16) -> f64 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }

    fn outline(&self, index: u16) -> Vec<Vec<OutlinePoint>> {
        self.glyphs
            .get(usize::from(index))
            .map(|glyph| glyph.contours.clone())
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct FontRegistry {
    fonts: RwLock<HashMap<String, Arc<dyn Font>>>,
    fallback: RwLock<Option<Arc<dyn Font>>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, font_data: &FontData, font: Arc<dyn Font>) {
        log::debug!("Registering font {}", font_data.file_name());
        self.fonts.write().insert(font_data.file_name(), font);
    }

    pub fn set_default(&self, font: Arc<dyn Font>) {
        *self.fallback.write() = Some(font);
    }
}

impl FontProvider for FontRegistry {
    fn load(&self, font_data: &FontData) -> Result<Arc<dyn Font>> {
        let file_name = font_data.file_name();
        if let Some(font) = self.fonts.read().get(&file_name) {
            return Ok(Arc::clone(font));
        }
        self.fallback
            .read()
            .clone()
            .ok_or(Error::FontNotFound(file_name))
    }
}

static DEFAULT_REGISTRY: LazyLock<Arc<FontRegistry>> = LazyLock::new(|| {
    log::info!("Initializing default font registry");
    Arc::new(FontRegistry::new())
});

static DEFAULT_GLYPH_CACHE: LazyLock<Arc<GlyphCache>> =
    LazyLock::new(|| Arc::new(GlyphCache::default()));

pub fn default_registry() -> Arc<FontRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

pub fn default_glyph_cache() -> Arc<GlyphCache> {
    Arc::clone(&DEFAULT_GLYPH_CACHE)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub path: Path,
    pub width: f64,
}

/// Identifies one font at one size.
///
/// Fonts are compared by identity, so glyphs drawn with a substitute font are
/// never served once the requested font is available.
#[derive(Clone)]
pub struct GlyphKey {
    font: Arc<dyn Font>,
    // Bits of the font size, sizes are compared exactly
    size: u64,
    dpi: u32,
}

impl GlyphKey {
    pub fn new(font: &Arc<dyn Font>, size: f64, dpi: u32) -> Self {
        Self {
            font: Arc::clone(font),
            size: size.to_bits(),
            dpi,
        }
    }

    fn font_id(&self) -> *const () {
        Arc::as_ptr(&self.font).cast()
    }
}

impl PartialEq for GlyphKey {
    fn eq(&self, other: &Self) -> bool {
        self.font_id() == other.font_id() && self.size == other.size && self.dpi == other.dpi
    }
}

impl Eq for GlyphKey {}

impl Hash for GlyphKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.font_id().hash(state);
        self.size.hash(state);
        self.dpi.hash(state);
    }
}

impl fmt::Debug for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphKey")
            .field("font", &self.font_id())
            .field("size", &f64::from_bits(self.size))
            .field("dpi", &self.dpi)
            .finish()
    }
}

#[derive(Default)]
pub struct GlyphCache {
    glyphs: RwLock<HashMap<GlyphKey, HashMap<char, Glyph>>>,
}

impl GlyphCache {
    pub fn fetch(&self, key: &GlyphKey, ch: char) -> Option<Glyph> {
        self.glyphs.read().get(key).and_then(|glyphs| glyphs.get(&ch)).cloned()
    }

    pub fn insert(&self, key: &GlyphKey, ch: char, glyph: Glyph) -> Glyph {
        self.glyphs
            .write()
            .entry(key.clone())
            .or_default()
            .entry(ch)
            .or_insert(glyph)
            .clone()
    }

    pub fn fetch_or_render(&self, key: &GlyphKey, ch: char, render: impl FnOnce() -> Glyph) -> Glyph {
        match self.fetch(key, ch) {
            Some(glyph) => glyph,
            None => self.insert(key, ch, render()),
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.glyphs.write().clear();
    }
}

/// Append one contour to `path`, scaled by `scale`.
///
/// Off-curve points are quadratic control points, two of them in a row imply
/// an on-curve point halfway between.
pub fn append_contour(path: &mut Path, contour: &[OutlinePoint], scale: f64) {
    let (Some(first), Some(last)) = (contour.first(), contour.last()) else {
        return;
    };

    let midpoint = |a: &OutlinePoint, b: &OutlinePoint| ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let (start, rest) = if first.on_curve {
        ((first.x, first.y), &contour[1..])
    } else if last.on_curve {
        ((last.x, last.y), &contour[..contour.len() - 1])
    } else {
        (midpoint(first, last), contour)
    };

    path.move_to(start.0 * scale, start.1 * scale);
    let mut control: Option<&OutlinePoint> = None;
    for point in rest {
        match (control, point.on_curve) {
            (None, true) => path.line_to(point.x * scale, point.y * scale),
            (Some(c), true) => path.quad_curve_to(c.x * scale, c.y * scale, point.x * scale, point.y * scale),
            (Some(c), false) => {
                let (mx, my) = midpoint(c, point);
                path.quad_curve_to(c.x * scale, c.y * scale, mx * scale, my * scale);
            }
            (None, false) => {}
        }
        control = (!point.on_curve).then_some(point);
    }

    if let Some(c) = control {
        path.quad_curve_to(c.x * scale, c.y * scale, start.0 * scale, start.1 * scale);
    }
    path.close();
}

#[must_use]
pub fn font_scale(font: &dyn Font, font_size: f64, dpi: u32) -> f64 {
    // 26.6 fixed point scale of the em square, divided back into pixels
    let scale = font_size * f64::from(dpi) * (64.0 / 72.0);
    scale / font.units_per_em() / 64.0
}

pub fn render_glyph(font: &dyn Font, ch: char, scale: f64) -> Glyph {
    let index = font.index(ch);
    let mut path = Path::new();
    for contour in font.outline(index) {
        append_contour(&mut path, &contour, scale);
    }
    Glyph {
        path: path.vertical_flip(),
        width: font.advance_width(index) * scale,
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::PathCmd,
        std::thread,
        super::*,
    };

    fn square_font() -> OutlineFont {
        let mut font = OutlineFont::new(1000.0, 500.0);
        font.add_glyph(
            'a',
            600.0,
            vec![vec![
                OutlinePoint::on(0.0, 0.0),
                OutlinePoint::on(500.0, 0.0),
                OutlinePoint::on(500.0, 500.0),
                OutlinePoint::on(0.0, 500.0),
            ]],
        );
        font.add_glyph('b', 700.0, Vec::new());
        font.add_kerning('a', 'b', -50.0);
        font
    }

    #[test]
    fn file_names() {
        let luxi = |family, style| FontData::new("luxi", family, style).file_name();
        assert_eq!(luxi(FontFamily::Mono, FontStyle::BOLD), "luximb.ttf");
        assert_eq!(luxi(FontFamily::Sans, FontStyle::NORMAL), "luxisr.ttf");
        assert_eq!(luxi(FontFamily::Serif, FontStyle::BOLD | FontStyle::ITALIC), "luxirbi.ttf");
        assert_eq!(luxi(FontFamily::Serif, FontStyle::ITALIC), "luxirri.ttf");
    }

    #[test]
    fn outline_font_metrics() {
        let font = square_font();
        assert_eq!(font.index('a'), 1);
        assert_eq!(font.index('?'), 0);
        assert_eq!(font.advance_width(font.index('?')), 500.0);
        assert_eq!(font.kern(1, 2), -50.0);
        assert_eq!(font.kern(2, 1), 0.0);
    }

    #[test]
    fn contour_with_implied_on_curve_points() {
        let mut path = Path::new();
        append_contour(
            &mut path,
            &[
                OutlinePoint::off(0.0, 0.0),
                OutlinePoint::off(10.0, 0.0),
                OutlinePoint::on(10.0, 10.0),
            ],
            1.0,
        );
        assert_eq!(
            path.components(),
            &[
                PathCmd::MoveTo,
                PathCmd::QuadCurveTo,
                PathCmd::QuadCurveTo,
                PathCmd::Close
            ]
        );
        // starts on the last point, the midpoint (5, 0) is implied
        assert_eq!(&path.points()[..2], &[10.0, 10.0]);
        assert_eq!(&path.points()[2..6], &[0.0, 0.0, 5.0, 0.0]);
        assert_eq!(&path.points()[6..10], &[10.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn all_off_curve_contour_starts_between_ends() {
        let mut path = Path::new();
        append_contour(
            &mut path,
            &[
                OutlinePoint::off(0.0, 0.0),
                OutlinePoint::off(10.0, 0.0),
                OutlinePoint::off(10.0, 10.0),
                OutlinePoint::off(0.0, 10.0),
            ],
            2.0,
        );
        assert_eq!(&path.points()[..2], &[0.0, 10.0]);
        assert_eq!(path.components().len(), 6);
        assert_eq!(path.last_point(), (0.0, 10.0));
    }

    #[test]
    fn glyphs_are_scaled_and_flipped() {
        let font = square_font();
        let scale = font_scale(&font, 12.0, 72);
        assert!((scale - 0.012).abs() < 1e-12);

        let glyph = render_glyph(&font, 'a', scale);
        assert!((glyph.width - 7.2).abs() < 1e-9);
        let (x0, y0, x1, y1) = glyph.path.bounds().unwrap();
        assert!((x0 - 0.0).abs() < 1e-9 && (x1 - 6.0).abs() < 1e-9);
        assert!((y0 + 6.0).abs() < 1e-9 && y1.abs() < 1e-9);
    }

    #[test]
    fn registry_falls_back_to_default() {
        let registry = FontRegistry::new();
        let data = FontData::new("luxi", FontFamily::Sans, FontStyle::NORMAL);
        assert_eq!(
            registry.load(&data).err(),
            Some(Error::FontNotFound("luxisr.ttf".to_string()))
        );

        registry.set_default(Arc::new(OutlineFont::new(2048.0, 0.0)));
        assert_eq!(registry.load(&data).unwrap().units_per_em(), 2048.0);

        registry.register(&data, Arc::new(square_font()));
        assert_eq!(registry.load(&data).unwrap().units_per_em(), 1000.0);
    }

    #[test]
    fn cache_returns_independent_copies() {
        let cache = GlyphCache::default();
        let font: Arc<dyn Font> = Arc::new(square_font());
        let key = GlyphKey::new(&font, 10.0, 92);
        let mut glyph = cache.fetch_or_render(&key, 'a', || render_glyph(font.as_ref(), 'a', 0.01));
        glyph.path.translate(100.0, 0.0);

        let cached = cache.fetch(&key, 'a').unwrap();
        assert_ne!(cached.path, glyph.path);
        assert_eq!(cache.len(), 1);
        assert!(cache.fetch(&GlyphKey::new(&font, 11.0, 92), 'a').is_none());
    }

    #[test]
    fn keys_tell_fonts_apart() {
        let (first, second): (Arc<dyn Font>, Arc<dyn Font>) =
            (Arc::new(square_font()), Arc::new(square_font()));
        assert_eq!(GlyphKey::new(&first, 10.0, 92), GlyphKey::new(&Arc::clone(&first), 10.0, 92));
        assert_ne!(GlyphKey::new(&first, 10.0, 92), GlyphKey::new(&second, 10.0, 92));
        assert_ne!(GlyphKey::new(&first, 10.0, 92), GlyphKey::new(&first, 10.0, 72));

        let cache = GlyphCache::default();
        let key = GlyphKey::new(&first, 10.0, 92);
        cache.insert(&key, 'a', render_glyph(first.as_ref(), 'a', 0.01));
        assert!(cache.fetch(&GlyphKey::new(&second, 10.0, 92), 'a').is_none());
    }

    #[test]
    fn concurrent_inserts_keep_one_glyph() {
        let cache = Arc::new(GlyphCache::default());
        let font: Arc<dyn Font> = Arc::new(square_font());
        let key = GlyphKey::new(&font, 10.0, 92);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (cache, font, key) = (Arc::clone(&cache), Arc::clone(&font), key.clone());
                thread::spawn(move || {
                    for ch in ['a', 'b', 'c'] {
                        cache.fetch_or_render(&key, ch, || render_glyph(font.as_ref(), ch, 0.01));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.fetch(&key, 'a').unwrap(), render_glyph(font.as_ref(), 'a', 0.01));
    }
}
