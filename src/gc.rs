use {
    crate::{
        draw_image, flatten_with_tolerance,
        font::{default_glyph_cache, default_registry, font_scale, render_glyph, GlyphKey},
        Bitmap, Dasher, DemuxFlattener, Error, FillRule, Flattener, Font, FontData, FontProvider,
        GlyphCache, ImageFilter, ImagePainter, LineCap, LineJoin, LineStroker, Matrix, Painter, Path,
        PathBuilder, Rasterizer, Result, Span, StrokeBuffers, Transformer, DEFAULT_DPI,
        DEFAULT_FLATNESS, DEFAULT_FONT_SIZE, DEFAULT_MITER_LIMIT,
    },
    macroquad::color::{Color, BLACK, WHITE},
    std::{mem, sync::Arc},
};

#[derive(Clone)]
pub struct ContextState {
    pub tr: Matrix,
    pub path: Path,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub fill_rule: FillRule,
    pub line_width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dash: Vec<f64>,
    pub dash_offset: f64,
    pub font_data: FontData,
    pub font_size: f64,
    pub dpi: u32,
    pub flatness: f64,
    pub miter_limit: f64,
    // Font resolved for `font_data`
    font: Option<Arc<dyn Font>>,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            tr: Matrix::identity(),
            path: Path::new(),
            stroke_color: BLACK,
            fill_color: WHITE,
            fill_rule: FillRule::EvenOdd,
            line_width: 1.0,
            cap: LineCap::Round,
            join: LineJoin::Round,
            dash: Vec::new(),
            dash_offset: 0.0,
            font_data: FontData::default(),
            font_size: DEFAULT_FONT_SIZE,
            dpi: DEFAULT_DPI,
            flatness: DEFAULT_FLATNESS,
            miter_limit: DEFAULT_MITER_LIMIT,
            font: None,
        }
    }
}

/// Draws paths and text into a borrowed [Bitmap].
pub struct GraphicContext<'a> {
    image: &'a mut Bitmap,
    current: ContextState,
    saved: Vec<ContextState>,
    fill_raster: Rasterizer,
    stroke_raster: Rasterizer,
    stroke_buffers: StrokeBuffers,
    fonts: Arc<dyn FontProvider>,
    glyphs: Arc<GlyphCache>,
}

impl<'a> GraphicContext<'a> {
    pub fn new(image: &'a mut Bitmap) -> Result<Self> {
        Self::with_fonts(image, default_registry(), default_glyph_cache())
    }

    pub fn with_fonts(
        image: &'a mut Bitmap,
        fonts: Arc<dyn FontProvider>,
        glyphs: Arc<GlyphCache>,
    ) -> Result<Self> {
        if !image.format.is_paintable() {
            return Err(Error::UnsupportedImageFormat(image.format));
        }
        let (width, height) = (image.width, image.height);
        log::debug!("Creating {width}x{height} {:?} graphic context", image.format);

        Ok(Self {
            image,
            current: ContextState::default(),
            saved: Vec::new(),
            fill_raster: Rasterizer::new(width, height),
            stroke_raster: Rasterizer::new(width, height),
            stroke_buffers: StrokeBuffers::default(),
            fonts,
            glyphs,
        })
    }

    #[inline]
    pub fn image(&self) -> &Bitmap {
        &*self.image
    }

    #[inline]
    pub fn state(&self) -> &ContextState {
        &self.current
    }

    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(state) => self.current = state,
            None => log::debug!("Restore without a saved state"),
        }
    }

    pub fn begin_path(&mut self) {
        self.current.path.clear();
    }

    pub fn rotate(&mut self, angle: f64) {
        self.current.tr.rotate(angle);
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.current.tr.translate(tx, ty);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.current.tr.scale(sx, sy);
    }

    pub fn set_matrix(&mut self, tr: Matrix) {
        self.current.tr = tr;
    }

    pub fn compose_matrix(&mut self, tr: &Matrix) {
        self.current.tr.compose(tr);
    }

    pub fn get_matrix(&self) -> Matrix {
        self.current.tr
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.current.stroke_color = color;
    }

    pub fn stroke_color(&self) -> Color {
        self.current.stroke_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.current.fill_color = color;
    }

    pub fn fill_color(&self) -> Color {
        self.current.fill_color
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.current.fill_rule = rule;
    }

    pub fn fill_rule(&self) -> FillRule {
        self.current.fill_rule
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.current.line_width = width;
    }

    pub fn line_width(&self) -> f64 {
        self.current.line_width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.current.cap = cap;
    }

    pub fn line_cap(&self) -> LineCap {
        self.current.cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.current.join = join;
    }

    pub fn line_join(&self) -> LineJoin {
        self.current.join
    }

    /// Set the dash pattern, alternating on and off lengths. An empty pattern
    /// draws solid lines.
    pub fn set_line_dash(&mut self, dash: &[f64], offset: f64) -> Result<()> {
        if let Some(len) = dash.iter().find(|len| !(len.is_finite() && **len > 0.0)) {
            return Err(Error::InvalidDashPattern(*len));
        }
        if !offset.is_finite() {
            return Err(Error::InvalidDashPattern(offset));
        }
        self.current.dash = dash.to_vec();
        self.current.dash_offset = offset;
        Ok(())
    }

    pub fn line_dash(&self) -> (&[f64], f64) {
        (&self.current.dash, self.current.dash_offset)
    }

    pub fn set_flatness(&mut self, flatness: f64) {
        if flatness.is_finite() && flatness > 0.0 {
            self.current.flatness = flatness;
        } else {
            log::debug!("Ignoring flatness {flatness}");
        }
    }

    pub fn flatness(&self) -> f64 {
        self.current.flatness
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.current.miter_limit = limit;
    }

    pub fn miter_limit(&self) -> f64 {
        self.current.miter_limit
    }

    pub fn set_font_data(&mut self, font_data: FontData) {
        if font_data != self.current.font_data {
            self.current.font = None;
        }
        self.current.font_data = font_data;
    }

    pub fn font_data(&self) -> &FontData {
        &self.current.font_data
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.current.font_size = size;
    }

    pub fn font_size(&self) -> f64 {
        self.current.font_size
    }

    pub fn set_dpi(&mut self, dpi: u32) {
        self.current.dpi = dpi;
    }

    pub fn dpi(&self) -> u32 {
        self.current.dpi
    }

    fn take_path(&mut self, paths: &[&Path]) -> Path {
        let mut path = mem::take(&mut self.current.path);
        for extra in paths {
            path.append(extra);
        }
        path
    }

    fn recycle_path(&mut self, mut path: Path) {
        path.clear();
        self.current.path = path;
    }

    fn paint(image: &mut Bitmap, raster: &mut Rasterizer, color: Color, rule: FillRule) {
        match ImagePainter::new(image) {
            Ok(mut painter) => {
                painter.set_color(color);
                raster.rasterize(&mut painter, rule);
            }
            Err(err) => {
                log::error!("Cannot paint: {err}");
                raster.reset();
            }
        }
    }

    fn stroker<'r>(
        state: &ContextState,
        raster: &'r mut Rasterizer,
        buffers: StrokeBuffers,
        scale: f64,
    ) -> LineStroker<Transformer<&'r mut Rasterizer>> {
        LineStroker::with_buffers(
            Transformer::new(state.tr, raster),
            state.line_width,
            state.cap,
            state.join,
            buffers,
        )
        .with_miter_limit(state.miter_limit)
        .with_scale(scale)
    }

    pub fn fill(&mut self, paths: &[&Path]) {
        let path = self.take_path(paths);
        let state = &self.current;
        log::trace!("Filling {} commands with {:?}", path.components().len(), state.fill_rule);

        let mut sink = Transformer::new(state.tr, &mut self.fill_raster);
        flatten_with_tolerance(&path, &mut sink, state.tr.get_scale(), state.flatness);

        Self::paint(self.image, &mut self.fill_raster, state.fill_color, state.fill_rule);
        self.recycle_path(path);
    }

    pub fn stroke(&mut self, paths: &[&Path]) {
        let path = self.take_path(paths);
        let state = &self.current;
        let scale = state.tr.get_scale();
        log::trace!("Stroking {} commands, width {}", path.components().len(), state.line_width);

        let buffers = mem::take(&mut self.stroke_buffers);
        let stroker = Self::stroker(state, &mut self.stroke_raster, buffers, scale);
        let mut dasher = Dasher::new(&state.dash, state.dash_offset, stroker);
        flatten_with_tolerance(&path, &mut dasher, scale, state.flatness);
        (_, self.stroke_buffers) = dasher.into_inner().into_parts();

        Self::paint(self.image, &mut self.stroke_raster, state.stroke_color, FillRule::NonZero);
        self.recycle_path(path);
    }

    pub fn fill_stroke(&mut self, paths: &[&Path]) {
        let path = self.take_path(paths);
        let state = &self.current;
        let scale = state.tr.get_scale();
        log::trace!("Filling and stroking {} commands", path.components().len());

        let buffers = mem::take(&mut self.stroke_buffers);
        let mut fill = Transformer::new(state.tr, &mut self.fill_raster);
        let stroker = Self::stroker(state, &mut self.stroke_raster, buffers, scale);
        let mut stroke = Dasher::new(&state.dash, state.dash_offset, stroker);
        {
            let mut sinks: [&mut dyn Flattener; 2] = [&mut fill, &mut stroke];
            let mut demux = DemuxFlattener::new(&mut sinks);
            flatten_with_tolerance(&path, &mut demux, scale, state.flatness);
        }
        (_, self.stroke_buffers) = stroke.into_inner().into_parts();

        Self::paint(self.image, &mut self.fill_raster, state.fill_color, state.fill_rule);
        Self::paint(self.image, &mut self.stroke_raster, state.stroke_color, FillRule::NonZero);
        self.recycle_path(path);
    }

    pub fn clear(&mut self) {
        let (width, height) = (self.image.width as i32, self.image.height as i32);
        self.clear_rect(0, 0, width, height);
    }

    pub fn clear_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let clamp = |v: i32, max: usize| (v.max(0) as usize).min(max);
        let (width, height) = (self.image.width, self.image.height);
        let (x0, x1) = (clamp(x1.min(x2), width), clamp(x1.max(x2), width));
        let (y0, y1) = (clamp(y1.min(y2), height), clamp(y1.max(y2), height));
        if x0 == x1 || y0 == y1 {
            return;
        }

        let color = self.current.fill_color;
        match ImagePainter::new(self.image) {
            Ok(mut painter) => {
                painter.set_color(color);
                let spans: Vec<Span> = (y0..y1)
                    .map(|y| Span { y, x0, x1, alpha: 0xffff })
                    .collect();
                painter.paint(&spans, true);
            }
            Err(err) => log::error!("Cannot clear: {err}"),
        }
    }

    pub fn draw_image(&mut self, src: &Bitmap, filter: ImageFilter) {
        draw_image(self.image, src, &self.current.tr, filter);
    }

    fn load_font(&mut self) -> Result<Arc<dyn Font>> {
        if let Some(font) = &self.current.font {
            return Ok(Arc::clone(font));
        }
        let font = self.fonts.load(&self.current.font_data)?;
        self.current.font = Some(Arc::clone(&font));
        Ok(font)
    }

    fn layout(&mut self, text: &str, mut f: impl FnMut(Path)) -> Result<f64> {
        let font = self.load_font()?;
        let scale = font_scale(font.as_ref(), self.current.font_size, self.current.dpi);
        let key = GlyphKey::new(&font, self.current.font_size, self.current.dpi);

        let mut x = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let index = font.index(ch);
            if let Some(prev) = prev {
                x += font.kern(prev, index) * scale;
            }
            let mut glyph = self
                .glyphs
                .fetch_or_render(&key, ch, || render_glyph(font.as_ref(), ch, scale));
            glyph.path.translate(x, 0.0);
            f(glyph.path);
            x += glyph.width;
            prev = Some(index);
        }
        Ok(x)
    }

    pub fn create_string_path(&mut self, text: &str, x: f64, y: f64) -> f64 {
        let mut outline = Path::new();
        match self.layout(text, |mut glyph| {
            glyph.translate(x, y);
            outline.append(&glyph);
        }) {
            Ok(advance) => {
                self.current.path.append(&outline);
                advance
            }
            Err(err) => {
                log::error!("Cannot lay out {text:?}: {err}");
                0.0
            }
        }
    }

    pub fn fill_string(&mut self, text: &str) -> f64 {
        self.fill_string_at(text, 0.0, 0.0)
    }

    pub fn fill_string_at(&mut self, text: &str, x: f64, y: f64) -> f64 {
        let advance = self.create_string_path(text, x, y);
        self.fill(&[]);
        advance
    }

    pub fn stroke_string(&mut self, text: &str) -> f64 {
        self.stroke_string_at(text, 0.0, 0.0)
    }

    pub fn stroke_string_at(&mut self, text: &str, x: f64, y: f64) -> f64 {
        let advance = self.create_string_path(text, x, y);
        self.stroke(&[]);
        advance
    }

    /// `(left, top, right, bottom)` of `text` drawn at the origin, relative to
    /// the baseline. Empty text or a missing font gives all zeros.
    pub fn get_string_bounds(&mut self, text: &str) -> (f64, f64, f64, f64) {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        let result = self.layout(text, |glyph| {
            let Ok((l, t, r, b)) = glyph.bounds() else {
                return;
            };
            bounds = Some(match bounds {
                None => (l, t, r, b),
                Some((l0, t0, r0, b0)) => (l0.min(l), t0.min(t), r0.max(r), b0.max(b)),
            });
        });
        if let Err(err) = result {
            log::error!("Cannot measure {text:?}: {err}");
        }
        bounds.unwrap_or_default()
    }
}

impl PathBuilder for GraphicContext<'_> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.current.path.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.current.path.line_to(x, y);
    }

    fn quad_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.current.path.quad_curve_to(cx, cy, x, y);
    }

    fn cubic_curve_to(&mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64) {
        self.current.path.cubic_curve_to(cx1, cy1, cx2, cy2, x, y);
    }

    fn arc_to(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, sweep: f64) {
        self.current.path.arc_to(cx, cy, rx, ry, start_angle, sweep);
    }

    fn close(&mut self) {
        self.current.path.close();
    }

    fn last_point(&self) -> (f64, f64) {
        self.current.path.last_point()
    }

    fn is_empty(&self) -> bool {
        self.current.path.is_empty()
    }
}
