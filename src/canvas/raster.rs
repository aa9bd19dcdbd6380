//! In-memory raster implementation of [`Surface`].

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use tracing::{debug, warn};

use super::font::GlyphFont;
use super::{CanvasError, Surface, TextAlign, TextOverlay, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Backdrop plus overlays, composed on demand.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    backdrop: Option<RgbaImage>,
    overlays: Vec<TextOverlay>,
    font: Option<Arc<GlyphFont>>,
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            backdrop: None,
            overlays: Vec::new(),
            font: None,
        }
    }

    /// Use `font` for overlay text. Without one only the text boxes are drawn.
    pub fn with_font(mut self, font: Arc<GlyphFont>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_backdrop(&self) -> bool {
        self.backdrop.is_some()
    }

    /// The page image as stretched onto the canvas, without overlays.
    pub fn backdrop(&self) -> Option<&RgbaImage> {
        self.backdrop.as_ref()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Lines an overlay renders as, wrapped to its width when a font is loaded.
    fn layout(&self, overlay: &TextOverlay) -> Vec<String> {
        match self.font {
            Some(ref font) => {
                font.wrap(&overlay.text, overlay.style.font_size, overlay.width as f32)
            }
            None => overlay.text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Compose backdrop and overlays into a fresh image.
    pub fn compose(&self) -> RgbaImage {
        let mut image = match self.backdrop {
            Some(ref backdrop) => backdrop.clone(),
            None => RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 0])),
        };

        if self.font.is_none() && !self.overlays.is_empty() {
            warn!("No font loaded; annotation text boxes are drawn without text");
        }

        for overlay in &self.overlays {
            self.draw_overlay(&mut image, overlay);
        }
        image
    }

    fn draw_overlay(&self, image: &mut RgbaImage, overlay: &TextOverlay) {
        let lines = self.layout(overlay);
        let box_height = overlay.height_for(lines.len());
        fill_rect(
            image,
            i64::from(overlay.left),
            i64::from(overlay.top),
            overlay.width,
            box_height,
            overlay.style.background,
        );

        let Some(ref font) = self.font else {
            return;
        };
        let size = overlay.style.font_size;
        let line_px = overlay.line_px();
        // Center the glyph ascent within each line box.
        let lead = (line_px - size) / 2.0;
        let ascent = font.ascent(size);

        for (i, line) in lines.iter().enumerate() {
            let line_width = font.line_width(line, size);
            let slack = (overlay.width as f32 - line_width).max(0.0);
            let x = overlay.left as f32
                + match overlay.style.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => slack / 2.0,
                    TextAlign::Right => slack,
                };
            let baseline = overlay.top as f32 + i as f32 * line_px + lead + ascent;
            font.draw_line(image, line, x, baseline, size, overlay.style.fill);
        }
    }
}

impl Surface for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_backdrop(&mut self, image: &DynamicImage) {
        debug!(
            "Backdrop {}x{} stretched to {}x{}",
            image.width(),
            image.height(),
            self.width,
            self.height
        );
        self.backdrop = Some(imageops::resize(
            image,
            self.width,
            self.height,
            FilterType::Triangle,
        ));
    }

    fn add_text(&mut self, overlay: TextOverlay) -> usize {
        self.overlays.push(overlay);
        self.overlays.len() - 1
    }

    fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    fn overlay_mut(&mut self, index: usize) -> Option<&mut TextOverlay> {
        self.overlays.get_mut(index)
    }

    fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    fn rasterize(&self) -> Result<Vec<u8>, CanvasError> {
        let image = self.compose();
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        debug!("Rasterized canvas to {} PNG bytes", bytes.len());
        Ok(bytes)
    }
}

/// Alpha-blend `color` onto the pixel at `(x, y)` if it lies on the image.
pub(crate) fn blend_at(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        return;
    }
    image.get_pixel_mut(x as u32, y as u32).blend(&color);
}

fn fill_rect(image: &mut RgbaImage, left: i64, top: i64, width: u32, height: u32, color: Rgba<u8>) {
    for y in top..top + i64::from(height) {
        for x in left..left + i64::from(width) {
            blend_at(image, x, y, color);
        }
    }
}

/// Sample `image` on a `cols` x `rows` grid, one pixel from the center of
/// each cell, row-major from the top left.
pub fn downsample(image: &RgbaImage, cols: u32, rows: u32) -> Vec<(u32, u32, Rgba<u8>)> {
    let (width, height) = image.dimensions();
    if cols == 0 || rows == 0 || width == 0 || height == 0 {
        return Vec::new();
    }
    let mut samples = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        let y = ((2 * row + 1) * height / (2 * rows)).min(height - 1);
        for col in 0..cols {
            let x = ((2 * col + 1) * width / (2 * cols)).min(width - 1);
            samples.push((col, row, *image.get_pixel(x, y)));
        }
    }
    samples
}
