//! Drawing surface for page annotations.
//!
//! A [`Surface`] holds a backdrop image scaled to a fixed footprint plus any
//! number of text overlays, and can flatten the whole composition into a PNG.
//! [`RasterCanvas`] is the in-memory implementation backed by the `image`
//! crate.

mod font;
mod raster;

pub use font::GlyphFont;
pub use raster::{downsample, RasterCanvas};

use std::sync::Arc;

use image::{DynamicImage, Rgba};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;

/// Canvas footprint in pixels. Backdrops are stretched to exactly this size.
pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 700;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.16;

/// Errors raised by the drawing surface.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Horizontal alignment of overlay text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Visual style of a text overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub fill: Rgba<u8>,
    pub background: Rgba<u8>,
    pub align: TextAlign,
}

impl Default for TextStyle {
    /// Black 20px text, centered, on 80% opaque yellow.
    fn default() -> Self {
        Self {
            font_size: 20.0,
            fill: Rgba([0, 0, 0, 255]),
            background: Rgba([255, 255, 0, 204]),
            align: TextAlign::Center,
        }
    }
}

/// An editable text box placed over the backdrop.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub style: TextStyle,
}

impl Default for TextOverlay {
    fn default() -> Self {
        Self {
            text: "Edit me".to_string(),
            left: 50,
            top: 50,
            width: 200,
            style: TextStyle::default(),
        }
    }
}

impl TextOverlay {
    pub fn new(text: impl Into<String>, left: i32, top: i32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            ..Default::default()
        }
    }

    /// Parse `label@x,y`, as given on the command line. The label may itself
    /// contain `@`; the last one separates the position.
    pub fn parse_placement(spec: &str) -> Option<Self> {
        let (label, position) = spec.rsplit_once('@')?;
        let (x, y) = position.split_once(',')?;
        let left = x.trim().parse().ok()?;
        let top = y.trim().parse().ok()?;
        if label.is_empty() {
            return None;
        }
        Some(Self::new(label.replace("\\n", "\n"), left, top))
    }

    /// Height of one rendered line in pixels.
    pub fn line_px(&self) -> f32 {
        self.style.font_size * LINE_HEIGHT
    }

    /// Box height for `lines` lines of text.
    pub fn height_for(&self, lines: usize) -> u32 {
        (self.line_px() * lines.max(1) as f32).ceil() as u32
    }

    /// Box height counting explicit line breaks only.
    pub fn height(&self) -> u32 {
        self.height_for(self.text.split('\n').count())
    }

    /// Move by a delta, keeping the box's origin on the canvas.
    pub fn nudge(&mut self, dx: i32, dy: i32, bounds: (u32, u32)) {
        let max_left = bounds.0.saturating_sub(1) as i32;
        let max_top = bounds.1.saturating_sub(1) as i32;
        self.left = (self.left + dx).clamp(0, max_left);
        self.top = (self.top + dy).clamp(0, max_top);
    }
}

/// Load the configured annotation font, or the first system font found.
pub fn load_font(settings: &Settings) -> Option<Arc<GlyphFont>> {
    let Some(path) = settings.resolve_font() else {
        warn!("No annotation font configured or found; text will not be drawn");
        return None;
    };
    match GlyphFont::load(&path) {
        Ok(font) => {
            info!("Using font {}", path.display());
            Some(Arc::new(font))
        }
        Err(e) => {
            warn!("Could not load font {}: {}", path.display(), e);
            None
        }
    }
}

/// Operations an annotation surface provides.
pub trait Surface {
    /// Footprint as `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Place an image as backdrop, scaled per axis to fill the footprint.
    fn set_backdrop(&mut self, image: &DynamicImage);

    /// Add a text overlay, returning its index.
    fn add_text(&mut self, overlay: TextOverlay) -> usize;

    fn overlays(&self) -> &[TextOverlay];

    fn overlay_mut(&mut self, index: usize) -> Option<&mut TextOverlay>;

    /// Remove every overlay. The backdrop stays.
    fn clear_overlays(&mut self);

    /// Flatten backdrop and overlays into PNG bytes.
    fn rasterize(&self) -> Result<Vec<u8>, CanvasError>;

    /// Decode encoded image bytes and use them as backdrop.
    fn set_backdrop_bytes(&mut self, bytes: &[u8]) -> Result<(), CanvasError> {
        let image = image::load_from_memory(bytes)?;
        self.set_backdrop(&image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overlay() {
        let overlay = TextOverlay::default();
        assert_eq!(overlay.text, "Edit me");
        assert_eq!((overlay.left, overlay.top, overlay.width), (50, 50, 200));
        assert_eq!(overlay.style.align, TextAlign::Center);
        assert_eq!(overlay.height(), 24);
    }

    #[test]
    fn test_height_counts_lines() {
        let overlay = TextOverlay::new("one\ntwo\nthree", 0, 0);
        assert_eq!(overlay.height(), 70);
    }

    #[test]
    fn test_parse_placement() {
        let overlay = TextOverlay::parse_placement("a@b.c@10, 20").unwrap();
        assert_eq!(overlay.text, "a@b.c");
        assert_eq!((overlay.left, overlay.top), (10, 20));
        assert_eq!(overlay.width, 200);

        let overlay = TextOverlay::parse_placement("two\\nlines@0,0").unwrap();
        assert_eq!(overlay.text, "two\nlines");

        assert!(TextOverlay::parse_placement("no position").is_none());
        assert!(TextOverlay::parse_placement("@1,2").is_none());
        assert!(TextOverlay::parse_placement("x@1").is_none());
    }

    #[test]
    fn test_nudge_clamps_to_canvas() {
        let mut overlay = TextOverlay::default();
        overlay.nudge(-100, 10, (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!((overlay.left, overlay.top), (0, 60));
        overlay.nudge(10_000, 10_000, (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!((overlay.left, overlay.top), (399, 699));
    }
}
