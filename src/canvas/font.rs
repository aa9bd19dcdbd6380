use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use super::raster::blend_at;
use super::CanvasError;

/// A loaded outline font used to draw overlay text.
pub struct GlyphFont {
    font: FontVec,
}

impl std::fmt::Debug for GlyphFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphFont").finish_non_exhaustive()
    }
}

impl GlyphFont {
    pub fn load(path: &Path) -> Result<Self, CanvasError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
            .map_err(|e| CanvasError::Font(format!("{}: {}", path.display(), e)))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CanvasError> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| CanvasError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Advance width of `text` at `size` px, kerning included.
    pub fn line_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    pub fn ascent(&self, size: f32) -> f32 {
        self.font.as_scaled(PxScale::from(size)).ascent()
    }

    /// Greedy word wrap of `text` into lines no wider than `max_width`.
    /// Explicit newlines always break; a single over-long word stays whole.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut current = String::new();
            for word in paragraph.split(' ') {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if !current.is_empty() && self.line_width(&candidate, size) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current = word.to_string();
                } else {
                    current = candidate;
                }
            }
            lines.push(current);
        }
        lines
    }

    /// Draw one line with its origin at `x` and baseline at `baseline`.
    pub fn draw_line(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let mut caret = x;
        let mut prev = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                let alpha = (f32::from(color[3]) * coverage.clamp(0.0, 1.0)).round() as u8;
                if alpha > 0 {
                    blend_at(image, px, py, Rgba([color[0], color[1], color[2], alpha]));
                }
            });
        }
    }
}
