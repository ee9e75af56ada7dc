//! Font text for the title, colorbar label and marker label.

use std::path::Path;

use forecast_common::{ForecastError, ForecastResult};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::info;

/// Draws text with an optional TrueType font.
///
/// Without a font every draw call is a no-op, so maps still render on hosts
/// that have not configured one.
#[derive(Clone, Default)]
pub struct TextRenderer {
    font: Option<Font<'static>>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    /// A renderer that draws no text.
    pub fn none() -> Self {
        Self { font: None }
    }

    pub fn from_bytes(data: Vec<u8>) -> ForecastResult<Self> {
        let font = Font::try_from_vec(data)
            .ok_or_else(|| ForecastError::Configuration("font data is not a valid TrueType font".to_string()))?;
        Ok(Self { font: Some(font) })
    }

    /// Load a TrueType font file.
    pub fn from_file(path: &Path) -> ForecastResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            ForecastError::Configuration(format!("failed to read font {}: {}", path.display(), e))
        })?;
        let renderer = Self::from_bytes(data)?;
        info!(path = %path.display(), "Loaded title font");
        Ok(renderer)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered width and height of `text` in pixels.
    pub fn measure(&self, text: &str, size: f32) -> Option<(u32, u32)> {
        let font = self.font.as_ref()?;
        let (w, h) = text_size(Scale::uniform(size), font, text);
        Some((w.max(0) as u32, h.max(0) as u32))
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn draw(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) -> bool {
        let Some(font) = &self.font else {
            return false;
        };
        draw_text_mut(img, color, x, y, Scale::uniform(size), font, text);
        true
    }

    /// Draw `text` twice, one pixel apart, for a heavier stroke.
    pub fn draw_bold(&self, img: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba<u8>) -> bool {
        self.draw(img, text, x, y, size, color) && self.draw(img, text, x + 1, y, size, color)
    }

    /// Draw `text` centered horizontally on `center_x`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_centered(
        &self,
        img: &mut RgbaImage,
        text: &str,
        center_x: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
        bold: bool,
    ) -> bool {
        let Some((w, _)) = self.measure(text, size) else {
            return false;
        };
        let x = center_x - w as i32 / 2;
        if bold {
            self.draw_bold(img, text, x, y, size, color)
        } else {
            self.draw(img, text, x, y, size, color)
        }
    }

    /// Draw `text` reading bottom to top, centered on (center_x, center_y).
    pub fn draw_vertical(
        &self,
        img: &mut RgbaImage,
        text: &str,
        center_x: i32,
        center_y: i32,
        size: f32,
        color: Rgba<u8>,
    ) -> bool {
        let Some((w, h)) = self.measure(text, size) else {
            return false;
        };
        let (w, h) = (w.max(1) + 2, h.max(1) + 2);
        let mut strip = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
        self.draw(&mut strip, text, 1, 1, size, color);

        let rotated = imageops::rotate270(&strip);
        let x = center_x as i64 - rotated.width() as i64 / 2;
        let y = center_y as i64 - rotated.height() as i64 / 2;
        imageops::overlay(img, &rotated, x, y);
        true
    }
}
