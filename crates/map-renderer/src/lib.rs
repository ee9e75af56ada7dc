//! Static map rendering for regional forecast fields.
//!
//! Draws one derived field over a plate carrée region: shaded cells or
//! iso-lines, optional wind arrows, land/coastline/border context, a
//! labeled marker, the title band and a colorbar, then encodes a PNG.

pub mod arrows;
pub mod basemap;
pub mod contour;
pub mod frame;
pub mod glyphs;
pub mod gradient;
pub mod legend;
pub mod png;
pub mod text;

use std::sync::Arc;
use std::time::Instant;

use forecast_common::{
    ForecastError, ForecastResult, Marker, ParameterSpec, RegionBox, RenderedField, RenderingMode,
};
use image::{Rgba, RgbaImage};
use serde::Serialize;
use tiny_skia::{Color, FillRule, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, warn};

pub use arrows::ArrowStyle;
pub use basemap::{Basemap, Layer};
pub use contour::{contour_levels, ContourStyle, CONTOUR_LEVEL_COUNT};
pub use frame::{Layout, MapFrame};
pub use gradient::ValueScale;
pub use png::PngError;
pub use text::TextRenderer;

/// Default page width in pixels.
pub const DEFAULT_WIDTH: u32 = 1000;
/// Default page height in pixels.
pub const DEFAULT_HEIGHT: u32 = 800;

const TITLE_SIZE: f32 = 17.0;
const COLORBAR_LABEL_SIZE: f32 = 14.0;
const MARKER_LABEL_SIZE: f32 = 14.0;
const MARKER_RADIUS: f32 = 4.0;
const MARKER_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Per-request rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Draw iso-lines over shaded parameters too; no effect on contour maps
    pub contour_overlay: bool,
    /// Draw an arrow at every `arrow_stride`-th grid point
    pub arrow_stride: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            contour_overlay: false,
            arrow_stride: 1,
        }
    }
}

/// An encoded map and what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct MapArtifact {
    #[serde(skip)]
    pub png: Vec<u8>,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub mode: RenderingMode,
    /// Iso-lines drawn
    pub contours: usize,
    /// Wind arrows drawn
    pub arrows: usize,
}

/// Renders maps against a shared basemap and font.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    basemap: Arc<Basemap>,
    text: TextRenderer,
}

impl MapRenderer {
    pub fn new(basemap: Basemap, text: TextRenderer) -> Self {
        Self {
            basemap: Arc::new(basemap),
            text,
        }
    }

    pub fn basemap(&self) -> &Basemap {
        &self.basemap
    }

    pub fn has_font(&self) -> bool {
        self.text.has_font()
    }

    /// Render `field` for `spec` over `region` with the marker and title.
    pub fn render(
        &self,
        field: &RenderedField,
        spec: &ParameterSpec,
        region: &RegionBox,
        marker: &Marker,
        title: &str,
        options: &RenderOptions,
    ) -> ForecastResult<MapArtifact> {
        let start = Instant::now();
        check_field(field)?;

        let mode = spec.rendering_mode;
        let shaded = mode != RenderingMode::Contour;
        let layout = Layout::compute(options.width, options.height, region, shaded).ok_or_else(|| {
            ForecastError::RenderError(format!(
                "page {}x{} is too small for a map",
                options.width, options.height
            ))
        })?;
        let frame = layout.map;

        let mut pixmap = Pixmap::new(options.width, options.height)
            .ok_or_else(|| ForecastError::RenderError("failed to allocate canvas".to_string()))?;
        pixmap.fill(Color::WHITE);
        let clip = map_clip(&layout, options)?;

        basemap::fill_layer(&mut pixmap, &frame, &self.basemap.land, basemap::LAND_COLOR, Some(&clip));

        let range = if shaded {
            let range = ValueScale::resolve(spec.value_range, field);
            if range.is_none() {
                warn!(parameter = %spec.id, "Field has no finite values, drawing an empty map");
            }
            range
        } else {
            None
        };
        if let Some(range) = range {
            gradient::render_raster(&mut pixmap, &frame, field, spec.color_scale, range, Some(&clip));
        }

        let mut contours = 0;
        if mode == RenderingMode::Contour || options.contour_overlay {
            if let Some((min, max)) = field.value_range() {
                let levels = contour_levels(min, max, CONTOUR_LEVEL_COUNT);
                contours = contour::render_contours(
                    &mut pixmap,
                    &frame,
                    field,
                    &levels,
                    &ContourStyle::default(),
                    Some(&clip),
                );
            }
        }

        let mut arrows = 0;
        if mode == RenderingMode::RasterWithVector {
            let style = ArrowStyle {
                stride: options.arrow_stride,
                ..ArrowStyle::default()
            };
            arrows = arrows::render_arrows(&mut pixmap, &frame, field, &style, Some(&clip));
        }

        basemap::stroke_layer(&mut pixmap, &frame, &self.basemap.coastline, &basemap::COASTLINE_STYLE, Some(&clip));
        basemap::stroke_layer(&mut pixmap, &frame, &self.basemap.borders, &basemap::BORDER_STYLE, Some(&clip));

        let (marker_x, marker_y) = frame.project(marker.lat, marker.lon);
        draw_marker(&mut pixmap, marker_x, marker_y, &clip);
        let (label_x, label_y) = frame.project(marker.lat + marker.label_offset, marker.lon + marker.label_offset);
        let label_origin = self.draw_label_box(&mut pixmap, &marker.name, label_x, label_y);

        draw_frame(&mut pixmap, &frame);

        let colorbar_text_x = match (layout.colorbar, range) {
            (Some(rect), Some(range)) => Some(legend::render_colorbar(&mut pixmap, rect, spec.color_scale, range)),
            _ => None,
        };

        let mut img = to_image(&pixmap)?;

        let black = Rgba([0, 0, 0, 255]);
        let title_y = ((layout.title.height() - TITLE_SIZE) / 2.0).max(0.0) as i32;
        self.text.draw_centered(&mut img, title, (options.width / 2) as i32, title_y, TITLE_SIZE, black, true);
        if let (Some(x), Some(rect)) = (colorbar_text_x, layout.colorbar) {
            let center_x = (x + COLORBAR_LABEL_SIZE) as i32;
            let center_y = (rect.top() + rect.height() / 2.0) as i32;
            self.text.draw_vertical(&mut img, spec.label, center_x, center_y, COLORBAR_LABEL_SIZE, black);
        }
        if let Some((x, y)) = label_origin {
            self.text
                .draw_bold(&mut img, &marker.name, x, y, MARKER_LABEL_SIZE, Rgba(MARKER_COLOR));
        }

        let png = png::create_png_auto(img.as_raw(), options.width as usize, options.height as usize, Some(title))
            .map_err(|e| ForecastError::RenderError(e.to_string()))?;

        debug!(
            parameter = %spec.id,
            mode = ?mode,
            contours,
            arrows,
            bytes = png.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered map"
        );

        Ok(MapArtifact {
            png,
            title: title.to_string(),
            width: options.width,
            height: options.height,
            mode,
            contours,
            arrows,
        })
    }

    /// White box with a black edge behind the marker label.
    ///
    /// (x, y) is the label's lower-left anchor. Returns the top-left corner
    /// for the text, or `None` when no font is loaded.
    fn draw_label_box(&self, pixmap: &mut Pixmap, name: &str, x: f32, y: f32) -> Option<(i32, i32)> {
        let (w, h) = self.text.measure(name, MARKER_LABEL_SIZE)?;
        let pad = MARKER_LABEL_SIZE * 0.2;
        let top = y - h as f32;
        let rect = tiny_skia::Rect::from_xywh(x - pad, top - pad, w as f32 + 1.0 + 2.0 * pad, h as f32 + 2.0 * pad)?;
        let path = PathBuilder::from_rect(rect);

        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

        Some((x.round() as i32, top.round() as i32))
    }
}

fn check_field(field: &RenderedField) -> ForecastResult<()> {
    let n = field.width() * field.height();
    if n == 0 {
        return Err(ForecastError::RenderError("field has no grid points".to_string()));
    }
    if field.values.len() != n {
        return Err(ForecastError::RenderError(format!(
            "field holds {} values for a {}x{} grid",
            field.values.len(),
            field.height(),
            field.width()
        )));
    }
    if let Some(vector) = &field.vector {
        if vector.u.len() != n || vector.v.len() != n {
            return Err(ForecastError::RenderError("vector components do not match the grid".to_string()));
        }
    }
    Ok(())
}

fn map_clip(layout: &Layout, options: &RenderOptions) -> ForecastResult<Mask> {
    let mut mask = Mask::new(options.width, options.height)
        .ok_or_else(|| ForecastError::RenderError("failed to allocate clip mask".to_string()))?;
    let path = PathBuilder::from_rect(layout.map.rect);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Ok(mask)
}

fn draw_marker(pixmap: &mut Pixmap, x: f32, y: f32, clip: &Mask) {
    let Some(circle) = PathBuilder::from_circle(x, y, MARKER_RADIUS) else {
        return;
    };
    let mut paint = Paint::default();
    let [r, g, b, a] = MARKER_COLOR;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), Some(clip));
}

fn draw_frame(pixmap: &mut Pixmap, frame: &MapFrame) {
    let path = PathBuilder::from_rect(frame.rect);
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Copy a pixmap into a straight-alpha RGBA image.
fn to_image(pixmap: &Pixmap) -> ForecastResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| ForecastError::RenderError("canvas size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!((options.width, options.height), (1000, 800));
        assert!(!options.contour_overlay);
        assert_eq!(options.arrow_stride, 1);
    }

    #[test]
    fn test_check_field_rejects_empty_and_mismatched() {
        let empty = RenderedField {
            lats: vec![],
            lons: vec![1.0],
            values: vec![],
            vector: None,
        };
        assert!(matches!(check_field(&empty), Err(ForecastError::RenderError(_))));

        let short = RenderedField {
            lats: vec![0.0, 1.0],
            lons: vec![0.0, 1.0],
            values: vec![1.0; 3],
            vector: None,
        };
        assert!(check_field(&short).is_err());
    }

    #[test]
    fn test_to_image_demultiplies() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 128));
        let img = to_image(&pixmap).unwrap();
        let px = img.get_pixel(0, 0);
        assert_eq!(px[3], 128);
        assert!(px[0] >= 254);
    }
}
