//! Shaded (raster) rendering of gridded fields.

use forecast_common::{Color, ColorScale, RenderedField};
use tiny_skia::{Mask, Paint, Pixmap, Rect, Transform};

use crate::frame::MapFrame;

/// The range a color scale is stretched over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f32,
    pub max: f32,
}

impl ValueScale {
    /// Fixed range from the parameter, otherwise the data's own finite range.
    ///
    /// Returns `None` when the field has no finite value and no range is
    /// configured.
    pub fn resolve(fixed: Option<(f32, f32)>, field: &RenderedField) -> Option<Self> {
        let (min, max) = fixed.or_else(|| field.value_range())?;
        Some(Self { min, max })
    }

    /// Position of `value` in `[0, 1]`, clamped.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        let range = if range.abs() < f32::EPSILON { 1.0 } else { range };
        ((value - self.min) / range).clamp(0.0, 1.0)
    }
}

/// Linear color interpolation
fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Color for a normalized position on a scale.
pub fn scale_color(scale: ColorScale, normalized: f32) -> Color {
    let stops = scale.stops();
    let t = normalized.clamp(0.0, 1.0);

    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            return interpolate_color(c0, c1, (t - p0) / (p1 - p0));
        }
    }
    stops.last().map(|s| s.1).unwrap_or_else(Color::transparent)
}

/// Pixel extent of every cell along one axis.
///
/// Each grid point owns the interval between the midpoints to its
/// neighbours; the outer cells extend by half a spacing. A single point owns
/// `fallback`.
pub fn cell_edges(axis: &[f64], fallback: (f64, f64)) -> Vec<(f64, f64)> {
    let n = axis.len();
    if n < 2 {
        return vec![fallback; n];
    }

    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        let lower = if i == 0 {
            axis[0] - (axis[1] - axis[0]) / 2.0
        } else {
            (axis[i - 1] + axis[i]) / 2.0
        };
        let upper = if i == n - 1 {
            axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0
        } else {
            (axis[i] + axis[i + 1]) / 2.0
        };
        edges.push((lower.min(upper), lower.max(upper)));
    }
    edges
}

/// Paint each finite cell of `field` with its scale color.
///
/// Cells holding NaN stay untouched, so whatever lies beneath shows
/// through. Drawing is clipped to `clip`.
pub fn render_raster(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    field: &RenderedField,
    scale: ColorScale,
    range: ValueScale,
    clip: Option<&Mask>,
) {
    let region = frame.region;
    let row_edges = cell_edges(&field.lats, (region.lat_min, region.lat_max));
    let col_edges = cell_edges(&field.lons, (region.lon_min, region.lon_max));
    let width = field.width();

    let mut paint = Paint::default();
    // Adjacent cells share edges; anti-aliasing would leave seams
    paint.anti_alias = false;

    for (row, &(lat_lo, lat_hi)) in row_edges.iter().enumerate() {
        for (col, &(lon_lo, lon_hi)) in col_edges.iter().enumerate() {
            let value = field.values[row * width + col];
            if !value.is_finite() {
                continue;
            }
            let (x0, y0) = frame.project(lat_hi, lon_lo);
            let (x1, y1) = frame.project(lat_lo, lon_hi);
            let Some(rect) = Rect::from_ltrb(x0.floor(), y0.floor(), x1.ceil(), y1.ceil()) else {
                continue;
            };
            let color = scale_color(scale, range.normalize(value));
            paint.set_color_rgba8(color.r, color.g, color.b, color.a);
            pixmap.fill_rect(rect, &paint, Transform::identity(), clip);
        }
    }
}
