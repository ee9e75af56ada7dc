//! Wind direction arrows drawn from raw u/v components.
//!
//! Arrows start at their grid point and point downwind. Length scales with
//! the component magnitude: `scale` units of speed span the full map width.

use forecast_common::RenderedField;
use tiny_skia::{FillRule, Mask, Paint, PathBuilder, Pixmap, Transform};

use crate::frame::MapFrame;

/// Arrow sizing, relative to the map width.
#[derive(Debug, Clone)]
pub struct ArrowStyle {
    /// Speed units per map width
    pub scale: f32,
    /// Shaft width as a fraction of the map width
    pub shaft_width: f32,
    /// Head width in multiples of the shaft width
    pub head_width: f32,
    /// Head length in multiples of the shaft width
    pub head_length: f32,
    /// Length of the head along the shaft axis, in multiples of the shaft width
    pub head_axis_length: f32,
    pub color: [u8; 4],
    /// Draw every `stride`-th grid point along both axes
    pub stride: usize,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            scale: 500.0,
            shaft_width: 0.002,
            head_width: 3.0,
            head_length: 5.0,
            head_axis_length: 4.5,
            color: [0, 0, 0, 255],
            stride: 1,
        }
    }
}

/// Convert U and V components to speed and the direction the flow points to.
///
/// Direction is in radians, counter-clockwise from east.
pub fn uv_to_speed_direction(u: f32, v: f32) -> (f64, f64) {
    let u = u as f64;
    let v = v as f64;
    ((u * u + v * v).sqrt(), v.atan2(u))
}

/// Arrow length in pixels for a map `map_width` pixels wide.
pub fn arrow_length(u: f32, v: f32, map_width: f32, style: &ArrowStyle) -> f32 {
    let (speed, _) = uv_to_speed_direction(u, v);
    (speed as f32 / style.scale) * map_width
}

/// Outline of one arrow with its tail at (x, y), in pixel space.
///
/// `None` for zero-length or non-finite vectors. Arrows shorter than their
/// head shrink the head with them.
pub fn arrow_polygon(
    x: f32,
    y: f32,
    u: f32,
    v: f32,
    map_width: f32,
    style: &ArrowStyle,
) -> Option<Vec<(f32, f32)>> {
    if !u.is_finite() || !v.is_finite() {
        return None;
    }
    let length = arrow_length(u, v, map_width, style);
    if length <= f32::EPSILON {
        return None;
    }

    let mut shaft = style.shaft_width * map_width;
    let mut head_len = style.head_length * shaft;
    if length < head_len {
        let shrink = length / head_len;
        shaft *= shrink;
        head_len *= shrink;
    }
    let head_axis = head_len * style.head_axis_length / style.head_length;
    let half_head = style.head_width * shaft / 2.0;
    let half_shaft = shaft / 2.0;

    let local = [
        (0.0, -half_shaft),
        (length - head_axis, -half_shaft),
        (length - head_len, -half_head),
        (length, 0.0),
        (length - head_len, half_head),
        (length - head_axis, half_shaft),
        (0.0, half_shaft),
    ];

    // Pixel y grows southward
    let (_, direction) = uv_to_speed_direction(u, v);
    let (sin_a, cos_a) = (-(direction as f32)).sin_cos();
    Some(
        local
            .iter()
            .map(|&(px, py)| (x + px * cos_a - py * sin_a, y + px * sin_a + py * cos_a))
            .collect(),
    )
}

/// Draw arrows for the vector components of `field`.
///
/// Returns the number of arrows drawn.
pub fn render_arrows(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    field: &RenderedField,
    style: &ArrowStyle,
    clip: Option<&Mask>,
) -> usize {
    let Some(vector) = &field.vector else {
        return 0;
    };
    let width = field.width();
    let stride = style.stride.max(1);

    let mut paint = Paint::default();
    let [r, g, b, a] = style.color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let mut drawn = 0;
    for (row, &lat) in field.lats.iter().enumerate().step_by(stride) {
        for (col, &lon) in field.lons.iter().enumerate().step_by(stride) {
            let idx = row * width + col;
            let (Some(&u), Some(&v)) = (vector.u.get(idx), vector.v.get(idx)) else {
                continue;
            };
            let (x, y) = frame.project(lat, lon);
            let Some(outline) = arrow_polygon(x, y, u, v, frame.width(), style) else {
                continue;
            };

            let mut pb = PathBuilder::new();
            pb.move_to(outline[0].0, outline[0].1);
            for &(px, py) in &outline[1..] {
                pb.line_to(px, py);
            }
            pb.close();
            if let Some(path) = pb.finish() {
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), clip);
                drawn += 1;
            }
        }
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_to_speed_direction() {
        let (speed, dir) = uv_to_speed_direction(3.0, 4.0);
        assert!((speed - 5.0).abs() < 1e-9);
        assert!((dir - (4.0f64).atan2(3.0)).abs() < 1e-9);

        let (_, east) = uv_to_speed_direction(1.0, 0.0);
        assert_eq!(east, 0.0);
    }

    #[test]
    fn test_arrow_length_scales_with_map_width() {
        let style = ArrowStyle::default();
        // 5 m/s over a scale of 500 is 1% of the width
        assert!((arrow_length(3.0, 4.0, 1000.0, &style) - 10.0).abs() < 1e-4);
        assert!((arrow_length(3.0, 4.0, 500.0, &style) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_arrow_polygon_points_downwind() {
        let style = ArrowStyle::default();
        // Pure northward flow points up the image
        let outline = arrow_polygon(100.0, 100.0, 0.0, 50.0, 1000.0, &style).unwrap();
        let tip = outline[3];
        assert!((tip.0 - 100.0).abs() < 1e-3);
        assert!((tip.1 - 0.0).abs() < 1e-3);

        // Pure eastward flow points right
        let outline = arrow_polygon(100.0, 100.0, 50.0, 0.0, 1000.0, &style).unwrap();
        assert!((outline[3].0 - 200.0).abs() < 1e-3);
        assert!((outline[3].1 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_arrow_polygon_skips_calm_and_missing() {
        let style = ArrowStyle::default();
        assert!(arrow_polygon(0.0, 0.0, 0.0, 0.0, 1000.0, &style).is_none());
        assert!(arrow_polygon(0.0, 0.0, f32::NAN, 1.0, 1000.0, &style).is_none());
    }

    #[test]
    fn test_short_arrow_shrinks_head() {
        let style = ArrowStyle::default();
        // 1 px arrow, head would be 10 px at full size
        let outline = arrow_polygon(0.0, 0.0, 0.5, 0.0, 1000.0, &style).unwrap();
        assert!(outline.iter().all(|&(x, _)| x >= -1e-4 && x <= 1.0 + 1e-4));
    }
}
