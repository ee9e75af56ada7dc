//! Vertical colorbar legend.

use forecast_common::ColorScale;
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::glyphs::{self, GlyphStyle};
use crate::gradient::{scale_color, ValueScale};

/// Target number of labeled ticks along the bar.
const TARGET_TICKS: usize = 6;

const TICK_LENGTH: f32 = 4.0;
const TICK_LABEL_SIZE: f32 = 10.0;

/// Round tick values covering `[min, max]`, at a 1, 2, 2.5 or 5 step.
pub fn tick_values(min: f32, max: f32, target: usize) -> Vec<f32> {
    if !min.is_finite() || !max.is_finite() || max <= min || target == 0 {
        return vec![];
    }
    let step = nice_step((max - min) as f64 / target as f64);
    let first = (min as f64 / step).ceil() as i64;
    let last = (max as f64 / step + 1e-9).floor() as i64;
    (first..=last).map(|i| (i as f64 * step) as f32).collect()
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Tick text with only as many decimals as the tick spacing needs.
pub fn format_tick(value: f32, ticks: &[f32]) -> String {
    let step = match ticks {
        [a, b, ..] => (b - a).abs(),
        _ => 1.0,
    };
    let mut decimals = 0;
    while decimals < 6 {
        let scaled = step * 10f32.powi(decimals as i32);
        if (scaled - scaled.round()).abs() < 1e-3 {
            break;
        }
        decimals += 1;
    }
    let text = format!("{:.*}", decimals, value);
    // "-0" reads oddly next to "0"
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

/// Draw the colorbar into `rect` and return the x position right of the tick labels.
pub fn render_colorbar(pixmap: &mut Pixmap, rect: Rect, scale: ColorScale, range: ValueScale) -> f32 {
    let mut paint = Paint::default();
    paint.anti_alias = false;

    // One row per pixel, value increasing upward
    let rows = rect.height().ceil().max(1.0) as usize;
    for i in 0..rows {
        let t = 1.0 - (i as f32 + 0.5) / rows as f32;
        let color = scale_color(scale, t);
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        if let Some(row) = Rect::from_xywh(rect.left(), rect.top() + i as f32, rect.width(), 1.0) {
            pixmap.fill_rect(row, &paint, Transform::identity(), None);
        }
    }

    let mut line = Paint::default();
    line.set_color_rgba8(0, 0, 0, 255);
    line.anti_alias = true;
    let stroke = Stroke {
        width: 0.8,
        ..Stroke::default()
    };
    let outline = PathBuilder::from_rect(rect);
    pixmap.stroke_path(&outline, &line, &stroke, Transform::identity(), None);

    let ticks = tick_values(range.min, range.max, TARGET_TICKS);
    let style = GlyphStyle::new(TICK_LABEL_SIZE, [0, 0, 0, 255]);
    let label_x = rect.right() + TICK_LENGTH + 3.0;
    let mut right_edge = label_x;

    for &value in &ticks {
        let y = rect.bottom() - range.normalize(value) * rect.height();
        let mut pb = PathBuilder::new();
        pb.move_to(rect.right(), y);
        pb.line_to(rect.right() + TICK_LENGTH, y);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &line, &stroke, Transform::identity(), None);
        }

        let text = format_tick(value, &ticks);
        glyphs::draw_text_left(pixmap, label_x, y, &text, &style);
        right_edge = right_edge.max(label_x + glyphs::text_width(&text, &style));
    }

    right_edge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_values_fixed_range() {
        assert_eq!(tick_values(0.0, 50.0, 6), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_tick_values_inside_range() {
        let ticks = tick_values(24.3, 31.8, 6);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|&t| (24.3..=31.8).contains(&t)));
        assert_eq!(ticks, vec![26.0, 28.0, 30.0]);
    }

    #[test]
    fn test_tick_values_degenerate() {
        assert!(tick_values(3.0, 3.0, 6).is_empty());
        assert!(tick_values(f32::NAN, 3.0, 6).is_empty());
    }

    #[test]
    fn test_format_tick_decimals() {
        assert_eq!(format_tick(20.0, &[0.0, 10.0]), "20");
        assert_eq!(format_tick(0.5, &[0.0, 0.5]), "0.5");
        assert_eq!(format_tick(0.25, &[0.0, 0.25]), "0.25");
        assert_eq!(format_tick(-0.0, &[0.0, 1.0]), "0");
    }

    #[test]
    fn test_render_colorbar_paints_ramp() {
        let mut pixmap = Pixmap::new(80, 120).unwrap();
        let rect = Rect::from_xywh(10.0, 10.0, 20.0, 100.0).unwrap();
        let range = ValueScale { min: 0.0, max: 50.0 };
        let right = render_colorbar(&mut pixmap, rect, ColorScale::Temperature, range);
        assert!(right > rect.right());

        // Bottom of the bar is the low end of the scale
        let low = scale_color(ColorScale::Temperature, 1.0 - 98.5 / 100.0);
        let px = pixmap.pixel(20, 108).unwrap().demultiply();
        assert_eq!((px.red(), px.green(), px.blue()), (low.r, low.g, low.b));
    }
}
