//! Stroke-drawn numeric glyphs.
//!
//! Contour labels and colorbar ticks only need digits, a sign and a decimal
//! point, so they are drawn as seven-segment style strokes and do not depend
//! on a font file being configured.

use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

/// How a run of glyphs is drawn.
#[derive(Debug, Clone, Copy)]
pub struct GlyphStyle {
    /// Glyph height in pixels
    pub size: f32,
    pub color: [u8; 4],
    /// Fill behind the text, padded by a fifth of the glyph size
    pub background: Option<[u8; 4]>,
}

impl GlyphStyle {
    pub fn new(size: f32, color: [u8; 4]) -> Self {
        Self {
            size,
            color,
            background: None,
        }
    }

    pub fn with_background(mut self, background: [u8; 4]) -> Self {
        self.background = Some(background);
        self
    }

    fn char_width(&self) -> f32 {
        self.size * 0.6
    }

    fn char_spacing(&self) -> f32 {
        self.size * 0.2
    }
}

/// Width of `text` in pixels.
pub fn text_width(text: &str, style: &GlyphStyle) -> f32 {
    let n = text.chars().count() as f32;
    if n == 0.0 {
        return 0.0;
    }
    n * (style.char_width() + style.char_spacing()) - style.char_spacing()
}

/// Draw `text` centered on (x, y), rotated by `angle` radians.
pub fn draw_text(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    angle: f32,
    text: &str,
    style: &GlyphStyle,
    clip: Option<&Mask>,
) {
    let width = text_width(text, style);
    let cos_a = angle.cos();
    let sin_a = angle.sin();
    let rotate = |px: f32, py: f32| -> (f32, f32) {
        (px * cos_a - py * sin_a + x, px * sin_a + py * cos_a + y)
    };

    if let Some(bg) = style.background {
        let pad = style.size * 0.2;
        let half_w = width / 2.0 + pad;
        let half_h = style.size / 2.0 + pad;
        let corners = [
            (-half_w, -half_h),
            (half_w, -half_h),
            (half_w, half_h),
            (-half_w, half_h),
        ];
        let mut pb = PathBuilder::new();
        for (i, (cx, cy)) in corners.iter().enumerate() {
            let (rx, ry) = rotate(*cx, *cy);
            if i == 0 {
                pb.move_to(rx, ry);
            } else {
                pb.line_to(rx, ry);
            }
        }
        pb.close();

        let mut paint = Paint::default();
        paint.set_color_rgba8(bg[0], bg[1], bg[2], bg[3]);
        paint.anti_alias = true;
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), clip);
        }
    }

    let mut paint = Paint::default();
    paint.set_color_rgba8(style.color[0], style.color[1], style.color[2], style.color[3]);
    paint.anti_alias = true;

    let step = style.char_width() + style.char_spacing();
    let start_x = -width / 2.0 + style.char_width() / 2.0;
    for (i, ch) in text.chars().enumerate() {
        let (cx, cy) = rotate(start_x + i as f32 * step, 0.0);
        draw_character(pixmap, cx, cy, angle, ch, style, &paint, clip);
    }
}

/// Draw `text` with its left edge at `x` and its vertical center at `y`.
pub fn draw_text_left(pixmap: &mut Pixmap, x: f32, y: f32, text: &str, style: &GlyphStyle) {
    let width = text_width(text, style);
    draw_text(pixmap, x + width / 2.0, y, 0.0, text, style, None);
}

/// Strokes for one character in a box of half-extents (w, h) around the origin.
fn character_segments(ch: char, w: f32, h: f32) -> Vec<((f32, f32), (f32, f32))> {
    let top = ((-w, -h), (w, -h));
    let middle = ((-w, 0.0), (w, 0.0));
    let bottom = ((-w, h), (w, h));
    let upper_left = ((-w, -h), (-w, 0.0));
    let upper_right = ((w, -h), (w, 0.0));
    let lower_left = ((-w, 0.0), (-w, h));
    let lower_right = ((w, 0.0), (w, h));

    match ch {
        '0' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left],
        '1' => vec![((0.0, -h), (0.0, h)), ((-w * 0.5, -h * 0.6), (0.0, -h))],
        '2' => vec![top, upper_right, middle, lower_left, bottom],
        '3' => vec![top, upper_right, lower_right, bottom, middle],
        '4' => vec![upper_left, middle, upper_right, lower_right],
        '5' => vec![top, upper_left, middle, lower_right, bottom],
        '6' => vec![top, upper_left, lower_left, bottom, lower_right, middle],
        '7' => vec![top, ((w, -h), (0.0, h))],
        '8' => vec![top, upper_right, lower_right, bottom, lower_left, upper_left, middle],
        '9' => vec![middle, upper_right, top, upper_left, lower_right, bottom],
        '-' => vec![middle],
        '.' => vec![((0.0, h * 0.8), (0.0, h))],
        _ => vec![],
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_character(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    angle: f32,
    ch: char,
    style: &GlyphStyle,
    paint: &Paint,
    clip: Option<&Mask>,
) {
    let half_w = style.char_width() / 2.0;
    let half_h = style.size / 2.0;
    let cos_a = angle.cos();
    let sin_a = angle.sin();
    let rotate = |px: f32, py: f32| -> (f32, f32) {
        (px * cos_a - py * sin_a + x, px * sin_a + py * cos_a + y)
    };

    let stroke = Stroke {
        width: (style.size * 0.12).max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for ((x1, y1), (x2, y2)) in character_segments(ch, half_w, half_h) {
        let (rx1, ry1) = rotate(x1, y1);
        let (rx2, ry2) = rotate(x2, y2);

        let mut pb = PathBuilder::new();
        pb.move_to(rx1, ry1);
        pb.line_to(rx2, ry2);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), clip);
        }
    }
}
