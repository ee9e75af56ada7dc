//! Contour line (isoline) rendering using the marching squares algorithm.
//!
//! Lines are traced in grid index space, mapped onto the field's latitude
//! and longitude axes, then projected into the map frame.

use forecast_common::RenderedField;
use tiny_skia::{LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::frame::MapFrame;
use crate::glyphs::{self, GlyphStyle};

/// Number of iso-value lines drawn per map.
pub const CONTOUR_LEVEL_COUNT: usize = 15;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// How contour lines and their labels are drawn.
#[derive(Debug, Clone)]
pub struct ContourStyle {
    /// Line width in pixels
    pub line_width: f32,
    /// Line color [R, G, B, A]
    pub line_color: [u8; 4],
    /// Number of smoothing passes (0 = no smoothing)
    pub smoothing_passes: u32,
    /// Glyph height of the inline labels
    pub label_size: f32,
    /// Minimum spacing between labels on one line, in pixels
    pub label_spacing: f32,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            line_width: 0.8,
            line_color: [0, 0, 0, 255],
            smoothing_passes: 1,
            label_size: 10.0,
            label_spacing: 220.0,
        }
    }
}

/// `count` levels evenly spaced strictly inside `(min, max)`.
///
/// Empty when the range is degenerate or not finite.
pub fn contour_levels(min: f32, max: f32, count: usize) -> Vec<f32> {
    if count == 0 || !min.is_finite() || !max.is_finite() || max <= min {
        return vec![];
    }
    let step = (max - min) as f64 / (count + 1) as f64;
    (1..=count)
        .map(|i| (min as f64 + step * i as f64) as f32)
        .collect()
}

/// Label text of a level: the value truncated toward zero.
pub fn level_label(level: f32) -> String {
    format!("{}", level.trunc() as i64)
}

/// Marching squares algorithm to generate contour segments
///
/// Points are in grid index space: `x` is the column, `y` the row.
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(get_cell_segments(
                cell_index, x as f32, y as f32, tl, tr, br, bl, level,
            ));
        }
    }

    segments
}

/// Line segments for one marching squares cell
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        // Saddles: resolve by the cell-center mean
        5 | 10 => {
            let center_above = (tl + tr + br + bl) / 4.0 >= level;
            if (cell_index == 5) == center_above {
                vec![
                    Segment { start: left, end: bottom },
                    Segment { start: top, end: right },
                ]
            } else {
                vec![
                    Segment { start: left, end: top },
                    Segment { start: right, end: bottom },
                ]
            }
        }
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    val1: f32,
    val2: f32,
    level: f32,
) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Connect unordered segments into continuous polylines.
///
/// Each polyline grows from both ends until no unused segment touches it.
pub fn connect_segments(segments: Vec<Segment>) -> Vec<Contour> {
    const EPSILON: f32 = 0.001;

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = std::collections::VecDeque::from([
            segments[start_idx].start,
            segments[start_idx].end,
        ]);

        let mut changed = true;
        while changed {
            changed = false;
            let (Some(&head), Some(&tail)) = (points.front(), points.back()) else {
                break;
            };

            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if seg.start.distance(&tail) < EPSILON {
                    points.push_back(seg.end);
                } else if seg.end.distance(&tail) < EPSILON {
                    points.push_back(seg.start);
                } else if seg.end.distance(&head) < EPSILON {
                    points.push_front(seg.start);
                } else if seg.start.distance(&head) < EPSILON {
                    points.push_front(seg.end);
                } else {
                    continue;
                }
                used[i] = true;
                changed = true;
                break;
            }
        }

        let points: Vec<Point> = points.into_iter().collect();
        let closed = points.len() > 2 && points[0].distance(&points[points.len() - 1]) < EPSILON;
        contours.push(Contour {
            level: 0.0, // Level will be set by caller
            points,
            closed,
        });
    }

    contours
}

/// Apply Chaikin's corner cutting algorithm for smoothing
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();

    for _ in 0..iterations {
        let mut new_points = Vec::with_capacity(points.len() * 2 + 2);
        if !contour.closed {
            new_points.push(points[0]);
        }

        for i in 0..points.len() {
            let p1 = points[i];
            let p2 = if contour.closed {
                points[(i + 1) % points.len()]
            } else if i + 1 < points.len() {
                points[i + 1]
            } else {
                break;
            };

            new_points.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            new_points.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }

        if !contour.closed {
            if let Some(&last) = points.last() {
                new_points.push(last);
            }
        }
        points = new_points;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Trace every level over the field, in grid index space.
pub fn generate_contours(field: &RenderedField, levels: &[f32], smoothing_passes: u32) -> Vec<Contour> {
    let mut all_contours = Vec::new();

    for &level in levels {
        let segments = march_squares(&field.values, field.width(), field.height(), level);
        for mut contour in connect_segments(segments) {
            contour.level = level;
            all_contours.push(smooth_contour(&contour, smoothing_passes));
        }
    }

    all_contours
}

/// Coordinate at a fractional index along an axis.
fn axis_position(axis: &[f64], index: f32) -> f64 {
    let last = axis.len().saturating_sub(1);
    let i = (index.max(0.0).floor() as usize).min(last);
    let frac = (index as f64 - i as f64).clamp(0.0, 1.0);
    match axis.get(i + 1) {
        Some(next) => axis[i] + (next - axis[i]) * frac,
        None => axis[i],
    }
}

/// Map grid-space contours to pixel positions in `frame`.
pub fn project_contours(contours: &[Contour], field: &RenderedField, frame: &MapFrame) -> Vec<Contour> {
    contours
        .iter()
        .map(|contour| Contour {
            level: contour.level,
            closed: contour.closed,
            points: contour
                .points
                .iter()
                .map(|p| {
                    let lat = axis_position(&field.lats, p.y);
                    let lon = axis_position(&field.lons, p.x);
                    let (x, y) = frame.project(lat, lon);
                    Point::new(x, y)
                })
                .collect(),
        })
        .collect()
}

/// Draw the iso-value lines of `field` with inline labels.
///
/// Returns the number of polylines drawn.
pub fn render_contours(
    pixmap: &mut Pixmap,
    frame: &MapFrame,
    field: &RenderedField,
    levels: &[f32],
    style: &ContourStyle,
    clip: Option<&Mask>,
) -> usize {
    let grid_contours = generate_contours(field, levels, style.smoothing_passes);
    let contours = project_contours(&grid_contours, field, frame);

    let mut paint = Paint::default();
    let [r, g, b, a] = style.line_color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let mut label_positions: Vec<LabelPosition> = Vec::new();
    for contour in &contours {
        if contour.points.len() < 2 {
            continue;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(contour.points[0].x, contour.points[0].y);
        for point in &contour.points[1..] {
            pb.line_to(point.x, point.y);
        }
        if contour.closed {
            pb.close();
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
        }

        collect_label_positions(contour, style, frame, &mut label_positions);
    }

    let glyph_style = GlyphStyle::new(style.label_size, style.line_color)
        .with_background([255, 255, 255, 255]);
    for pos in &label_positions {
        glyphs::draw_text(pixmap, pos.x, pos.y, pos.angle, &pos.text, &glyph_style, clip);
    }

    contours.len()
}

/// Position and text of one inline label
#[derive(Debug, Clone)]
struct LabelPosition {
    x: f32,
    y: f32,
    angle: f32,
    text: String,
}

fn contour_length(contour: &Contour) -> f32 {
    contour
        .points
        .windows(2)
        .map(|w| w[0].distance(&w[1]))
        .sum()
}

/// Place labels evenly along a contour, skipping spots near the frame
/// edge or too close to an earlier label.
fn collect_label_positions(
    contour: &Contour,
    style: &ContourStyle,
    frame: &MapFrame,
    positions: &mut Vec<LabelPosition>,
) {
    let total_length = contour_length(contour);
    let text = level_label(contour.level);
    let glyph_style = GlyphStyle::new(style.label_size, style.line_color);
    if total_length < glyphs::text_width(&text, &glyph_style) * 3.0 {
        return;
    }

    let margin = style.label_size * 1.5;
    let rect = frame.rect;
    let num_labels = ((total_length / style.label_spacing).floor() as usize).max(1);
    let spacing = total_length / (num_labels as f32 + 1.0);
    let min_distance = style.label_size * 4.0;

    let mut accumulated_length = 0.0;
    let mut next_label_at = spacing;
    let mut label_count = 0;

    for pair in contour.points.windows(2) {
        if label_count >= num_labels {
            break;
        }
        let (p1, p2) = (pair[0], pair[1]);
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let segment_length = p1.distance(&p2);

        while accumulated_length + segment_length >= next_label_at && label_count < num_labels {
            let t = if segment_length > 0.0 {
                (next_label_at - accumulated_length) / segment_length
            } else {
                0.0
            };
            let x = p1.x + t * dx;
            let y = p1.y + t * dy;

            let inside = x > rect.left() + margin
                && x < rect.right() - margin
                && y > rect.top() + margin
                && y < rect.bottom() - margin;
            let crowded = positions
                .iter()
                .any(|pos| (pos.x - x).powi(2) + (pos.y - y).powi(2) < min_distance.powi(2));

            if inside && !crowded {
                // Keep text upright
                let angle = dy.atan2(dx);
                let angle = if angle.abs() > std::f32::consts::FRAC_PI_2 {
                    angle + std::f32::consts::PI
                } else {
                    angle
                };
                positions.push(LabelPosition {
                    x,
                    y,
                    angle,
                    text: text.clone(),
                });
            }

            next_label_at += spacing;
            label_count += 1;
        }

        accumulated_length += segment_length;
    }
}
