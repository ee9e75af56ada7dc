//! Page layout and the plate carrée map frame.

use forecast_common::RegionBox;
use tiny_skia::Rect;

/// Height of the title band at the top of the page.
pub const TITLE_BAND: f32 = 48.0;

/// Width reserved on the right for the colorbar and its labels.
pub const COLORBAR_ZONE: f32 = 120.0;

/// Outer margin around the map panel.
pub const MARGIN: f32 = 20.0;

/// Maps geographic coordinates onto a pixel rectangle.
///
/// Equirectangular: one degree of latitude and one of longitude take the
/// same number of pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub region: RegionBox,
    pub rect: Rect,
}

impl MapFrame {
    pub fn new(region: RegionBox, rect: Rect) -> Self {
        Self { region, rect }
    }

    /// Pixel position of a lat/lon point.
    pub fn project(&self, lat: f64, lon: f64) -> (f32, f32) {
        let fx = (lon - self.region.lon_min) / self.region.lon_span();
        let fy = (self.region.lat_max - lat) / self.region.lat_span();
        (
            self.rect.left() + (fx as f32) * self.rect.width(),
            self.rect.top() + (fy as f32) * self.rect.height(),
        )
    }

    /// Lat/lon of a pixel position.
    pub fn unproject(&self, x: f32, y: f32) -> (f64, f64) {
        let fx = ((x - self.rect.left()) / self.rect.width()) as f64;
        let fy = ((y - self.rect.top()) / self.rect.height()) as f64;
        (
            self.region.lat_max - fy * self.region.lat_span(),
            self.region.lon_min + fx * self.region.lon_span(),
        )
    }

    /// Pixels per degree.
    pub fn scale(&self) -> f32 {
        self.rect.width() / self.region.lon_span() as f32
    }

    pub fn width(&self) -> f32 {
        self.rect.width()
    }
}

/// Where each part of the page goes.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub title: Rect,
    pub map: MapFrame,
    pub colorbar: Option<Rect>,
}

impl Layout {
    /// Fit `region` into a `width` × `height` page, keeping its aspect ratio.
    ///
    /// Returns `None` when the page is too small to hold a map.
    pub fn compute(width: u32, height: u32, region: &RegionBox, with_colorbar: bool) -> Option<Self> {
        let (w, h) = (width as f32, height as f32);
        let title = Rect::from_xywh(0.0, 0.0, w, TITLE_BAND)?;

        let right = if with_colorbar { COLORBAR_ZONE } else { 0.0 };
        let avail_w = w - 2.0 * MARGIN - right;
        let avail_h = h - TITLE_BAND - 2.0 * MARGIN;
        if avail_w < 1.0 || avail_h < 1.0 {
            return None;
        }

        let lon_span = region.lon_span() as f32;
        let lat_span = region.lat_span() as f32;
        let scale = (avail_w / lon_span).min(avail_h / lat_span);
        let map_w = lon_span * scale;
        let map_h = lat_span * scale;
        let left = MARGIN + (avail_w - map_w) / 2.0;
        let top = TITLE_BAND + MARGIN + (avail_h - map_h) / 2.0;
        let map = MapFrame::new(*region, Rect::from_xywh(left, top, map_w, map_h)?);

        // Vertical bar at 80% of the map height, padded off the map's right edge
        let colorbar = if with_colorbar {
            let bar_h = map_h * 0.8;
            let bar_w = (map_w * 0.03).clamp(12.0, 24.0);
            let bar_left = left + map_w + (map_w * 0.03).max(12.0);
            Rect::from_xywh(bar_left, top + (map_h - bar_h) / 2.0, bar_w, bar_h)
        } else {
            None
        };

        Some(Self {
            title,
            map,
            colorbar,
        })
    }
}
