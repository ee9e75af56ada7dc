//! Geographic context layers: land fill, coastline and borders.
//!
//! Each layer is loaded from a GeoJSON file (FeatureCollection, Feature or
//! bare geometry). A missing or unreadable file yields an empty layer and a
//! warning, so a map still renders without its basemap.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tiny_skia::{FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};
use tracing::{debug, warn};

use crate::frame::MapFrame;

/// File name of the land polygons layer.
pub const LAND_FILE: &str = "land.geojson";
/// File name of the coastline layer.
pub const COASTLINE_FILE: &str = "coastline.geojson";
/// File name of the administrative borders layer.
pub const BORDERS_FILE: &str = "borders.geojson";

/// A ring or line of (lon, lat) points.
pub type LineString = Vec<(f64, f64)>;

/// A polygon: exterior ring followed by holes.
pub type Polygon = Vec<LineString>;

/// Errors from reading a GeoJSON layer.
#[derive(Debug, Error)]
pub enum BasemapError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON in {path}: {source}")]
    InvalidGeoJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A GeoJSON position. Altitude and any further values are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values[..] {
            [lon, lat, ..] => Ok(Self { lon, lat }),
            _ => Err(format!("position needs lon and lat, got {} value(s)", values.len())),
        }
    }
}

/// Any GeoJSON object a basemap layer may contain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonObject {
    FeatureCollection {
        features: Vec<GeoJsonObject>,
    },
    Feature {
        #[serde(default)]
        geometry: Option<Box<GeoJsonObject>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonObject>,
    },
    Point {},
    MultiPoint {},
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

/// Geometries collected from one GeoJSON document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub polygons: Vec<Polygon>,
    pub lines: Vec<LineString>,
}

impl Layer {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.lines.is_empty()
    }

    /// Parse a GeoJSON document.
    pub fn from_geojson(text: &str) -> Result<Self, serde_json::Error> {
        let object: GeoJsonObject = serde_json::from_str(text)?;
        Ok(Self::from(object))
    }

    /// Read and parse a GeoJSON file.
    pub fn load(path: &Path) -> Result<Self, BasemapError> {
        let text = std::fs::read_to_string(path).map_err(|source| BasemapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geojson(&text).map_err(|source| BasemapError::InvalidGeoJson {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every polygon ring and line as a polyline.
    pub fn outlines(&self) -> impl Iterator<Item = &LineString> {
        self.polygons.iter().flatten().chain(self.lines.iter())
    }

    fn collect(&mut self, object: GeoJsonObject) {
        match object {
            GeoJsonObject::FeatureCollection { features } => {
                for feature in features {
                    self.collect(feature);
                }
            }
            GeoJsonObject::Feature { geometry } => {
                if let Some(geometry) = geometry {
                    self.collect(*geometry);
                }
            }
            GeoJsonObject::GeometryCollection { geometries } => {
                for geometry in geometries {
                    self.collect(geometry);
                }
            }
            GeoJsonObject::Point {} | GeoJsonObject::MultiPoint {} => {}
            GeoJsonObject::LineString { coordinates } => self.lines.push(line(coordinates)),
            GeoJsonObject::MultiLineString { coordinates } => {
                self.lines.extend(coordinates.into_iter().map(line));
            }
            GeoJsonObject::Polygon { coordinates } => self.polygons.push(polygon(coordinates)),
            GeoJsonObject::MultiPolygon { coordinates } => {
                self.polygons.extend(coordinates.into_iter().map(polygon));
            }
        }
    }
}

impl From<GeoJsonObject> for Layer {
    fn from(object: GeoJsonObject) -> Self {
        let mut layer = Layer::default();
        layer.collect(object);
        layer
    }
}

fn line(positions: Vec<Position>) -> LineString {
    positions.into_iter().map(|p| (p.lon, p.lat)).collect()
}

fn polygon(rings: Vec<Vec<Position>>) -> Polygon {
    rings.into_iter().map(line).collect()
}

/// The three context layers of a map.
#[derive(Debug, Clone, Default)]
pub struct Basemap {
    pub land: Layer,
    pub coastline: Layer,
    pub borders: Layer,
}

impl Basemap {
    /// A basemap with no geometry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the layers from `dir`, leaving any unreadable layer empty.
    pub fn load(dir: &Path) -> Self {
        let load_layer = |name: &str| match Layer::load(&dir.join(name)) {
            Ok(layer) => {
                debug!(
                    layer = name,
                    polygons = layer.polygons.len(),
                    lines = layer.lines.len(),
                    "Loaded basemap layer"
                );
                layer
            }
            Err(e) => {
                warn!(layer = name, error = %e, "Basemap layer unavailable, drawing without it");
                Layer::default()
            }
        };

        Self {
            land: load_layer(LAND_FILE),
            coastline: load_layer(COASTLINE_FILE),
            borders: load_layer(BORDERS_FILE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.land.is_empty() && self.coastline.is_empty() && self.borders.is_empty()
    }
}

/// Line style of a context layer.
#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub width: f32,
    pub color: [u8; 4],
    /// Dash and gap lengths in pixels, solid when `None`
    pub dash: Option<(f32, f32)>,
}

pub const LAND_COLOR: [u8; 4] = [211, 211, 211, 255];

pub const COASTLINE_STYLE: LineStyle = LineStyle {
    width: 0.8,
    color: [0, 0, 0, 255],
    dash: None,
};

pub const BORDER_STYLE: LineStyle = LineStyle {
    width: 1.0,
    color: [0, 0, 0, 255],
    dash: Some((1.0, 1.65)),
};

fn build_path(lines: &[&LineString], frame: &MapFrame, close: bool) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for line in lines {
        let mut points = line.iter().map(|&(lon, lat)| frame.project(lat, lon));
        let Some((x, y)) = points.next() else {
            continue;
        };
        pb.move_to(x, y);
        for (x, y) in points {
            pb.line_to(x, y);
        }
        if close {
            pb.close();
        }
    }
    pb.finish()
}

/// Fill the polygons of `layer`, holes included.
pub fn fill_layer(pixmap: &mut Pixmap, frame: &MapFrame, layer: &Layer, color: [u8; 4], clip: Option<&Mask>) {
    let rings: Vec<&LineString> = layer.polygons.iter().flatten().collect();
    let Some(path) = build_path(&rings, frame, true) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), clip);
}

/// Stroke every ring and line of `layer`.
pub fn stroke_layer(pixmap: &mut Pixmap, frame: &MapFrame, layer: &Layer, style: &LineStyle, clip: Option<&Mask>) {
    let outlines: Vec<&LineString> = layer.outlines().collect();
    let Some(path) = build_path(&outlines, frame, false) else {
        return;
    };

    let mut paint = Paint::default();
    let [r, g, b, a] = style.color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: style.dash.and_then(|(on, off)| StrokeDash::new(vec![on, off], 0.0)),
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(doc: serde_json::Value) -> Result<Layer, serde_json::Error> {
        Layer::from_geojson(&doc.to_string())
    }

    #[test]
    fn test_parse_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "LineString", "coordinates": [[106.0, -6.0], [107.0, -6.1]] } },
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[106.0, -6.0], [107.0, -6.0], [107.0, -7.0], [106.0, -6.0]]]] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        });
        let layer = parse(doc).unwrap();
        assert_eq!(layer.lines, vec![vec![(106.0, -6.0), (107.0, -6.1)]]);
        assert_eq!(layer.polygons.len(), 1);
        assert_eq!(layer.polygons[0][0].len(), 4);
        assert_eq!(layer.outlines().count(), 2);
    }

    #[test]
    fn test_parse_bare_geometry_ignores_altitude() {
        let doc = json!({ "type": "MultiLineString", "coordinates": [[[1.0, 2.0, 30.0], [3.0, 4.0]]] });
        let layer = parse(doc).unwrap();
        assert_eq!(layer.lines, vec![vec![(1.0, 2.0), (3.0, 4.0)]]);
    }

    #[test]
    fn test_parse_nested_collections_and_points() {
        let doc = json!({
            "type": "Feature",
            "properties": { "name": "Jakarta Bay" },
            "geometry": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Point", "coordinates": [106.8, -6.1] },
                    { "type": "Polygon", "coordinates": [
                        [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 0.0]],
                        [[0.5, 0.5], [1.0, 0.5], [1.0, 1.0], [0.5, 0.5]]
                    ] }
                ]
            }
        });
        let layer = parse(doc).unwrap();
        assert!(layer.lines.is_empty());
        assert_eq!(layer.polygons.len(), 1);
        assert_eq!(layer.polygons[0].len(), 2);

        let layer = parse(json!({ "type": "Feature", "properties": {} })).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse(json!({ "coordinates": [] })).is_err());
        assert!(parse(json!({ "type": "LineString", "coordinates": [["a", "b"]] })).is_err());
        assert!(parse(json!({ "type": "LineString", "coordinates": [[106.0]] })).is_err());
        assert!(parse(json!({ "type": "LineString" })).is_err());
        assert!(parse(json!({ "type": "Circle", "coordinates": [] })).is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COASTLINE_FILE);
        std::fs::write(&path, r#"{ "type": "LineString", "coordinates": [[1.0]] }"#).unwrap();
        match Layer::load(&path) {
            Err(BasemapError::InvalidGeoJson { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected InvalidGeoJson, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_dir_gives_empty_basemap() {
        let dir = tempfile::tempdir().unwrap();
        let basemap = Basemap::load(&dir.path().join("nowhere"));
        assert!(basemap.is_empty());
    }

    #[test]
    fn test_load_fixture_layers() {
        let dir = test_utils::basemap_dir();
        let basemap = Basemap::load(dir.path());
        assert_eq!(basemap.land.polygons.len(), 1);
        assert_eq!(basemap.coastline.lines.len(), 1);
        assert_eq!(basemap.borders.lines.len(), 1);
    }

    #[test]
    fn test_invalid_layer_is_skipped() {
        let dir = test_utils::basemap_dir();
        std::fs::write(dir.path().join(BORDERS_FILE), "{ not json").unwrap();
        let basemap = Basemap::load(dir.path());
        assert!(basemap.borders.is_empty());
        assert!(!basemap.land.is_empty());
    }
}
