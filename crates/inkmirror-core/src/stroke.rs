//! Stroke data model.

use crate::outline::{self, OutlineOptions};
use crate::path::to_svg_path;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pressure assumed when the input device does not report one.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// A single pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    /// Pressure in `[0, 1]`, or `None` when the device reported none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl StrokePoint {
    /// Create a sample. Out-of-range pressure is clamped; a non-finite
    /// pressure counts as not reported.
    pub fn new(x: f64, y: f64, pressure: Option<f64>) -> Self {
        let pressure = pressure
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));
        Self { x, y, pressure }
    }

    /// Create a sample with an explicit pressure.
    pub fn with_pressure(x: f64, y: f64, pressure: f64) -> Self {
        Self::new(x, y, Some(pressure))
    }

    /// Effective pressure, [`DEFAULT_PRESSURE`] when none was reported.
    pub fn pressure(&self) -> f64 {
        self.pressure.unwrap_or(DEFAULT_PRESSURE)
    }

    /// Whether the device reported a pressure for this sample.
    pub fn has_pressure(&self) -> bool {
        self.pressure.is_some()
    }

    /// Position of the sample.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.pressure.is_none_or(f64::is_finite)
    }
}

impl From<Point> for StrokePoint {
    fn from(point: Point) -> Self {
        Self::new(point.x, point.y, None)
    }
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color: {0:?}")]
pub struct ColorParseError(pub String);

/// Stroke color (RGBA8), written as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether the color is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.a == u8::MAX
    }

    /// `#RRGGBB`, ignoring alpha.
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rgb_hex())?;
        if !self.is_opaque() {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for StrokeColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(err)
        };
        match hex.len() {
            3 => {
                let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
                Ok(Self::rgb(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(err()),
        }
    }
}

impl Serialize for StrokeColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StrokeColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Color> for StrokeColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::rgba(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke identifier, unique within a drawing and increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(pub u64);

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Geometry derived from a sealed stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeGeometry {
    /// Closed outline polygon.
    pub outline: Vec<Point>,
    /// SVG path data for the outline; empty when nothing is visible.
    pub path: String,
}

/// One continuous gesture: ordered points plus style.
///
/// The outline and path are memoized on first use and never serialized.
/// The memo remembers the resolved options it was built from; asking for
/// geometry with any other template computes it afresh.
#[derive(Debug, Clone)]
pub struct Stroke {
    id: StrokeId,
    points: Vec<StrokePoint>,
    color: StrokeColor,
    size: f64,
    geometry: OnceCell<(OutlineOptions, StrokeGeometry)>,
}

impl Stroke {
    /// Create a sealed stroke with an empty geometry memo.
    pub fn new(id: StrokeId, points: Vec<StrokePoint>, color: StrokeColor, size: f64) -> Self {
        Self {
            id,
            points,
            color,
            size,
            geometry: OnceCell::new(),
        }
    }

    /// Identifier within the drawing.
    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Samples in capture order.
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    /// Whether any sample carries device pressure.
    pub fn has_pressure(&self) -> bool {
        self.points.iter().any(StrokePoint::has_pressure)
    }

    /// Fill color.
    pub fn color(&self) -> StrokeColor {
        self.color
    }

    /// Base width.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Outline options for this stroke: the template with this stroke's size,
    /// treated as a completed gesture. Pressure is only simulated when no
    /// sample reported any.
    pub fn outline_options(&self, template: &OutlineOptions) -> OutlineOptions {
        template
            .with_size(self.size)
            .for_device_pressure(self.has_pressure())
            .completed()
    }

    /// Compute the outline without touching the memo.
    pub fn compute_outline(&self, template: &OutlineOptions) -> Vec<Point> {
        outline::outline(&self.points, &self.outline_options(template))
    }

    /// Outline and path for `template`.
    ///
    /// The first call fills the memo. Later calls with the same resolved
    /// options borrow it; other templates get freshly computed geometry.
    pub fn geometry(&self, template: &OutlineOptions) -> Cow<'_, StrokeGeometry> {
        let options = self.outline_options(template);
        let (memo_options, geometry) = self
            .geometry
            .get_or_init(|| (options, self.build_geometry(&options)));
        if *memo_options == options {
            Cow::Borrowed(geometry)
        } else {
            Cow::Owned(self.build_geometry(&options))
        }
    }

    /// SVG path data for `template`, memoized like [`Stroke::geometry`].
    pub fn render_path(&self, template: &OutlineOptions) -> Cow<'_, str> {
        match self.geometry(template) {
            Cow::Borrowed(geometry) => Cow::Borrowed(geometry.path.as_str()),
            Cow::Owned(geometry) => Cow::Owned(geometry.path),
        }
    }

    fn build_geometry(&self, options: &OutlineOptions) -> StrokeGeometry {
        let outline = outline::outline(&self.points, options);
        let path = to_svg_path(&outline, true);
        StrokeGeometry { outline, path }
    }

    /// Copy of the canonical fields, without cached geometry.
    pub fn canonical(&self) -> Self {
        Self::new(self.id, self.points.clone(), self.color, self.size)
    }
}

impl PartialEq for Stroke {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.points == other.points
            && self.color == other.color
            && self.size == other.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pressure_defaults() {
        let p = StrokePoint::new(1.0, 2.0, None);
        assert!(!p.has_pressure());
        assert!((p.pressure() - DEFAULT_PRESSURE).abs() < f64::EPSILON);

        let p = StrokePoint::new(1.0, 2.0, Some(f64::NAN));
        assert!(!p.has_pressure());
        assert!((p.pressure() - DEFAULT_PRESSURE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pressure_clamped() {
        assert_eq!(StrokePoint::with_pressure(0.0, 0.0, 1.7).pressure, Some(1.0));
        assert_eq!(StrokePoint::with_pressure(0.0, 0.0, -0.3).pressure, Some(0.0));
    }

    #[test]
    fn test_point_deserialize_without_pressure() {
        let p: StrokePoint = serde_json::from_str(r#"{"x":3,"y":4}"#).unwrap();
        assert_eq!(p, StrokePoint::new(3.0, 4.0, None));
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"x":3.0,"y":4.0}"#);

        let p: StrokePoint = serde_json::from_str(r#"{"x":3,"y":4,"pressure":0.25}"#).unwrap();
        assert_eq!(p, StrokePoint::with_pressure(3.0, 4.0, 0.25));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("#FF0000".parse::<StrokeColor>().unwrap(), StrokeColor::rgb(255, 0, 0));
        assert_eq!("#00ff7f".parse::<StrokeColor>().unwrap(), StrokeColor::rgb(0, 255, 127));
        assert_eq!("#fff".parse::<StrokeColor>().unwrap(), StrokeColor::WHITE);
        assert_eq!(
            "#11223344".parse::<StrokeColor>().unwrap(),
            StrokeColor::rgba(0x11, 0x22, 0x33, 0x44)
        );
    }

    #[test]
    fn test_color_parse_rejects_garbage() {
        assert!("FF0000".parse::<StrokeColor>().is_err());
        assert!("#GG0000".parse::<StrokeColor>().is_err());
        assert!("#12345".parse::<StrokeColor>().is_err());
        assert!("#ééé".parse::<StrokeColor>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(StrokeColor::rgb(255, 0, 0).to_string(), "#FF0000");
        assert_eq!(StrokeColor::rgba(1, 2, 3, 128).to_string(), "#01020380");
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&StrokeColor::rgb(0x12, 0xAB, 0xEF)).unwrap();
        assert_eq!(json, "\"#12ABEF\"");
        let back: StrokeColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StrokeColor::rgb(0x12, 0xAB, 0xEF));
    }

    #[test]
    fn test_color_peniko_conversion() {
        let color = StrokeColor::rgba(10, 20, 30, 40);
        let peniko_color: Color = color.into();
        assert_eq!(StrokeColor::from(peniko_color), color);
    }

    #[test]
    fn test_stroke_equality_ignores_cache() {
        let points = vec![
            StrokePoint::with_pressure(0.0, 0.0, 0.5),
            StrokePoint::with_pressure(30.0, 0.0, 0.5),
        ];
        let a = Stroke::new(StrokeId(1), points.clone(), StrokeColor::BLACK, 4.0);
        let b = Stroke::new(StrokeId(1), points, StrokeColor::BLACK, 4.0);
        let _ = a.geometry(&OutlineOptions::default());
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b);
    }

    #[test]
    fn test_geometry_memoized() {
        let stroke = Stroke::new(
            StrokeId(1),
            vec![
                StrokePoint::with_pressure(0.0, 0.0, 0.5),
                StrokePoint::with_pressure(40.0, 10.0, 0.5),
            ],
            StrokeColor::BLACK,
            4.0,
        );
        let options = OutlineOptions::default();
        let first = stroke.render_path(&options).as_ptr();
        let second = stroke.render_path(&options).as_ptr();
        assert_eq!(first, second);
        assert!(!stroke.render_path(&options).is_empty());
    }

    fn sample_stroke() -> Stroke {
        Stroke::new(
            StrokeId(1),
            (0..30)
                .map(|i| StrokePoint::new(i as f64 * 3.0, (i as f64 * 0.3).sin() * 10.0, None))
                .collect(),
            StrokeColor::BLACK,
            8.0,
        )
    }

    #[test]
    fn test_geometry_follows_template() {
        let stroke = sample_stroke();
        let default = OutlineOptions::default();
        let flat = OutlineOptions {
            thinning: 0.0,
            start: crate::outline::EndOptions {
                cap: false,
                ..Default::default()
            },
            ..OutlineOptions::default()
        };

        let first = stroke.render_path(&default).into_owned();
        let second = stroke.render_path(&flat).into_owned();
        assert_eq!(second, to_svg_path(&stroke.compute_outline(&flat), true));
        assert_ne!(first, second);

        // The memo still answers for the template that filled it.
        assert!(matches!(stroke.render_path(&default), Cow::Borrowed(_)));
        assert_eq!(stroke.render_path(&default), first);
        assert_eq!(stroke.geometry(&flat).outline, stroke.compute_outline(&flat));
    }

    #[test]
    fn test_reported_pressure_disables_simulation() {
        let template = OutlineOptions::default();
        assert!(template.simulate_pressure);
        assert!(sample_stroke().outline_options(&template).simulate_pressure);

        let pressed = Stroke::new(
            StrokeId(2),
            vec![
                StrokePoint::with_pressure(0.0, 0.0, 0.9),
                StrokePoint::with_pressure(10.0, 0.0, 0.9),
            ],
            StrokeColor::BLACK,
            8.0,
        );
        assert!(pressed.has_pressure());
        assert!(!pressed.outline_options(&template).simulate_pressure);
    }
}
