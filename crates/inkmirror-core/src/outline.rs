//! Pressure-sensitive stroke outlining.
//!
//! Turns a pointer trace into a closed polygon whose width follows pen
//! pressure (or simulated pressure from drawing speed). The input is first
//! low-pass filtered ("streamline"), then offset left and right of the
//! filtered centerline, with rounded corners and end caps.

use crate::stroke::StrokePoint;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How quickly simulated pressure follows drawing speed.
const RATE_OF_PRESSURE_CHANGE: f64 = 0.275;

/// Slightly more than a half turn so that cap fans close without a seam.
const FIXED_PI: f64 = PI + 0.0001;

const CORNER_STEPS: u32 = 13;
const START_CAP_STEPS: u32 = 13;
const END_CAP_STEPS: u32 = 29;

/// Points this close to the end of the stroke are skipped (except the last).
const END_NOISE_LENGTH: f64 = 3.0;

/// Number of leading points used to seed simulated pressure.
const PRESSURE_SEED_POINTS: usize = 10;

const MIN_RADIUS: f64 = 0.01;

/// Taper applied to one end of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taper {
    /// No taper; the end is capped (or flat).
    #[default]
    None,
    /// Ramp the width to zero over this distance.
    Length(f64),
    /// Taper over the whole stroke (at least `size`).
    Full,
}

impl Taper {
    fn length(self, size: f64, total_length: f64) -> f64 {
        match self {
            Taper::None => 0.0,
            Taper::Length(length) if length.is_finite() => length.max(0.0),
            Taper::Length(_) => 0.0,
            Taper::Full => size.max(total_length),
        }
    }
}

/// Shape of one end of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndOptions {
    /// Round cap (`true`) or flat end (`false`). Ignored when tapered.
    pub cap: bool,
    pub taper: Taper,
}

impl Default for EndOptions {
    fn default() -> Self {
        Self {
            cap: true,
            taper: Taper::None,
        }
    }
}

/// Shape parameters for [`outline`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineOptions {
    /// Base diameter.
    pub size: f64,
    /// How much pressure affects width, in `[-1, 1]`. Negative values make
    /// high pressure thinner.
    pub thinning: f64,
    /// Corner rounding, in `[0, 1]`.
    pub smoothing: f64,
    /// Centerline low-pass filtering, in `[0, 1]`.
    pub streamline: f64,
    /// Derive pressure from speed for strokes whose device reported none.
    pub simulate_pressure: bool,
    pub start: EndOptions,
    pub end: EndOptions,
    /// The gesture is complete; the final point is used verbatim.
    pub last: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            size: 16.0,
            thinning: 0.5,
            smoothing: 0.5,
            streamline: 0.5,
            simulate_pressure: true,
            start: EndOptions::default(),
            end: EndOptions::default(),
            last: false,
        }
    }
}

impl OutlineOptions {
    /// Same options with a different base size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Same options, with simulation switched off when the device reported
    /// pressure.
    pub fn for_device_pressure(mut self, reported: bool) -> Self {
        self.simulate_pressure &= !reported;
        self
    }

    /// Same options, marked as a completed gesture.
    pub fn completed(mut self) -> Self {
        self.last = true;
        self
    }
}

/// A centerline point after streamline filtering.
#[derive(Debug, Clone, Copy)]
struct FilteredPoint {
    point: Point,
    pressure: f64,
    /// Unit vector pointing back toward the previous point.
    vector: Vec2,
    distance: f64,
    running_length: f64,
}

/// Compute the outline polygon of a stroke.
///
/// Returns an empty polygon when fewer than two distinct points survive
/// filtering, or when `size` is not positive.
pub fn outline(points: &[StrokePoint], options: &OutlineOptions) -> Vec<Point> {
    if !(options.size.is_finite() && options.size > 0.0) {
        return Vec::new();
    }
    let filtered = filter_points(points, options);
    if filtered.len() < 2 {
        return Vec::new();
    }
    outline_filtered(&filtered, options)
}

fn filter_points(points: &[StrokePoint], options: &OutlineOptions) -> Vec<FilteredPoint> {
    let t = 0.15 + (1.0 - options.streamline.clamp(0.0, 1.0)) * 0.85;

    let mut raw: Vec<(Point, f64)> = points
        .iter()
        .filter(|p| p.is_finite())
        .map(|p| (p.position(), p.pressure()))
        .collect();

    if raw.len() < 2 {
        return Vec::new();
    }

    // Two samples give too little to filter; spread them into five.
    if raw.len() == 2 {
        let (a, pa) = raw[0];
        let (b, pb) = raw[1];
        raw = (0..5u32)
            .map(|i| {
                let f = f64::from(i) / 4.0;
                (a.lerp(b, f), pa + (pb - pa) * f)
            })
            .collect();
    }

    let max = raw.len() - 1;
    let (first, first_pressure) = raw[0];
    let mut filtered = vec![FilteredPoint {
        point: first,
        pressure: first_pressure,
        vector: Vec2::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];

    let mut has_reached_minimum_length = false;
    let mut running_length = 0.0;
    let mut prev = first;

    for (i, &(raw_point, pressure)) in raw.iter().enumerate().skip(1) {
        let point = if options.last && i == max {
            raw_point
        } else {
            prev.lerp(raw_point, t)
        };

        let distance = point.distance(prev);
        if distance <= f64::EPSILON {
            continue;
        }
        running_length += distance;

        if i < max && !has_reached_minimum_length {
            if running_length < options.size {
                continue;
            }
            has_reached_minimum_length = true;
        }

        filtered.push(FilteredPoint {
            point,
            pressure,
            vector: (prev - point) / distance,
            distance,
            running_length,
        });
        prev = point;
    }

    if let Some(second) = filtered.get(1).map(|p| p.vector) {
        filtered[0].vector = second;
    }
    filtered
}

fn outline_filtered(points: &[FilteredPoint], options: &OutlineOptions) -> Vec<Point> {
    let size = options.size;
    let last_index = points.len() - 1;
    let first = points[0];
    let last = points[last_index];
    let total_length = last.running_length;

    let taper_start = options.start.taper.length(size, total_length);
    let taper_end = options.end.taper.length(size, total_length);
    let min_distance = (size * options.smoothing).powi(2);
    let thinning = options.thinning.clamp(-1.0, 1.0);

    let mut left: Vec<Point> = Vec::with_capacity(points.len() + END_CAP_STEPS as usize);
    let mut right: Vec<Point> = Vec::with_capacity(points.len() + START_CAP_STEPS as usize);

    let mut prev_pressure = points
        .iter()
        .take(PRESSURE_SEED_POINTS)
        .fold(first.pressure, |acc, p| {
            let pressure = if options.simulate_pressure {
                simulated_pressure(acc, p.distance, size)
            } else {
                p.pressure
            };
            (acc + pressure) / 2.0
        });

    let mut radius = stroke_radius(size, thinning, last.pressure);
    let mut prev_vector = first.vector;
    let mut pl = first.point;
    let mut pr = first.point;
    let mut prev_was_sharp = false;

    for (i, fp) in points.iter().enumerate() {
        let is_last = i == last_index;
        if !is_last && total_length - fp.running_length < END_NOISE_LENGTH {
            continue;
        }

        let mut pressure = fp.pressure;
        radius = if thinning.abs() > f64::EPSILON {
            if options.simulate_pressure {
                pressure = simulated_pressure(prev_pressure, fp.distance, size);
            }
            stroke_radius(size, thinning, pressure)
        } else {
            size / 2.0
        };

        let remaining = total_length - fp.running_length;
        let ts = if fp.running_length < taper_start {
            ease_taper_start(fp.running_length / taper_start)
        } else {
            1.0
        };
        let te = if remaining < taper_end {
            ease_taper_end(remaining / taper_end)
        } else {
            1.0
        };
        radius = (radius * ts.min(te)).max(MIN_RADIUS);

        let next_vector = points.get(i + 1).map_or(fp.vector, |next| next.vector);
        let next_dpr = if is_last { 1.0 } else { fp.vector.dot(next_vector) };
        let prev_dpr = fp.vector.dot(prev_vector);

        let is_sharp = prev_dpr < 0.0 && !prev_was_sharp;
        let next_is_sharp = next_dpr < 0.0;

        if is_sharp || next_is_sharp {
            // Fan a half turn around the corner so it reads as rounded.
            let offset = perpendicular(prev_vector) * radius;
            for step in 0..=CORNER_STEPS {
                let t = f64::from(step) / f64::from(CORNER_STEPS);
                pl = rotate_around(fp.point - offset, fp.point, FIXED_PI * t);
                left.push(pl);
                pr = rotate_around(fp.point + offset, fp.point, -FIXED_PI * t);
                right.push(pr);
            }
            if next_is_sharp {
                prev_was_sharp = true;
            }
            continue;
        }
        prev_was_sharp = false;

        if is_last {
            let offset = perpendicular(fp.vector) * radius;
            left.push(fp.point - offset);
            right.push(fp.point + offset);
            continue;
        }

        let offset = perpendicular(next_vector.lerp(fp.vector, next_dpr)) * radius;

        let tl = fp.point - offset;
        if i <= 1 || pl.distance_squared(tl) > min_distance {
            left.push(tl);
            pl = tl;
        }

        let tr = fp.point + offset;
        if i <= 1 || pr.distance_squared(tr) > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_pressure = pressure;
        prev_vector = fp.vector;
    }

    let first_point = first.point;
    let last_point = last.point;

    let mut start_cap = Vec::new();
    if taper_start > 0.0 {
        // Tapered to a point; nothing to add.
    } else if options.start.cap {
        if let Some(&anchor) = right.first() {
            start_cap.extend((1..=START_CAP_STEPS).map(|step| {
                let t = f64::from(step) / f64::from(START_CAP_STEPS);
                rotate_around(anchor, first_point, FIXED_PI * t)
            }));
        }
    } else if let (Some(&l), Some(&r)) = (left.first(), right.first()) {
        let corners = l - r;
        let a = corners * 0.5;
        let b = corners * 0.51;
        start_cap.extend([
            first_point - a,
            first_point - b,
            first_point + b,
            first_point + a,
        ]);
    }

    let direction = perpendicular(-last.vector);
    let mut end_cap = Vec::new();
    if taper_end > 0.0 {
        end_cap.push(last_point);
    } else if options.end.cap {
        let start = last_point + direction * radius;
        end_cap.extend((1..END_CAP_STEPS).map(|step| {
            let t = f64::from(step) / f64::from(END_CAP_STEPS);
            rotate_around(start, last_point, FIXED_PI * 3.0 * t)
        }));
    } else {
        end_cap.extend([
            last_point + direction * radius,
            last_point + direction * (radius * 0.99),
            last_point - direction * (radius * 0.99),
            last_point - direction * radius,
        ]);
    }

    let mut polygon = left;
    polygon.extend(end_cap);
    polygon.extend(right.into_iter().rev());
    polygon.extend(start_cap);
    polygon
}

/// Half-width for a given pressure.
fn stroke_radius(size: f64, thinning: f64, pressure: f64) -> f64 {
    size * (0.5 - thinning * (0.5 - pressure))
}

/// Pressure synthesized from speed: fast segments thin the line.
fn simulated_pressure(prev: f64, distance: f64, size: f64) -> f64 {
    let speed = (distance / size).min(1.0);
    let rest = (1.0 - speed).min(1.0);
    (prev + (rest - prev) * (speed * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

fn ease_taper_start(t: f64) -> f64 {
    t * (2.0 - t)
}

fn ease_taper_end(t: f64) -> f64 {
    (t - 1.0).powi(3) + 1.0
}

fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

fn rotate_around(point: Point, center: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    Point::new(
        d.x * cos - d.y * sin + center.x,
        d.x * sin + d.y * cos + center.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: usize, step: f64, pressure: f64) -> Vec<StrokePoint> {
        (0..len)
            .map(|i| StrokePoint::with_pressure(i as f64 * step, 0.0, pressure))
            .collect()
    }

    fn fixed_pressure() -> OutlineOptions {
        OutlineOptions {
            simulate_pressure: false,
            last: true,
            ..OutlineOptions::default()
        }
    }

    fn max_abs_y(polygon: &[Point]) -> f64 {
        polygon.iter().map(|p| p.y.abs()).fold(0.0, f64::max)
    }

    fn max_x(polygon: &[Point]) -> f64 {
        polygon.iter().map(|p| p.x).fold(f64::MIN, f64::max)
    }

    #[test]
    fn test_empty_and_single_point() {
        let options = OutlineOptions::default();
        assert!(outline(&[], &options).is_empty());
        assert!(outline(&[StrokePoint::new(5.0, 5.0, None)], &options).is_empty());
    }

    #[test]
    fn test_identical_points_are_degenerate() {
        let p = StrokePoint::new(5.0, 5.0, None);
        assert!(outline(&[p, p, p, p], &OutlineOptions::default()).is_empty());
    }

    #[test]
    fn test_two_points_produce_outline() {
        let points = [StrokePoint::new(0.0, 0.0, None), StrokePoint::new(20.0, 0.0, None)];
        let polygon = outline(&points, &OutlineOptions::default());
        assert!(polygon.len() >= 4);
        assert!(polygon.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_zero_size_is_empty() {
        let points = line(10, 5.0, 0.5);
        assert!(outline(&points, &OutlineOptions::default().with_size(0.0)).is_empty());
        assert!(outline(&points, &OutlineOptions::default().with_size(f64::NAN)).is_empty());
    }

    #[test]
    fn test_duplicates_do_not_produce_nan() {
        let points = [
            StrokePoint::new(0.0, 0.0, None),
            StrokePoint::new(0.0, 0.0, None),
            StrokePoint::new(0.0, 0.0, None),
            StrokePoint::new(10.0, 10.0, None),
            StrokePoint::new(10.0, 10.0, None),
            StrokePoint::new(30.0, 12.0, None),
            StrokePoint::new(30.0, 12.0, None),
        ];
        for last in [false, true] {
            let options = OutlineOptions {
                last,
                ..OutlineOptions::default()
            };
            let polygon = outline(&points, &options);
            assert!(!polygon.is_empty());
            assert!(polygon.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        }
    }

    #[test]
    fn test_non_finite_samples_skipped() {
        let points = [
            StrokePoint::new(0.0, 0.0, None),
            StrokePoint { x: f64::NAN, y: 1.0, pressure: Some(0.5) },
            StrokePoint::new(40.0, 0.0, None),
        ];
        let polygon = outline(&points, &OutlineOptions::default());
        assert!(!polygon.is_empty());
        assert!(polygon.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_deterministic() {
        let points: Vec<StrokePoint> = (0..50)
            .map(|i| {
                let t = i as f64 * 0.2;
                StrokePoint::with_pressure(t.cos() * 40.0 + t * 5.0, t.sin() * 40.0, (t * 0.3).sin().abs())
            })
            .collect();
        let options = OutlineOptions::default().completed();
        assert_eq!(outline(&points, &options), outline(&points, &options));
    }

    #[test]
    fn test_pressure_widens_stroke() {
        let options = fixed_pressure();
        let light = outline(&line(40, 5.0, 0.0), &options);
        let heavy = outline(&line(40, 5.0, 1.0), &options);
        assert!(max_abs_y(&heavy) > max_abs_y(&light));
    }

    #[test]
    fn test_negative_thinning_inverts_pressure() {
        let options = OutlineOptions {
            thinning: -0.5,
            ..fixed_pressure()
        };
        let light = outline(&line(40, 5.0, 0.0), &options);
        let heavy = outline(&line(40, 5.0, 1.0), &options);
        assert!(max_abs_y(&heavy) < max_abs_y(&light));
    }

    #[test]
    fn test_zero_thinning_is_uniform() {
        let options = OutlineOptions {
            thinning: 0.0,
            ..fixed_pressure()
        };
        let light = outline(&line(40, 5.0, 0.0), &options);
        let heavy = outline(&line(40, 5.0, 1.0), &options);
        assert_eq!(light, heavy);
    }

    #[test]
    fn test_end_cap_extends_past_last_point() {
        let polygon = outline(&line(21, 5.0, 0.5), &fixed_pressure());
        // Radius at pressure 0.5 is size / 2 = 8.
        assert!(max_x(&polygon) > 105.0);
    }

    #[test]
    fn test_end_taper_points_the_stroke() {
        let options = OutlineOptions {
            end: EndOptions {
                cap: true,
                taper: Taper::Length(50.0),
            },
            ..fixed_pressure()
        };
        let polygon = outline(&line(21, 5.0, 0.5), &options);
        assert!(!polygon.is_empty());
        assert!(max_x(&polygon) <= 100.0 + 0.02);
    }

    #[test]
    fn test_flat_caps_stay_inside_ends() {
        let options = OutlineOptions {
            start: EndOptions { cap: false, taper: Taper::None },
            end: EndOptions { cap: false, taper: Taper::None },
            ..fixed_pressure()
        };
        let polygon = outline(&line(21, 5.0, 0.5), &options);
        assert!(max_x(&polygon) <= 100.0 + 1e-6);
    }

    #[test]
    fn test_reversal_is_finite() {
        let mut points = line(20, 5.0, 0.5);
        points.extend(line(20, 5.0, 0.5).into_iter().rev());
        let polygon = outline(&points, &OutlineOptions::default().completed());
        assert!(!polygon.is_empty());
        assert!(polygon.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_streamline_smooths_jitter() {
        let jitter: Vec<StrokePoint> = (0..60)
            .map(|i| {
                let y = if i % 2 == 0 { 4.0 } else { -4.0 };
                StrokePoint::with_pressure(i as f64 * 3.0, y, 0.5)
            })
            .collect();
        let mean_deviation = |streamline: f64| {
            let options = OutlineOptions { streamline, ..fixed_pressure() };
            let filtered = filter_points(&jitter, &options);
            let interior = &filtered[1..filtered.len() - 1];
            interior.iter().map(|p| p.point.y.abs()).sum::<f64>() / interior.len() as f64
        };
        assert!(mean_deviation(0.0) > 3.9);
        assert!(mean_deviation(1.0) < 2.0);
    }

    #[test]
    fn test_options_serde_defaults() {
        let options: OutlineOptions = serde_json::from_str(r#"{"size": 4}"#).unwrap();
        assert!((options.size - 4.0).abs() < f64::EPSILON);
        assert!((options.thinning - 0.5).abs() < f64::EPSILON);
        assert!(options.start.cap);

        let tapered: EndOptions = serde_json::from_str(r#"{"taper": {"length": 20}}"#).unwrap();
        assert_eq!(tapered.taper, Taper::Length(20.0));
    }
}
