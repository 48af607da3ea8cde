//! Bounding boxes for display fitting and export cropping.

use crate::stroke::Stroke;
use kurbo::{Rect, Size};

/// Fixed margin added around the drawing, before half the widest stroke.
pub const BASE_PADDING: f64 = 20.0;

/// Padded bounding box of all stroke points, or `None` for no content.
///
/// The margin is `BASE_PADDING + max_size / 2`, using the widest stroke
/// present for every edge.
pub fn bounds(strokes: &[Stroke]) -> Option<Rect> {
    let mut points = strokes
        .iter()
        .flat_map(|stroke| stroke.points())
        .filter(|p| p.x.is_finite() && p.y.is_finite());

    let first = points.next()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    let max_size = strokes
        .iter()
        .map(Stroke::size)
        .filter(|size| size.is_finite())
        .fold(0.0, f64::max);
    let padding = BASE_PADDING + max_size / 2.0;

    Some(Rect::new(min_x, min_y, max_x, max_y).inflate(padding, padding))
}

/// Restrict a box to the authoring surface `(0, 0, width, height)`.
///
/// Returns `None` when nothing of the box lies on the surface.
pub fn clamp_to_surface(rect: Rect, surface: Size) -> Option<Rect> {
    let clamped = rect.intersect(surface.to_rect());
    (clamped.width() > 0.0 && clamped.height() > 0.0).then_some(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{StrokeColor, StrokeId, StrokePoint};

    fn stroke(id: u64, points: &[(f64, f64)], size: f64) -> Stroke {
        Stroke::new(
            StrokeId(id),
            points
                .iter()
                .map(|&(x, y)| StrokePoint::new(x, y, None))
                .collect(),
            StrokeColor::BLACK,
            size,
        )
    }

    #[test]
    fn test_empty() {
        assert!(bounds(&[]).is_none());
    }

    #[test]
    fn test_single_stroke_padding() {
        let b = bounds(&[stroke(1, &[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)], 4.0)]).unwrap();
        let pad = BASE_PADDING + 2.0;
        assert!((b.x0 + pad).abs() < 1e-9);
        assert!((b.y0 + pad).abs() < 1e-9);
        assert!((b.x1 - (20.0 + pad)).abs() < 1e-9);
        assert!((b.y1 - pad).abs() < 1e-9);
    }

    #[test]
    fn test_widest_stroke_pads_every_edge() {
        let thin = stroke(1, &[(0.0, 0.0), (5.0, 5.0)], 2.0);
        let thick = stroke(2, &[(100.0, 100.0), (110.0, 120.0)], 30.0);
        let b = bounds(&[thin, thick]).unwrap();
        let pad = BASE_PADDING + 15.0;
        assert!((b.x0 + pad).abs() < 1e-9);
        assert!((b.y0 + pad).abs() < 1e-9);
        assert!((b.x1 - (110.0 + pad)).abs() < 1e-9);
        assert!((b.y1 - (120.0 + pad)).abs() < 1e-9);
    }

    #[test]
    fn test_contains_every_point() {
        let strokes = [
            stroke(1, &[(-40.0, 3.0), (12.0, 80.0)], 6.0),
            stroke(2, &[(7.0, -9.0), (300.0, 2.0), (150.0, 45.0)], 1.0),
        ];
        let b = bounds(&strokes).unwrap();
        for p in strokes.iter().flat_map(|s| s.points()) {
            assert!(b.contains(p.position()));
        }
    }

    #[test]
    fn test_clamp_to_surface() {
        let surface = Size::new(800.0, 600.0);
        let clamped = clamp_to_surface(Rect::new(-22.0, -22.0, 42.0, 22.0), surface).unwrap();
        assert_eq!(clamped, Rect::new(0.0, 0.0, 42.0, 22.0));

        assert!(clamp_to_surface(Rect::new(900.0, 0.0, 950.0, 50.0), surface).is_none());
    }
}
