//! View transform that fits a drawing into the mirror viewport.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Scale and offset that map drawing coordinates onto a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen-space translation applied after scaling.
    pub offset: Vec2,
    /// Drawing units to screen pixels.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 20.0,
        }
    }
}

impl Camera {
    /// Camera at the origin with zoom 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawing to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen to drawing.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Back to identity.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Scale the bounds to fit inside the viewport minus `padding` on each
    /// side, then center them.
    ///
    /// Empty or zero-area bounds reset the camera to identity.
    pub fn fit_to_bounds(&mut self, bounds: Option<Rect>, viewport: Size, padding: f64) {
        let Some(bounds) = bounds.filter(|b| !b.is_zero_area() && b.is_finite()) else {
            self.reset();
            return;
        };

        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let fit = (available.width / bounds.width()).min(available.height / bounds.height());
        self.zoom = fit.clamp(self.min_zoom, self.max_zoom);

        let viewport_center = viewport.to_rect().center();
        self.offset = viewport_center.to_vec2() - bounds.center().to_vec2() * self.zoom;
    }

    /// Camera fitted to `bounds` in a viewport.
    pub fn fitted(bounds: Option<Rect>, viewport: Size, padding: f64) -> Self {
        let mut camera = Self::new();
        camera.fit_to_bounds(bounds, viewport, padding);
        camera
    }

    /// The region of the drawing visible through a viewport.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(viewport.width, viewport.height));
        Rect::from_points(top_left, bottom_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let camera = Camera::new();
        let p = Point::new(12.0, -7.0);
        assert_eq!(camera.world_to_screen(p), p);
        assert_eq!(camera.screen_to_world(p), p);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let camera = Camera {
            offset: Vec2::new(30.0, -20.0),
            zoom: 1.5,
            ..Camera::default()
        };
        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_fit_wide_content() {
        let bounds = Rect::new(0.0, 0.0, 200.0, 50.0);
        let camera = Camera::fitted(Some(bounds), Size::new(400.0, 400.0), 0.0);
        assert!((camera.zoom - 2.0).abs() < 1e-10);

        let center = camera.world_to_screen(bounds.center());
        assert!((center.x - 200.0).abs() < 1e-10);
        assert!((center.y - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_fit_respects_padding() {
        let bounds = Rect::new(-22.0, -22.0, 42.0, 22.0);
        let viewport = Size::new(800.0, 600.0);
        let camera = Camera::fitted(Some(bounds), viewport, 16.0);

        let top_left = camera.world_to_screen(Point::new(bounds.x0, bounds.y0));
        let bottom_right = camera.world_to_screen(Point::new(bounds.x1, bounds.y1));
        assert!(top_left.x >= 16.0 - 1e-9 && top_left.y >= 16.0 - 1e-9);
        assert!(bottom_right.x <= 784.0 + 1e-9 && bottom_right.y <= 584.0 + 1e-9);
    }

    #[test]
    fn test_fit_empty_resets() {
        let mut camera = Camera {
            offset: Vec2::new(5.0, 5.0),
            zoom: 3.0,
            ..Camera::default()
        };
        camera.fit_to_bounds(None, Size::new(100.0, 100.0), 10.0);
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);

        camera.zoom = 3.0;
        camera.fit_to_bounds(Some(Rect::new(1.0, 1.0, 1.0, 9.0)), Size::new(100.0, 100.0), 10.0);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_visible_rect_contains_bounds() {
        let bounds = Rect::new(10.0, 20.0, 310.0, 120.0);
        let viewport = Size::new(640.0, 480.0);
        let camera = Camera::fitted(Some(bounds), viewport, 8.0);
        let visible = camera.visible_world_rect(viewport);
        assert!(visible.contains(Point::new(bounds.x0, bounds.y0)));
        assert!(visible.contains(Point::new(bounds.x1 - 1e-6, bounds.y1 - 1e-6)));
    }
}
