//! SVG document export.

use inkmirror_core::{Camera, OutlineOptions, Stroke, StrokeColor, StrokeStore};
use kurbo::{Rect, Size};
use std::fmt::Write;

/// Builds standalone SVG documents from strokes.
///
/// Stroke paths come from each stroke's memoized geometry, so the exporter
/// must use the same outline template as the store that owns the strokes.
#[derive(Debug, Clone)]
pub struct SvgExporter {
    options: OutlineOptions,
    /// Fill painted under the strokes; transparent when `None`.
    background: Option<StrokeColor>,
}

impl Default for SvgExporter {
    fn default() -> Self {
        Self::new(OutlineOptions::default())
    }
}

impl SvgExporter {
    /// Exporter using `options` as the outline template.
    pub fn new(options: OutlineOptions) -> Self {
        Self {
            options,
            background: None,
        }
    }

    /// Exporter matching a store's outline template.
    pub fn for_store(store: &StrokeStore) -> Self {
        Self::new(*store.options())
    }

    /// Fill the exported area with `background`, or leave it transparent.
    pub fn with_background(mut self, background: Option<StrokeColor>) -> Self {
        self.background = background;
        self
    }

    /// Document whose view box is `bounds`. `None` when there is nothing to
    /// show.
    pub fn document(&self, strokes: &[Stroke], bounds: Option<Rect>) -> Option<String> {
        let bounds = bounds.filter(|b| b.width() > 0.0 && b.height() > 0.0)?;

        let mut svg = String::with_capacity(256 + strokes.len() * 512);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{:.2} {:.2} {:.2} {:.2}" width="{:.2}" height="{:.2}">"#,
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
            bounds.width(),
            bounds.height()
        );
        self.write_background(&mut svg, bounds);
        self.write_paths(&mut svg, strokes);
        svg.push_str("</svg>");
        Some(svg)
    }

    /// Document for a whole store, framed by its padded bounds.
    pub fn store_document(&self, store: &StrokeStore) -> Option<String> {
        self.document(store.strokes(), store.bounds())
    }

    /// Document sized to a viewport, with the drawing scaled to fit inside
    /// it minus `padding` and centered.
    pub fn viewport_document(
        &self,
        strokes: &[Stroke],
        bounds: Option<Rect>,
        viewport: Size,
        padding: f64,
    ) -> Option<String> {
        bounds.filter(|b| b.width() > 0.0 && b.height() > 0.0)?;
        if !(viewport.width > 0.0 && viewport.height > 0.0) {
            return None;
        }

        let camera = Camera::fitted(bounds, viewport, padding);
        let [a, b, c, d, e, f] = camera.transform().as_coeffs();

        let mut svg = String::with_capacity(256 + strokes.len() * 512);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.2} {:.2}" width="{:.2}" height="{:.2}">"#,
            viewport.width, viewport.height, viewport.width, viewport.height
        );
        self.write_background(&mut svg, viewport.to_rect());
        let _ = write!(
            svg,
            r#"<g transform="matrix({:.6} {:.6} {:.6} {:.6} {:.4} {:.4})">"#,
            a, b, c, d, e, f
        );
        self.write_paths(&mut svg, strokes);
        svg.push_str("</g></svg>");
        Some(svg)
    }

    fn write_background(&self, svg: &mut String, area: Rect) {
        if let Some(color) = self.background {
            let _ = write!(
                svg,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}/>"#,
                area.x0,
                area.y0,
                area.width(),
                area.height(),
                fill_attrs(color)
            );
        }
    }

    fn write_paths(&self, svg: &mut String, strokes: &[Stroke]) {
        for stroke in strokes {
            let d = stroke.render_path(&self.options);
            if d.is_empty() {
                continue;
            }
            let _ = write!(svg, r#"<path d="{}" {}/>"#, d.trim_end(), fill_attrs(stroke.color()));
        }
    }
}

fn fill_attrs(color: StrokeColor) -> String {
    if color.is_opaque() {
        format!(r#"fill="{}""#, color.to_rgb_hex())
    } else {
        format!(
            r#"fill="{}" fill-opacity="{:.3}""#,
            color.to_rgb_hex(),
            f64::from(color.a) / 255.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmirror_core::StrokePoint;

    fn store_with(strokes: &[(&[(f64, f64)], StrokeColor, f64)]) -> StrokeStore {
        let mut store = StrokeStore::default();
        for (points, color, size) in strokes {
            let (first, rest) = points.split_first().unwrap();
            store.begin_stroke(StrokePoint::new(first.0, first.1, None), *color, *size);
            for &(x, y) in rest {
                store.extend_stroke(StrokePoint::new(x, y, None));
            }
            store.end_stroke();
        }
        store
    }

    #[test]
    fn test_empty_document() {
        let exporter = SvgExporter::default();
        assert!(exporter.document(&[], None).is_none());
        assert!(exporter.store_document(&StrokeStore::default()).is_none());
    }

    #[test]
    fn test_view_box_matches_bounds() {
        let red = StrokeColor::rgb(255, 0, 0);
        let store = store_with(&[(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)], red, 4.0)]);
        let svg = SvgExporter::for_store(&store).store_document(&store).unwrap();
        assert!(svg.contains(r#"viewBox="-22.00 -22.00 64.00 44.00""#));
        assert!(svg.contains(r##"fill="#FF0000""##));
        assert_eq!(svg.matches("<path ").count(), 1);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_paths_in_paint_order() {
        let first = StrokeColor::rgb(1, 1, 1);
        let second = StrokeColor::rgb(2, 2, 2);
        let store = store_with(&[
            (&[(0.0, 0.0), (40.0, 0.0)], first, 4.0),
            (&[(0.0, 10.0), (40.0, 10.0)], second, 4.0),
        ]);
        let svg = SvgExporter::for_store(&store).store_document(&store).unwrap();
        let a = svg.find("#010101").unwrap();
        let b = svg.find("#020202").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_background_and_alpha() {
        let translucent = StrokeColor::rgba(0, 0, 255, 128);
        let store = store_with(&[(&[(0.0, 0.0), (40.0, 0.0)], translucent, 4.0)]);
        let svg = SvgExporter::for_store(&store)
            .with_background(Some(StrokeColor::WHITE))
            .store_document(&store)
            .unwrap();
        assert!(svg.contains(r##"<rect x="-22.00" y="-22.00" width="84.00" height="44.00" fill="#FFFFFF"/>"##));
        assert!(svg.contains(r#"fill-opacity="0.502""#));
    }

    #[test]
    fn test_viewport_document() {
        let store = store_with(&[(&[(0.0, 0.0), (100.0, 0.0)], StrokeColor::BLACK, 4.0)]);
        let svg = SvgExporter::for_store(&store)
            .viewport_document(store.strokes(), store.bounds(), Size::new(800.0, 600.0), 16.0)
            .unwrap();
        assert!(svg.contains(r#"viewBox="0 0 800.00 600.00""#));
        assert!(svg.contains("<g transform=\"matrix("));
        assert!(svg.ends_with("</g></svg>"));

        let none = SvgExporter::default().viewport_document(&[], None, Size::new(800.0, 600.0), 16.0);
        assert!(none.is_none());
    }
}
