//! CPU rasterization and PNG encoding.

use crate::error::{RenderError, RenderResult};
use crate::svg::SvgExporter;
use inkmirror_core::{Stroke, clamp_to_surface};
use kurbo::{Rect, Size};
use resvg::{tiny_skia, usvg};

/// Largest accepted raster edge, in pixels.
const MAX_DIMENSION: u32 = 16_384;

/// Straight-alpha RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba_data
            .get(i..i + 4)
            .and_then(|px| px.try_into().ok())
    }
}

/// Rasterize an SVG document, scaling its intrinsic size by `scale`.
pub fn rasterize(svg: &str, scale: f64) -> RenderResult<RasterImage> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(RenderError::InvalidScale(scale));
    }
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default())
        .map_err(|e| RenderError::Svg(e.to_string()))?;

    let size = tree.size();
    let width = (f64::from(size.width()) * scale).ceil();
    let height = (f64::from(size.height()) * scale).ceil();
    if !(width >= 1.0 && height >= 1.0 && width <= f64::from(MAX_DIMENSION) && height <= f64::from(MAX_DIMENSION)) {
        return Err(RenderError::InvalidSize { width, height });
    }
    let (width, height) = (width as u32, height as u32);

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RenderError::InvalidSize {
        width: f64::from(width),
        height: f64::from(height),
    })?;
    let scale = scale as f32;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    // tiny-skia stores premultiplied alpha.
    let mut rgba_data = Vec::with_capacity(width as usize * height as usize * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba_data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    log::debug!("Rasterized SVG to {}x{}", width, height);
    Ok(RasterImage {
        rgba_data,
        width,
        height,
    })
}

/// Encode as an 8-bit RGBA PNG.
pub fn encode_png(image: &RasterImage) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("header: {}", e)))?;
        writer
            .write_image_data(&image.rgba_data)
            .map_err(|e| RenderError::Encode(format!("data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("finish: {}", e)))?;
    }
    Ok(png_data)
}

/// Decode PNG bytes to straight-alpha RGBA8.
pub fn decode_png(bytes: &[u8]) -> RenderResult<RasterImage> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| RenderError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(RasterImage {
        rgba_data: image.into_raw(),
        width,
        height,
    })
}

/// Copy the pixels inside `rect` (pixel coordinates, expanded to whole
/// pixels and clipped to the image).
pub fn crop_rgba(image: &RasterImage, rect: Rect) -> RenderResult<RasterImage> {
    let x0 = rect.x0.max(0.0).floor();
    let y0 = rect.y0.max(0.0).floor();
    let x1 = rect.x1.min(f64::from(image.width)).ceil();
    let y1 = rect.y1.min(f64::from(image.height)).ceil();
    if !(x1 > x0 && y1 > y0) {
        return Err(RenderError::Empty);
    }
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);
    let stride = image.width as usize * 4;

    let mut rgba_data = Vec::with_capacity((x1 - x0) * (y1 - y0) * 4);
    for row in y0..y1 {
        let start = row * stride + x0 * 4;
        let end = row * stride + x1 * 4;
        let slice = image
            .rgba_data
            .get(start..end)
            .ok_or_else(|| RenderError::InvalidSize {
                width: f64::from(image.width),
                height: f64::from(image.height),
            })?;
        rgba_data.extend_from_slice(slice);
    }
    Ok(RasterImage {
        rgba_data,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Rasterize strokes framed by `bounds` and encode them as PNG.
pub fn export_png(
    exporter: &SvgExporter,
    strokes: &[Stroke],
    bounds: Option<Rect>,
    scale: f64,
) -> RenderResult<Vec<u8>> {
    let svg = exporter.document(strokes, bounds).ok_or(RenderError::Empty)?;
    encode_png(&rasterize(&svg, scale)?)
}

/// Rasterize the whole authoring surface, then crop to the part of `bounds`
/// that lies on it.
pub fn export_surface_png(
    exporter: &SvgExporter,
    strokes: &[Stroke],
    bounds: Option<Rect>,
    surface: Size,
    scale: f64,
) -> RenderResult<Vec<u8>> {
    let crop = bounds
        .and_then(|b| clamp_to_surface(b, surface))
        .ok_or(RenderError::Empty)?;
    let svg = exporter
        .document(strokes, Some(surface.to_rect()))
        .ok_or(RenderError::Empty)?;
    let full = rasterize(&svg, scale)?;
    let scaled = Rect::new(crop.x0 * scale, crop.y0 * scale, crop.x1 * scale, crop.y1 * scale);
    encode_png(&crop_rgba(&full, scaled)?)
}
