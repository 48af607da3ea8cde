//! InkMirror Render Library
//!
//! SVG export, CPU rasterization and PNG output for InkMirror drawings.
//! Rendering goes through `resvg` so output is identical on every platform.

mod error;
pub mod raster;
pub mod svg;
pub mod view;

pub use error::{RenderError, RenderResult};
pub use raster::{RasterImage, crop_rgba, decode_png, encode_png, export_png, export_surface_png, rasterize};
pub use svg::SvgExporter;
pub use view::{RasterView, UNAVAILABLE_PLACEHOLDER, ViewState, WAITING_PLACEHOLDER};
