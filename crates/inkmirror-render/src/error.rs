use thiserror::Error;

/// Export and display errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render")]
    Empty,
    #[error("Invalid SVG: {0}")]
    Svg(String),
    #[error("Invalid scale: {0}")]
    InvalidScale(f64),
    #[error("Invalid raster size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Image decoding failed: {0}")]
    Decode(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
