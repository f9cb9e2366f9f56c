//! Static Chart Renderer
//! Draws a chart into an in-memory RGB buffer and encodes it as an image file.

use crate::config::ImageSize;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Nothing to draw: {0}")]
    Empty(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

/// Drawing area of an in-memory bitmap.
pub type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Render with `draw` onto a white canvas and return the pixels.
pub fn render_rgb<F>(size: ImageSize, draw: F) -> Result<RgbImage, RenderError>
where
    F: FnOnce(&Canvas<'_>) -> Result<(), RenderError>,
{
    let (width, height) = (size.width(), size.height());
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| RenderError::Draw("pixel buffer does not match image size".to_string()))
}

/// Encode `image` as JPEG at `path`.
pub fn save_jpeg(image: &RgbImage, path: &Path) -> Result<(), RenderError> {
    image.save_with_format(path, ImageFormat::Jpeg)?;
    Ok(())
}

/// Font of the given base size, scaled for the export resolution.
pub fn font(size: ImageSize, base: f64) -> FontDesc<'static> {
    ("sans-serif", size.px(base)).into_font()
}
