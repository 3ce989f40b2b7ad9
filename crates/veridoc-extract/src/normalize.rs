//! Normalise an uploaded artifact into a single base64 JPEG frame.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::DynamicImage;
use tracing::debug;

use crate::ExtractError;

/// Convert an uploaded file (PDF or raster image) into a base64-encoded
/// JPEG frame suitable for model input.
///
/// - PDF: page 1 only, rasterised at default resolution.
/// - PNG/JPEG: decoded and forced to RGB (alpha/palette discarded).
/// - Anything else: [`ExtractError::UnsupportedFormat`].
///
/// Pure transform; nothing is written back to disk.
pub fn normalize_to_jpeg(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let image = match ext.as_str() {
        "pdf" => render_pdf_first_page(path)?,
        "png" | "jpg" | "jpeg" => image::open(path)?,
        other => return Err(ExtractError::UnsupportedFormat(other.to_string())),
    };

    let encoded = encode_rgb_jpeg(&image)?;
    debug!(path = %path.display(), bytes = encoded.len(), "normalised upload to jpeg frame");
    Ok(encoded)
}

/// Force RGB, JPEG-encode, base64-encode.
fn encode_rgb_jpeg(image: &DynamicImage) -> Result<String, ExtractError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)?;
    Ok(STANDARD.encode(&buffer))
}

#[cfg(feature = "pdfium")]
fn render_pdf_first_page(path: &Path) -> Result<DynamicImage, ExtractError> {
    use pdfium_render::prelude::*;

    let pdfium = Pdfium::new(
        Pdfium::bind_to_system_library().map_err(|e| ExtractError::PdfRender(e.to_string()))?,
    );
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| ExtractError::PdfRender(e.to_string()))?;
    let page = document
        .pages()
        .get(0)
        .map_err(|e| ExtractError::PdfRender(e.to_string()))?;
    let bitmap = page
        .render_with_config(&PdfRenderConfig::new())
        .map_err(|e| ExtractError::PdfRender(e.to_string()))?;
    Ok(bitmap.as_image())
}

#[cfg(not(feature = "pdfium"))]
fn render_pdf_first_page(_path: &Path) -> Result<DynamicImage, ExtractError> {
    Err(ExtractError::PdfRenderUnavailable)
}
