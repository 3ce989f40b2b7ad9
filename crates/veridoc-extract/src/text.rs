//! Multi-page PDF text extraction for text-bearing documents.

use std::path::Path;

use tracing::debug;

use crate::ExtractError;

/// Extract all page text from a PDF, concatenated with single spaces.
///
/// Bank statements are text-bearing PDFs and are extracted as text rather
/// than rasterised; image bank statements are not supported, so a non-PDF
/// extension fails with [`ExtractError::UnsupportedFormat`].
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ext != "pdf" {
        return Err(ExtractError::UnsupportedFormat(ext));
    }

    let document =
        lopdf::Document::load(path).map_err(|e| ExtractError::PdfText(e.to_string()))?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in &page_numbers {
        let text = document
            .extract_text(&[*number])
            .map_err(|e| ExtractError::PdfText(e.to_string()))?;
        pages.push(text);
    }

    let joined = pages.join(" ");
    debug!(path = %path.display(), pages = page_numbers.len(), chars = joined.len(), "extracted pdf text");
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_extension_is_rejected() {
        for name in ["statement.png", "statement.jpg", "statement"] {
            assert!(matches!(
                extract_pdf_text(Path::new(name)),
                Err(ExtractError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn unreadable_pdf_surfaces_text_error() {
        assert!(matches!(
            extract_pdf_text(Path::new("does-not-exist.pdf")),
            Err(ExtractError::PdfText(_))
        ));
    }
}
