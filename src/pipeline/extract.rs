//! Text extraction: read every page's text layer via pdfium.
//!
//! pdfium keeps thread-local state and blocks, so all work happens inside
//! `tokio::task::spawn_blocking`. The library is bound at runtime: first
//! `PDFIUM_LIB_PATH` if set, then the system copy.
//!
//! A document whose pages have no text layer (scans) extracts to a list of
//! empty strings. That is not an error here; the pipeline notices that
//! cleaning produced no segments and reports it.

use crate::error::Pdf2PodError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Raw text of a document, one string per page in page order.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// True when no page carries any non-whitespace character.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Extract the text of every page.
pub async fn extract_text(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedText, Pdf2PodError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_text_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2PodError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract document metadata without reading page text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2PodError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2PodError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn bind_pdfium() -> Result<Pdfium, Pdf2PodError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(&lib),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2PodError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2PodError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.to_lowercase().contains("password") {
            if password.is_some() {
                Pdf2PodError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2PodError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2PodError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail,
            }
        }
    })
}

fn extract_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedText, Pdf2PodError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let mut pages = Vec::with_capacity(document.pages().len() as usize);
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| Pdf2PodError::PageTextFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        let content = text.all();
        debug!("Page {}: {} chars", idx + 1, content.chars().count());
        pages.push(content);
    }

    info!("Extracted text from {} pages", pages.len());
    Ok(ExtractedText { pages })
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2PodError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_ignores_whitespace() {
        let t = ExtractedText {
            pages: vec!["  \n".into(), "\t".into()],
        };
        assert!(t.is_blank());
        let t = ExtractedText {
            pages: vec!["".into(), "x".into()],
        };
        assert!(!t.is_blank());
    }
}
