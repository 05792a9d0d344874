//! PDF reader wrapper for PDFium

use crate::error::{Error, Result};
use pdfium_render::prelude::*;

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    // Try a library next to the binary, then /opt/pdfium, then the system path
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Whether the PDFium shared library can be bound on this system
pub fn pdfium_available() -> bool {
    create_pdfium().is_ok()
}

/// Check the `%PDF` magic at the start of the data
pub fn has_pdf_header(data: &[u8]) -> bool {
    data.len() >= 4 && &data[0..4] == b"%PDF"
}

/// Basic document information
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Text of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page: u32,
    /// Extracted text, trimmed
    pub text: String,
}

fn load_document<'a>(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<PdfDocument<'a>> {
    if !has_pdf_header(data) {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(map_pdfium_error)
}

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::InvalidPdf {
                reason: "PDF is password protected".to_string(),
            }
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError) => {
            Error::InvalidPdf {
                reason: "Malformed PDF".to_string(),
            }
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

fn metadata_value(document: &PdfDocument, tag: PdfDocumentMetadataTagType) -> Option<String> {
    document
        .metadata()
        .get(tag)
        .map(|t| t.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read page count, title, and author
pub fn document_info(data: &[u8]) -> Result<DocumentInfo> {
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data)?;

    Ok(DocumentInfo {
        page_count: document.pages().len() as u32,
        title: metadata_value(&document, PdfDocumentMetadataTagType::Title),
        author: metadata_value(&document, PdfDocumentMetadataTagType::Author),
    })
}

/// Extract text from the given 1-indexed pages, in the order given.
pub fn extract_pages_text(data: &[u8], page_numbers: &[u32]) -> Result<Vec<PageText>> {
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data)?;

    let pages = document.pages();
    let page_count = pages.len() as u32;

    let mut results = Vec::with_capacity(page_numbers.len());

    for &page_num in page_numbers {
        if page_num < 1 || page_num > page_count {
            return Err(Error::InvalidRange {
                range: format!("page {} out of range 1-{}", page_num, page_count),
            });
        }

        let page = pages
            .get((page_num - 1) as u16)
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to get page {}: {}", page_num, e),
            })?;

        // Pages without a text layer yield empty text
        let text = match page.text() {
            Ok(t) => t.all().trim().to_string(),
            Err(_) => String::new(),
        };

        results.push(PageText {
            page: page_num,
            text,
        });
    }

    Ok(results)
}

/// Extract text from every page
pub fn extract_all_text(data: &[u8]) -> Result<Vec<PageText>> {
    let info = document_info(data)?;
    let pages: Vec<u32> = (1..=info.page_count).collect();
    extract_pages_text(data, &pages)
}
