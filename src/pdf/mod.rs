//! PDF processing layer
//!
//! Page assembly goes through qpdf, text and metadata through PDFium.

mod qpdf;
pub mod range;
mod reader;

pub use qpdf::{PagePick, QpdfWrapper};
pub use range::{parse_page_range, PageSelection};
pub use reader::{
    document_info, extract_all_text, extract_pages_text, has_pdf_header, pdfium_available,
    DocumentInfo, PageText,
};
