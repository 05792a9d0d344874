//! PDF Tools Library
//!
//! Shared implementation behind four command-line utilities:
//! - `pdfmerge`: concatenate PDFs (or page ranges of them) into one document
//! - `pdfextract`: copy selected pages to a new PDF and/or extract their text
//! - `pdfocr`: add a searchable text layer to scanned PDFs through ocrmypdf
//! - `sumai`: answer questions about a document through a Chat Completions API

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod merge;
pub mod ocr;
pub mod pdf;
pub mod qa;
pub mod source;

pub use error::{Error, Result};
