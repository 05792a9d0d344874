//! qpdf FFI wrapper for page assembly
//!
//! Page selection and concatenation use the qpdf crate (vendored FFI). All
//! output is produced in memory so callers decide when it reaches disk.

use crate::error::{Error, Result};
use qpdf::QPdf;

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// Pages to take from one source document, in output order
pub struct PagePick<'a> {
    /// Raw PDF bytes of the source
    pub data: &'a [u8],
    /// 1-indexed page numbers to copy
    pub pages: &'a [u32],
    /// Name used in error messages
    pub name: &'a str,
}

fn open_qpdf(data: &[u8], name: &str) -> Result<QPdf> {
    QPdf::read_from_memory(data).map_err(|e| Error::Qpdf {
        reason: format!("Failed to read {}: {}", name, e),
    })
}

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    Error::Qpdf {
        reason: e.to_string(),
    }
}

impl QpdfWrapper {
    /// Build a new PDF holding the given pages of the given sources, in order.
    ///
    /// Every source stays open until the output is written, since copied
    /// pages may still reference stream data owned by their source.
    pub fn assemble(picks: &[PagePick<'_>]) -> Result<Vec<u8>> {
        if picks.is_empty() {
            return Err(Error::Usage("No input PDFs provided".to_string()));
        }

        let dest = QPdf::empty();
        let mut sources = Vec::with_capacity(picks.len());

        for pick in picks {
            let source = open_qpdf(pick.data, pick.name)?;
            let num_pages = source.get_num_pages().map_err(map_qpdf_error)?;

            for &page_num in pick.pages {
                if page_num < 1 || page_num > num_pages {
                    return Err(Error::InvalidRange {
                        range: format!(
                            "page {} out of range 1-{} in {}",
                            page_num, num_pages, pick.name
                        ),
                    });
                }
                let page = source
                    .get_page(page_num - 1)
                    .ok_or_else(|| Error::InvalidRange {
                        range: format!("page {} missing in {}", page_num, pick.name),
                    })?;
                let copied = dest.copy_from_foreign(&page);
                dest.add_page(&copied, false).map_err(map_qpdf_error)?;
            }

            sources.push(source);
        }

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        let output = writer.write_to_memory().map_err(map_qpdf_error)?;
        drop(sources);
        Ok(output)
    }

    /// Extract specific pages (1-indexed) from a PDF into a new PDF
    pub fn select_pages(input_data: &[u8], pages: &[u32]) -> Result<Vec<u8>> {
        Self::assemble(&[PagePick {
            data: input_data,
            pages,
            name: "input",
        }])
    }

    /// Get the page count of a PDF
    pub fn get_page_count(input_data: &[u8]) -> Result<u32> {
        let qpdf = open_qpdf(input_data, "input")?;
        qpdf.get_num_pages().map_err(map_qpdf_error)
    }
}
