//! Source resolution and output writing

pub mod output;
pub mod resolver;

pub use output::{commit, same_file, stage, staging_file, write_atomic};
pub use resolver::{collect_pdfs, expand_input, require_pdf_extension, resolve_path, ResolvedPdf};
