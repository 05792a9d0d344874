//! Error types for the PDF tools

use thiserror::Error;

/// Result type alias for the PDF tools
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for a successful run
pub const EXIT_OK: u8 = 0;
/// Exit code for bad arguments, bad ranges, and unreadable sources
pub const EXIT_USER: u8 = 1;
/// Exit code for a missing external tool or credential
pub const EXIT_MISSING: u8 = 2;
/// Exit code for a failure reported by an upstream tool or service
pub const EXIT_UPSTREAM: u8 = 3;

/// Error types for the PDF tools
#[derive(Error, Debug)]
pub enum Error {
    /// Page range expression is malformed or references missing pages
    #[error("Invalid page range: {range}")]
    InvalidRange { range: String },

    /// Input file or directory does not exist or holds no PDFs
    #[error("Source not found: {path}")]
    SourceNotFound { path: String },

    /// Input exists but is not a usable PDF
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// A mandatory external executable is unavailable
    #[error("Required tool not found: {tool} ({hint})")]
    ToolNotFound { tool: String, hint: String },

    /// A required credential is not set in the environment
    #[error("{name} is not set")]
    MissingCredential { name: String },

    /// The hosted API or an external tool reported a failure
    #[error("Upstream failure: {reason}")]
    Upstream { reason: String },

    /// Invalid combination of command-line arguments
    #[error("{0}")]
    Usage(String),

    /// Document contained no text to work with
    #[error("Document is empty: {path}")]
    EmptyDocument { path: String },

    /// qpdf error
    #[error("qpdf error: {reason}")]
    Qpdf { reason: String },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::InvalidRange { .. }
            | Error::SourceNotFound { .. }
            | Error::InvalidPdf { .. }
            | Error::Usage(_)
            | Error::EmptyDocument { .. }
            | Error::Qpdf { .. }
            | Error::Io(_)
            | Error::Serialization(_) => EXIT_USER,
            Error::ToolNotFound { .. } | Error::MissingCredential { .. } => EXIT_MISSING,
            // PDFium failing to bind is an environment problem, not bad input
            Error::Pdfium { .. } => EXIT_MISSING,
            Error::Upstream { .. } => EXIT_UPSTREAM,
        }
    }
}
