//! Source resolution for PDF inputs

use crate::error::{Error, Result};
use crate::pdf::has_pdf_header;
use std::path::{Path, PathBuf};

/// Resolved PDF data
#[derive(Debug)]
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub source_name: String,
}

/// Resolve a file path to PDF data
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::SourceNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(|e| {
        tracing::debug!("Failed to read {}: {}", path.display(), e);
        Error::SourceNotFound {
            path: path.display().to_string(),
        }
    })?;

    // Validate PDF header
    if !has_pdf_header(&data) {
        return Err(Error::InvalidPdf {
            reason: format!("{} is not a valid PDF file", path.display()),
        });
    }

    Ok(ResolvedPdf {
        data,
        source_name: path.display().to_string(),
    })
}

/// Require a `.pdf` extension (case-insensitive)
pub fn require_pdf_extension(path: &Path) -> Result<()> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        Ok(())
    } else {
        Err(Error::InvalidPdf {
            reason: format!("Not a PDF file: {}", path.display()),
        })
    }
}

/// PDF files directly inside `dir` whose file name matches `pattern`
/// (e.g. "*.pdf"), sorted by file name.
pub fn collect_pdfs(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::SourceNotFound {
            path: dir.display().to_string(),
        });
    }

    let pattern = glob::Pattern::new(pattern)
        .map_err(|e| Error::Usage(format!("Invalid file pattern '{}': {}", pattern, e)))?;
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // Skip entries we can't read
        };

        let path = entry.path();
        if !path.is_file() || require_pdf_extension(&path).is_err() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if pattern.matches_with(&name, options) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Expand a file-or-directory input into PDF paths.
/// A directory with no matching PDFs is an error.
pub fn expand_input(input: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let files = collect_pdfs(input, pattern)?;
        if files.is_empty() {
            return Err(Error::SourceNotFound {
                path: format!("{} (no files matching {})", input.display(), pattern),
            });
        }
        Ok(files)
    } else if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(Error::SourceNotFound {
            path: input.display().to_string(),
        })
    }
}
