//! Page extraction: write selected pages to a new PDF and/or their text to
//! a plain-text or JSON file.

use crate::error::{Error, Result};
use crate::pdf::{extract_pages_text, PageSelection, PageText, QpdfWrapper};
use crate::source::{commit, require_pdf_extension, resolve_path, stage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Text output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// `--- Page N ---` headers followed by page text
    Plain,
    /// `{"source": ..., "pages": [{"page": N, "text": ...}]}`
    Json,
}

impl TextFormat {
    /// `.json` (any case) selects JSON; everything else is plain text
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TextFormat::Json,
            _ => TextFormat::Plain,
        }
    }
}

/// One page entry of the JSON payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub page: u32,
    pub text: String,
}

/// JSON payload written by text extraction and read by the Q&A tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub source: String,
    pub pages: Vec<PageEntry>,
}

/// Where the text goes and in which format
#[derive(Debug, Clone)]
pub struct TextOutput {
    pub path: PathBuf,
    pub format: TextFormat,
}

impl TextOutput {
    /// Format chosen by the file extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = TextFormat::from_path(&path);
        Self { path, format }
    }
}

/// Extraction request
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub input: PathBuf,
    pub pages: PageSelection,
    /// New PDF with only the selected pages
    pub pdf_output: Option<PathBuf>,
    /// Text of the selected pages
    pub text_output: Option<TextOutput>,
}

/// What an extraction produced
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub pages: Vec<u32>,
    pub pdf_output: Option<PathBuf>,
    pub text_output: Option<PathBuf>,
}

/// Serialize page texts in the requested format
pub fn render_text(source: &str, pages: &[PageText], format: TextFormat) -> Result<String> {
    match format {
        TextFormat::Json => {
            let payload = ExtractedText {
                source: source.to_string(),
                pages: pages
                    .iter()
                    .map(|p| PageEntry {
                        page: p.page,
                        text: p.text.clone(),
                    })
                    .collect(),
            };
            Ok(serde_json::to_string_pretty(&payload)?)
        }
        TextFormat::Plain => {
            let mut lines = Vec::with_capacity(pages.len() * 3);
            for p in pages {
                lines.push(format!("--- Page {} ---", p.page));
                lines.push(p.text.clone());
                lines.push(String::new());
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Run an extraction. All outputs are built in memory first and written
/// only when every step has succeeded.
pub fn extract(request: &ExtractRequest) -> Result<ExtractSummary> {
    if request.pdf_output.is_none() && request.text_output.is_none() {
        return Err(Error::Usage("Nothing to extract: no output requested".to_string()));
    }

    require_pdf_extension(&request.input)?;
    let resolved = resolve_path(&request.input)?;

    let total = QpdfWrapper::get_page_count(&resolved.data)?;
    if total == 0 {
        return Err(Error::InvalidPdf {
            reason: "PDF has no pages".to_string(),
        });
    }
    let pages = request.pages.resolve(total)?;
    tracing::debug!("Selected pages (1-based): {:?}", pages);

    let pdf_data = match request.pdf_output {
        Some(_) => Some(QpdfWrapper::select_pages(&resolved.data, &pages)?),
        None => None,
    };

    let text_data = match &request.text_output {
        Some(out) => {
            let texts = extract_pages_text(&resolved.data, &pages)?;
            let source_name = request
                .input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| resolved.source_name.clone());
            Some(render_text(&source_name, &texts, out.format)?)
        }
        None => None,
    };

    let mut summary = ExtractSummary {
        pages,
        pdf_output: None,
        text_output: None,
    };

    // Stage every output before committing any, so a failure leaves none
    let staged_pdf = match (&request.pdf_output, &pdf_data) {
        (Some(path), Some(data)) => Some((path, stage(path, data)?)),
        _ => None,
    };
    let staged_text = match (&request.text_output, &text_data) {
        (Some(out), Some(text)) => Some((&out.path, stage(&out.path, text.as_bytes())?)),
        _ => None,
    };

    if let Some((path, staged)) = staged_pdf {
        summary.pdf_output = Some(commit(staged, path)?);
        tracing::info!(
            "Extracted {} page(s) to {}",
            summary.pages.len(),
            path.display()
        );
    }
    if let Some((path, staged)) = staged_text {
        summary.text_output = Some(commit(staged, path)?);
        tracing::info!("Wrote text to {}", path.display());
    }

    Ok(summary)
}
