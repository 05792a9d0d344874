//! Document assembly: concatenate selected pages from several PDFs

use crate::error::{Error, Result};
use crate::pdf::{document_info, PagePick, PageSelection, QpdfWrapper};
use crate::source::{collect_pdfs, expand_input, resolve_path, write_atomic};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default glob for directory inputs
pub const DEFAULT_PATTERN: &str = "*.pdf";

/// One source document and the pages to take from it
#[derive(Debug, Clone)]
pub struct MergeSource {
    pub path: PathBuf,
    pub pages: PageSelection,
}

impl MergeSource {
    pub fn all(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: PageSelection::All,
        }
    }

    pub fn with_pages(path: impl Into<PathBuf>, pages: PageSelection) -> Self {
        Self {
            path: path.into(),
            pages,
        }
    }
}

/// Pages contributed by one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub path: String,
    pub pages: Vec<u32>,
}

/// Result of a merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub output_path: String,
    pub sources: Vec<SourceSummary>,
    pub output_page_count: u32,
}

/// Pair positional inputs with positional ranges and expand directories.
///
/// A range paired with a directory applies to each PDF it expands to.
/// Inputs without a range take every page.
pub fn plan_sources(
    inputs: &[PathBuf],
    ranges: &[PageSelection],
    pattern: &str,
) -> Result<Vec<MergeSource>> {
    if inputs.is_empty() {
        return Err(Error::Usage("No input PDFs provided".to_string()));
    }
    if ranges.len() > inputs.len() {
        return Err(Error::Usage(format!(
            "{} ranges given for {} inputs",
            ranges.len(),
            inputs.len()
        )));
    }

    let mut sources = Vec::new();
    for (i, input) in inputs.iter().enumerate() {
        let pages = ranges.get(i).cloned().unwrap_or_default();
        for path in expand_input(input, pattern)? {
            sources.push(MergeSource::with_pages(path, pages.clone()));
        }
    }
    Ok(sources)
}

/// Build the merged document in memory.
///
/// Every source is read and every range validated before anything is
/// assembled.
pub fn assemble(sources: &[MergeSource]) -> Result<(Vec<u8>, Vec<SourceSummary>)> {
    if sources.is_empty() {
        return Err(Error::Usage("No input PDFs provided".to_string()));
    }

    let mut loaded = Vec::with_capacity(sources.len());
    for source in sources {
        let resolved = resolve_path(&source.path)?;
        let page_count = QpdfWrapper::get_page_count(&resolved.data)?;
        let pages = source.pages.resolve(page_count).map_err(|e| match e {
            Error::InvalidRange { range } => Error::InvalidRange {
                range: format!("{} for {}", range, resolved.source_name),
            },
            other => other,
        })?;
        tracing::debug!(
            "{}: {} pages, taking {}",
            resolved.source_name,
            page_count,
            pages.len()
        );
        loaded.push((resolved, pages));
    }

    let picks: Vec<PagePick<'_>> = loaded
        .iter()
        .map(|(resolved, pages)| PagePick {
            data: &resolved.data,
            pages,
            name: &resolved.source_name,
        })
        .collect();
    let output = QpdfWrapper::assemble(&picks)?;

    let summaries = loaded
        .into_iter()
        .map(|(resolved, pages)| SourceSummary {
            path: resolved.source_name,
            pages,
        })
        .collect();

    Ok((output, summaries))
}

/// Merge the sources into `output`. The output file is written only after
/// the whole document has been assembled.
pub fn merge_pdfs(sources: &[MergeSource], output: &Path) -> Result<MergeSummary> {
    let (data, summaries) = assemble(sources)?;
    let output_page_count = QpdfWrapper::get_page_count(&data)?;

    for summary in &summaries {
        tracing::info!("Added {} pages from {}", summary.pages.len(), summary.path);
    }

    write_atomic(output, &data)?;
    tracing::info!(
        "Merged {} PDFs ({} pages) into {}",
        summaries.len(),
        output_page_count,
        output.display()
    );

    Ok(MergeSummary {
        output_path: output.display().to_string(),
        sources: summaries,
        output_page_count,
    })
}

/// Information about a single PDF
#[derive(Debug, Clone, Serialize)]
pub struct PdfFileInfo {
    pub filename: String,
    pub pages: u32,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Page count, title, and author of a PDF
pub fn pdf_info(path: &Path) -> Result<PdfFileInfo> {
    let resolved = resolve_path(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| resolved.source_name.clone());

    // Page counting goes through qpdf so listing works without PDFium
    let pages = QpdfWrapper::get_page_count(&resolved.data)?;
    let (title, author) = match document_info(&resolved.data) {
        Ok(info) => (info.title, info.author),
        Err(e) => {
            tracing::debug!("Metadata unavailable for {}: {}", filename, e);
            (None, None)
        }
    };

    Ok(PdfFileInfo {
        filename,
        pages,
        title,
        author,
    })
}

/// Name and page count of each PDF in a directory. Unreadable files are
/// reported with a warning and skipped.
pub fn list_pdfs(dir: &Path, pattern: &str) -> Result<Vec<(String, u32)>> {
    let mut listing = Vec::new();
    for path in collect_pdfs(dir, pattern)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match resolve_path(&path).and_then(|r| QpdfWrapper::get_page_count(&r.data)) {
            Ok(pages) => listing.push((name, pages)),
            Err(e) => tracing::warn!("Skipping {}: {}", name, e),
        }
    }
    Ok(listing)
}
