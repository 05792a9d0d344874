//! OCR orchestration through the `ocrmypdf` executable
//!
//! `ocrmypdf` drives Tesseract for recognition and, when present, Ghostscript
//! and pngquant for optimization. Which of those tools exist is probed once
//! into a [`ToolAvailability`] and handed to [`run_ocr`].

use crate::cli::blocking;
use crate::config::ToolPaths;
use crate::error::{Error, Result};
use crate::pdf::{extract_all_text, extract_pages_text, parse_page_range, QpdfWrapper};
use crate::source::{commit, require_pdf_extension, resolve_path, same_file, staging_file};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Highest optimization level ocrmypdf accepts
pub const MAX_OPTIMIZE: u8 = 3;
/// Output verification is skipped above this many pages
pub const VERIFY_MAX_PAGES: u32 = 500;
/// ocrmypdf exit status for "page already has text"
const PRIOR_OCR_FOUND: i32 = 6;

/// Executables found on this system
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    pub ocrmypdf: Option<PathBuf>,
    pub tesseract: Option<PathBuf>,
    pub ghostscript: Option<PathBuf>,
    pub pngquant: Option<PathBuf>,
    /// Directories to prepend to the child's PATH
    pub extra_path: Vec<PathBuf>,
}

fn exe_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

fn runs(program: &Path) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Look for one of `names` in `dirs`, then on PATH.
fn find_tool(names: &[&str], dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in dirs {
        for name in names {
            let candidate = dir.join(exe_name(name));
            if candidate.is_file() && runs(&candidate) {
                return Some(candidate);
            }
        }
    }
    names
        .iter()
        .map(PathBuf::from)
        .find(|candidate| runs(candidate))
}

fn ghostscript_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["gswin64c", "gswin32c", "gs"]
    } else {
        &["gs"]
    }
}

impl ToolAvailability {
    /// Probe the system for every tool the pipeline can use
    pub fn probe(paths: &ToolPaths) -> Self {
        let ocrmypdf = match &paths.ocrmypdf {
            Some(path) if runs(path) => Some(path.clone()),
            Some(path) => {
                tracing::warn!("OCRMYPDF_PATH {} is not runnable", path.display());
                find_tool(&["ocrmypdf"], &[])
            }
            None => find_tool(&["ocrmypdf"], &[]),
        };
        let tesseract = find_tool(&["tesseract"], &paths.tesseract_dirs);
        let ghostscript = find_tool(ghostscript_names(), &paths.ghostscript_dirs);
        let pngquant = find_tool(&["pngquant"], &[]);

        let extra_path = [tesseract.as_deref(), ghostscript.as_deref()]
            .into_iter()
            .flatten()
            .filter_map(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect();

        let tools = Self {
            ocrmypdf,
            tesseract,
            ghostscript,
            pngquant,
            extra_path,
        };
        tracing::debug!("Tool probe: {:?}", tools);
        tools
    }

    /// Fail with `ToolNotFound` unless the mandatory tools are present
    pub fn require_ocr(&self) -> Result<&Path> {
        if self.tesseract.is_none() {
            return Err(Error::ToolNotFound {
                tool: "tesseract".to_string(),
                hint: "install Tesseract OCR, add it to PATH, or set TESSERACT_PATH".to_string(),
            });
        }
        self.ocrmypdf.as_deref().ok_or_else(|| Error::ToolNotFound {
            tool: "ocrmypdf".to_string(),
            hint: "install OCRmyPDF (pip install ocrmypdf) or set OCRMYPDF_PATH".to_string(),
        })
    }

    /// PATH for the child process: probed tool directories first
    fn child_path(&self) -> Option<OsString> {
        if self.extra_path.is_empty() {
            return None;
        }
        let existing = std::env::var_os("PATH").unwrap_or_default();
        let dirs = self
            .extra_path
            .iter()
            .cloned()
            .chain(std::env::split_paths(&existing));
        std::env::join_paths(dirs).ok()
    }
}

/// Split `eng+fra` style language codes, dropping blanks; defaults to `eng`
pub fn parse_languages(spec: &str) -> Vec<String> {
    let languages: Vec<String> = spec
        .split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if languages.is_empty() {
        vec!["eng".to_string()]
    } else {
        languages
    }
}

/// `<dir>/<stem>_O.pdf` next to the input
pub fn output_beside(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_O.pdf", stem))
}

/// OCR request as given on the command line
#[derive(Debug, Clone)]
pub struct OcrOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub deskew: bool,
    pub languages: Vec<String>,
    /// Optimization level; `None` picks the default for the installed tools
    pub optimize: Option<u8>,
    pub force_ocr: bool,
    pub redo_ocr: bool,
    pub jobs: Option<usize>,
    /// Pages to OCR; others are copied unchanged
    pub pages: Option<String>,
    pub progress_bar: bool,
    /// Also write the recognized text to `<input stem>.txt`
    pub save_text: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("ocr_output.pdf"),
            deskew: true,
            languages: vec!["eng".to_string()],
            optimize: None,
            force_ocr: false,
            redo_ocr: false,
            jobs: None,
            pages: None,
            progress_bar: true,
            save_text: false,
        }
    }
}

/// Settings after applying tool availability and flag compatibility rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrPlan {
    pub deskew: bool,
    pub force_ocr: bool,
    pub redo_ocr: bool,
    pub optimize: u8,
    /// Fallbacks applied, for the user
    pub notes: Vec<String>,
}

impl OcrOptions {
    /// Resolve flag conflicts and the optimization level.
    ///
    /// Without an explicit level, optimization is 1 when Ghostscript is
    /// installed and 0 otherwise. Levels 2-3 need pngquant and drop to 1
    /// without it.
    pub fn plan(&self, tools: &ToolAvailability) -> OcrPlan {
        let mut notes = Vec::new();
        let mut deskew = self.deskew;
        let mut redo_ocr = self.redo_ocr;

        // ocrmypdf rejects --redo-ocr together with --deskew. Checked before
        // --force-ocr resolves the conflict, so --force-overwrite always
        // turns deskew off.
        if redo_ocr && deskew {
            deskew = false;
            notes.push("Deskew disabled: not supported when redoing OCR".to_string());
        }
        if self.force_ocr && redo_ocr {
            redo_ocr = false;
            notes.push("--force-ocr takes precedence over --force-overwrite".to_string());
        }

        let gs_available = tools.ghostscript.is_some();
        let mut optimize = match self.optimize {
            Some(level) => {
                let level = level.min(MAX_OPTIMIZE);
                if level >= 1 && !gs_available {
                    notes.push(
                        "Ghostscript not found; optimization disabled (output may be larger). \
                         Install Ghostscript and set PATH or GHOSTSCRIPT_PATH to enable."
                            .to_string(),
                    );
                    0
                } else {
                    level
                }
            }
            None if gs_available => 1,
            None => {
                notes.push(
                    "Ghostscript not found; skipping image optimization (output may be larger)."
                        .to_string(),
                );
                0
            }
        };

        if optimize >= 2 && tools.pngquant.is_none() {
            notes.push("pngquant not found; --optimize 2/3 requires it. Using --optimize 1.".to_string());
            optimize = 1;
        }

        OcrPlan {
            deskew,
            force_ocr: self.force_ocr,
            redo_ocr,
            optimize,
            notes,
        }
    }
}

/// Command-line arguments for ocrmypdf
pub fn ocrmypdf_args(options: &OcrOptions, plan: &OcrPlan, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-l".into(),
        options.languages.join("+").into(),
        "--optimize".into(),
        plan.optimize.to_string().into(),
    ];
    if plan.deskew {
        args.push("--deskew".into());
    }
    if plan.force_ocr {
        args.push("--force-ocr".into());
    }
    if plan.redo_ocr {
        args.push("--redo-ocr".into());
    }
    if !options.progress_bar {
        args.push("--no-progress-bar".into());
    }
    if let Some(jobs) = options.jobs {
        args.push("--jobs".into());
        args.push(jobs.to_string().into());
    }
    if let Some(pages) = &options.pages {
        args.push("--pages".into());
        args.push(pages.into());
    }
    args.push(options.input.as_os_str().to_owned());
    args.push(output.as_os_str().to_owned());
    args
}

/// What an OCR run produced
#[derive(Debug, Clone)]
pub struct OcrSummary {
    pub output: PathBuf,
    pub text_output: Option<PathBuf>,
    pub verification: Verification,
}

/// Outcome of checking page 1 of the OCR output for text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Start of page 1's text, whitespace collapsed
    Sample(String),
    NoText,
    /// Too many pages, or the output could not be read
    Skipped,
}

fn validate_input(options: &OcrOptions) -> Result<()> {
    if !options.input.exists() {
        return Err(Error::SourceNotFound {
            path: options.input.display().to_string(),
        });
    }
    require_pdf_extension(&options.input)?;
    if same_file(&options.input, &options.output) {
        return Err(Error::Usage(
            "Input and output must be different files".to_string(),
        ));
    }
    Ok(())
}

/// Look for text on page 1 of `data`, keeping at most `max_chars`
/// characters of it. Documents over [`VERIFY_MAX_PAGES`] are not checked.
pub fn verify_text_layer(data: &[u8], max_chars: usize) -> Result<Verification> {
    let pages = QpdfWrapper::get_page_count(data)?;
    if pages == 0 || pages > VERIFY_MAX_PAGES {
        return Ok(Verification::Skipped);
    }
    let texts = extract_pages_text(data, &[1])?;
    let joined = texts
        .first()
        .map(|p| p.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let sample: String = joined.chars().take(max_chars).collect();
    Ok(if sample.is_empty() {
        Verification::NoText
    } else {
        Verification::Sample(sample)
    })
}

/// Run the OCR pipeline. The output file appears only after ocrmypdf has
/// succeeded.
pub async fn run_ocr(options: &OcrOptions, tools: &ToolAvailability) -> Result<OcrSummary> {
    validate_input(options)?;
    let ocrmypdf = tools.require_ocr()?.to_path_buf();

    let resolved = resolve_path(&options.input)?;
    if let Some(pages) = &options.pages {
        let data = resolved.data.clone();
        let pages = pages.clone();
        blocking(move || {
            let count = QpdfWrapper::get_page_count(&data)?;
            parse_page_range(&pages, count).map(|_| ())
        })
        .await?;
    }

    let plan = options.plan(tools);
    for note in &plan.notes {
        tracing::warn!("{}", note);
    }

    let staged = staging_file(&options.output)?;
    let args = ocrmypdf_args(options, &plan, staged.path());
    tracing::debug!("Running {} {:?}", ocrmypdf.display(), args);

    let mut command = tokio::process::Command::new(&ocrmypdf);
    command.args(&args);
    if let Some(path) = tools.child_path() {
        command.env("PATH", path);
    }
    let status = command.status().await.map_err(|e| Error::Upstream {
        reason: format!("Failed to start {}: {}", ocrmypdf.display(), e),
    })?;

    if !status.success() {
        let reason = match status.code() {
            Some(PRIOR_OCR_FOUND) => "PDF already has a text layer; use --force-overwrite or \
                                      --force-ocr to OCR it again"
                .to_string(),
            Some(code) => format!("ocrmypdf exited with status {}", code),
            None => "ocrmypdf was terminated by a signal".to_string(),
        };
        // Dropping the staged file removes the partial output
        return Err(Error::Upstream { reason });
    }

    let output = commit(staged, &options.output)?;
    tracing::info!("Wrote searchable PDF to: {}", output.display());

    let data = tokio::fs::read(&output).await?;

    let text_output = if options.save_text {
        let text_path = options.input.with_extension("txt");
        let data = data.clone();
        let texts = blocking(move || extract_all_text(&data)).await?;
        let text = texts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        crate::source::write_atomic(&text_path, text.as_bytes())?;
        tracing::info!("Wrote extracted text to: {}", text_path.display());
        Some(text_path)
    } else {
        None
    };

    let verification = match blocking(move || verify_text_layer(&data, 500)).await {
        Ok(verification) => verification,
        Err(e) => {
            tracing::debug!("Could not read output for verification: {}", e);
            Verification::Skipped
        }
    };
    match &verification {
        Verification::Sample(text) => {
            tracing::info!("Text layer verified. Sample from page 1: {}...", text)
        }
        Verification::NoText => tracing::warn!(
            "No searchable text was detected on page 1. \
             Try --force-ocr, or run: ocrmypdf --force-ocr --deskew <input> <output>"
        ),
        Verification::Skipped => tracing::debug!("Text layer verification skipped"),
    }

    Ok(OcrSummary {
        output,
        text_output,
        verification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tools(gs: bool, pngquant: bool) -> ToolAvailability {
        ToolAvailability {
            ocrmypdf: Some(PathBuf::from("ocrmypdf")),
            tesseract: Some(PathBuf::from("tesseract")),
            ghostscript: gs.then(|| PathBuf::from("gs")),
            pngquant: pngquant.then(|| PathBuf::from("pngquant")),
            extra_path: Vec::new(),
        }
    }

    #[test]
    fn test_parse_languages() {
        assert_eq!(parse_languages("eng"), vec!["eng"]);
        assert_eq!(parse_languages("eng+fra"), vec!["eng", "fra"]);
        assert_eq!(parse_languages(" eng + +deu "), vec!["eng", "deu"]);
        assert_eq!(parse_languages(""), vec!["eng"]);
        assert_eq!(parse_languages("+"), vec!["eng"]);
    }

    #[test]
    fn test_output_beside() {
        assert_eq!(
            output_beside(Path::new("/scans/doc.pdf")),
            PathBuf::from("/scans/doc_O.pdf")
        );
        assert_eq!(output_beside(Path::new("doc.pdf")), PathBuf::from("doc_O.pdf"));
    }

    #[test]
    fn test_default_optimize_follows_ghostscript() {
        let options = OcrOptions::default();
        assert_eq!(options.plan(&tools(true, false)).optimize, 1);

        let plan = options.plan(&tools(false, false));
        assert_eq!(plan.optimize, 0);
        assert_eq!(plan.notes.len(), 1);
    }

    #[test]
    fn test_explicit_optimize_without_ghostscript() {
        let options = OcrOptions {
            optimize: Some(1),
            ..OcrOptions::default()
        };
        assert_eq!(options.plan(&tools(false, true)).optimize, 0);

        let none = OcrOptions {
            optimize: Some(0),
            ..OcrOptions::default()
        };
        let plan = none.plan(&tools(false, false));
        assert_eq!(plan.optimize, 0);
        assert!(plan.notes.is_empty());
    }

    #[test]
    fn test_high_optimize_needs_pngquant() {
        let options = OcrOptions {
            optimize: Some(3),
            ..OcrOptions::default()
        };
        assert_eq!(options.plan(&tools(true, true)).optimize, 3);
        assert_eq!(options.plan(&tools(true, false)).optimize, 1);

        let clamped = OcrOptions {
            optimize: Some(9),
            ..OcrOptions::default()
        };
        assert_eq!(clamped.plan(&tools(true, true)).optimize, 3);
    }

    #[test]
    fn test_redo_ocr_disables_deskew() {
        let options = OcrOptions {
            redo_ocr: true,
            ..OcrOptions::default()
        };
        let plan = options.plan(&tools(true, false));
        assert!(plan.redo_ocr);
        assert!(!plan.deskew);
    }

    #[test]
    fn test_force_ocr_wins_over_redo() {
        let options = OcrOptions {
            redo_ocr: true,
            force_ocr: true,
            ..OcrOptions::default()
        };
        let plan = options.plan(&tools(true, false));
        assert!(plan.force_ocr);
        assert!(!plan.redo_ocr);
        assert!(!plan.deskew);
        assert_eq!(plan.notes.len(), 2);
    }

    #[test]
    fn test_ocrmypdf_args() {
        let options = OcrOptions {
            input: PathBuf::from("in.pdf"),
            languages: vec!["eng".to_string(), "fra".to_string()],
            jobs: Some(2),
            pages: Some("1-3".to_string()),
            progress_bar: false,
            ..OcrOptions::default()
        };
        let plan = options.plan(&tools(true, false));
        let args = ocrmypdf_args(&options, &plan, Path::new("out.pdf"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "-l",
                "eng+fra",
                "--optimize",
                "1",
                "--deskew",
                "--no-progress-bar",
                "--jobs",
                "2",
                "--pages",
                "1-3",
                "in.pdf",
                "out.pdf",
            ]
        );
    }

    #[test]
    fn test_require_ocr() {
        assert!(tools(false, false).require_ocr().is_ok());

        let no_tesseract = ToolAvailability {
            tesseract: None,
            ..tools(true, true)
        };
        assert!(matches!(
            no_tesseract.require_ocr(),
            Err(Error::ToolNotFound { ref tool, .. }) if tool == "tesseract"
        ));

        let no_ocrmypdf = ToolAvailability {
            ocrmypdf: None,
            ..tools(true, true)
        };
        assert!(matches!(
            no_ocrmypdf.require_ocr(),
            Err(Error::ToolNotFound { ref tool, .. }) if tool == "ocrmypdf"
        ));
    }
}
