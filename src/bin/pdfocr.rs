//! pdfocr - add a searchable text layer to scanned PDFs

use clap::Parser;
use pdf_tools::cli::{parse_args, report};
use pdf_tools::config::ToolPaths;
use pdf_tools::ocr::{output_beside, parse_languages, run_ocr, OcrOptions, ToolAvailability};
use pdf_tools::{logging, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "pdfocr",
    version,
    about = "Deskew and OCR a scanned PDF into a searchable PDF (via ocrmypdf)",
    after_help = "Examples:\n  \
        pdfocr -i scan.pdf -o searchable.pdf\n  \
        pdfocr -i scan.pdf -O -l eng+fra --optimize 2\n  \
        pdfocr -i scan.pdf -O --force-ocr -T\n\n\
        Environment:\n  \
        TESSERACT_PATH, GHOSTSCRIPT_PATH, OCRMYPDF_PATH  tool locations"
)]
struct Args {
    /// Input PDF (scanned/image PDF)
    #[arg(short, long)]
    input: PathBuf,

    /// Output searchable PDF
    #[arg(short, long, default_value = "ocr_output.pdf", conflicts_with = "output_same_dir")]
    output: PathBuf,

    /// Save output next to the input as <name>_O.pdf
    #[arg(short = 'O', long)]
    output_same_dir: bool,

    /// Save extracted text to <input stem>.txt next to the input
    #[arg(short = 'T', long = "text")]
    save_text: bool,

    /// Disable deskew (deskew is on by default)
    #[arg(long)]
    no_deskew: bool,

    /// Tesseract language code(s), e.g. eng or eng+fra
    #[arg(short, long = "language", default_value = "eng")]
    language: String,

    /// Max parallel jobs (default: auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// OCR only these pages, e.g. 1-10 or 1,3,5 (others are copied unchanged)
    #[arg(short, long, value_name = "RANGES")]
    pages: Option<String>,

    /// Image optimization 0-3 (default: 1 if Ghostscript is found); 2-3 need pngquant
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=3))]
    optimize: Option<u8>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Remove an existing OCR layer and run again (disables deskew)
    #[arg(long)]
    force_overwrite: bool,

    /// Rasterize every page and run OCR
    #[arg(long)]
    force_ocr: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for OcrOptions {
    fn from(args: Args) -> Self {
        let output = if args.output_same_dir {
            output_beside(&args.input)
        } else {
            args.output
        };
        OcrOptions {
            input: args.input,
            output,
            deskew: !args.no_deskew,
            languages: parse_languages(&args.language),
            optimize: args.optimize,
            force_ocr: args.force_ocr,
            redo_ocr: args.force_overwrite,
            jobs: args.jobs,
            pages: args.pages,
            progress_bar: !args.no_progress,
            save_text: args.save_text,
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let options = OcrOptions::from(args);
    let tools = ToolAvailability::probe(&ToolPaths::from_env());
    run_ocr(&options, &tools).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    logging::init("pdfocr", args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
