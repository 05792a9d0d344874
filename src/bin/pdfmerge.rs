//! pdfmerge - merge PDF files and directories of PDFs into one document

use clap::Parser;
use pdf_tools::cli::{blocking, parse_args, report};
use pdf_tools::merge::{self, DEFAULT_PATTERN};
use pdf_tools::pdf::PageSelection;
use pdf_tools::{logging, Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "pdfmerge",
    version,
    about = "Merge PDF files and directories of PDFs into one document",
    after_help = "Examples:\n  \
        pdfmerge a.pdf b.pdf -o merged.pdf\n  \
        pdfmerge scans/ -o all.pdf --pattern 'invoice*.pdf'\n  \
        pdfmerge a.pdf b.pdf -r 1-3 -r all -o out.pdf\n  \
        pdfmerge --list scans/\n  \
        pdfmerge --info a.pdf"
)]
struct Args {
    /// PDF files or directories to merge, in order
    #[arg(value_name = "FILES-OR-DIRS", required_unless_present_any = ["list", "info"])]
    inputs: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long, default_value = "merged_output.pdf")]
    output: PathBuf,

    /// Page range for the input at the same position (e.g. 1-3,5 or all)
    #[arg(short = 'r', long = "range", value_name = "SPEC")]
    ranges: Vec<PageSelection>,

    /// Glob pattern for PDFs inside directory inputs
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// List PDFs in a directory with their page counts
    #[arg(short, long, value_name = "DIR", conflicts_with_all = ["inputs", "info"])]
    list: Option<PathBuf>,

    /// Show page count, title, and author of a PDF
    #[arg(short, long, value_name = "FILE", conflicts_with = "inputs")]
    info: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: Args) -> Result<()> {
    if let Some(dir) = args.list {
        let pattern = args.pattern.clone();
        let shown = dir.display().to_string();
        let listing = blocking(move || merge::list_pdfs(&dir, &pattern)).await?;
        if listing.is_empty() {
            return Err(Error::SourceNotFound {
                path: format!("no PDF files in {}", shown),
            });
        }
        println!("PDF files in {}:", shown);
        for (name, pages) in listing {
            println!("  - {}: {} pages", name, pages);
        }
        return Ok(());
    }

    if let Some(file) = args.info {
        let info = blocking(move || merge::pdf_info(&file)).await?;
        println!("PDF Information:");
        println!("  Filename: {}", info.filename);
        println!("  Pages: {}", info.pages);
        println!("  Title: {}", info.title.as_deref().unwrap_or("(none)"));
        println!("  Author: {}", info.author.as_deref().unwrap_or("(none)"));
        return Ok(());
    }

    let sources = merge::plan_sources(&args.inputs, &args.ranges, &args.pattern)?;
    tracing::debug!("Merging {} PDFs into {}", sources.len(), args.output.display());

    let output = args.output;
    blocking(move || merge::merge_pdfs(&sources, &output)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    logging::init("pdfmerge", args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
