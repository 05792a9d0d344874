//! pdfextract - copy selected pages to a new PDF and/or extract their text

use clap::{Parser, ValueEnum};
use pdf_tools::cli::{blocking, parse_args, report};
use pdf_tools::extract::{extract, ExtractRequest, TextFormat, TextOutput};
use pdf_tools::pdf::PageSelection;
use pdf_tools::{logging, Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for TextFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => TextFormat::Plain,
            FormatArg::Json => TextFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pdfextract",
    version,
    about = "Extract pages from a PDF to a new PDF and/or to text",
    after_help = "Examples:\n  \
        pdfextract -i document.pdf -o out.pdf -p 2-5,8\n  \
        pdfextract -i document.pdf -p 1-5 -t out.json\n  \
        pdfextract -i document.pdf -p all -t out.txt --text-only"
)]
struct Args {
    /// Input PDF file
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long, default_value = "extracted.pdf")]
    output: PathBuf,

    /// Pages to extract: single (1,3,5), range (2-7), mixed (1,3-5,8), or all
    #[arg(short, long, visible_alias = "range", value_name = "SPEC")]
    pages: PageSelection,

    /// Also extract text to FILE (.txt or .json)
    #[arg(short = 't', long = "text", value_name = "FILE")]
    text_output: Option<PathBuf>,

    /// Text format (default: chosen by the text file's extension)
    #[arg(long, value_enum, requires = "text_output")]
    format: Option<FormatArg>,

    /// Write only the text output, no PDF
    #[arg(long, requires = "text_output")]
    text_only: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_request(self) -> Result<ExtractRequest> {
        let text_output = self.text_output.map(|path| {
            let mut out = TextOutput::new(path);
            if let Some(format) = self.format {
                out.format = format.into();
            }
            out
        });
        if self.text_only && text_output.is_none() {
            return Err(Error::Usage("--text-only needs -t/--text FILE".to_string()));
        }

        Ok(ExtractRequest {
            input: self.input,
            pages: self.pages,
            pdf_output: (!self.text_only).then_some(self.output),
            text_output,
        })
    }
}

async fn run(args: Args) -> Result<()> {
    let request = args.into_request()?;
    blocking(move || extract(&request)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    logging::init("pdfextract", args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
