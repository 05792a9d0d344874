//! sumai - ask questions about a document and extract its metadata

use clap::Parser;
use pdf_tools::cli::{parse_args, report};
use pdf_tools::config::QaConfig;
use pdf_tools::qa::{canonical_doc_filename_today, load_document, CompletionClient, DocumentMeta};
use pdf_tools::source::{same_file, write_atomic};
use pdf_tools::{logging, Error, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "sumai",
    version,
    about = "Answer questions about a document using an OpenAI-compatible API",
    after_help = "Examples:\n  \
        sumai -i out.json -q \"What is the invoice total?\"\n  \
        sumai -i notes.txt -e\n  \
        sumai -i notes.txt -c\n\n\
        Environment:\n  \
        OPENAI_API_KEY   API key (required)\n  \
        OPENAI_BASE_URL  API root (default: https://api.openai.com/v1)\n  \
        SUMAI_MODEL      default model"
)]
struct Args {
    /// Document: .txt or .json (e.g. from pdfextract -t)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Question to answer from the document
    #[arg(short, long, value_name = "Q")]
    question: Option<String>,

    /// Extract title, date/time, and a one-sentence summary (print to stdout)
    #[arg(short = 'e', long = "extract-meta")]
    extract_meta: bool,

    /// Write metadata to <input stem>.json next to the input
    #[arg(short = 'j', long = "extract-json")]
    extract_json: bool,

    /// Write metadata to YYYY-mm-dd_Document-title.json next to the input
    #[arg(short = 'c', long = "extract-json-canonical")]
    extract_json_canonical: bool,

    /// Model name (default: SUMAI_MODEL or gpt-4o-mini)
    #[arg(long)]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn wants_meta(&self) -> bool {
        self.extract_meta || self.extract_json || self.extract_json_canonical
    }
}

fn write_meta(path: &Path, meta: &DocumentMeta) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!("Wrote: {}", path.display());
    Ok(())
}

fn beside(input: &Path, file_name: &str) -> PathBuf {
    input.with_file_name(file_name)
}

/// `<stem>.json` next to the input, refused when that is the input itself
fn json_target(input: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let path = beside(input, &format!("{}.json", stem));
    if same_file(&path, input) {
        return Err(Error::Usage(format!(
            "Refusing to overwrite the input document {}",
            path.display()
        )));
    }
    Ok(path)
}

async fn run(args: Args) -> Result<()> {
    if args.question.is_none() && !args.wants_meta() {
        return Err(Error::Usage(
            "At least one of -e/--extract-meta, -j/--extract-json, \
             -c/--extract-json-canonical, or -q/--question is required"
                .to_string(),
        ));
    }
    let json_path = if args.extract_json {
        Some(json_target(&args.input)?)
    } else {
        None
    };

    let mut config = QaConfig::from_env();
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    let client = CompletionClient::new(&config)?;

    let document = load_document(&args.input)?;
    tracing::debug!("Loaded {} characters from {}", document.chars().count(), args.input.display());

    if args.wants_meta() {
        let meta = client.extract_meta(&document, config.meta_max_chars).await?;
        if args.extract_meta {
            println!("Title: {}", meta.title.as_deref().unwrap_or("(none)"));
            println!("Date/time: {}", meta.date_time.as_deref().unwrap_or("(none)"));
            println!("Summary: {}", meta.summary.as_deref().unwrap_or("(none)"));
            if args.question.is_some() {
                println!();
            }
        }
        if let Some(path) = &json_path {
            write_meta(path, &meta)?;
        }
        if args.extract_json_canonical {
            let path = beside(&args.input, &canonical_doc_filename_today(&meta, ".json"));
            write_meta(&path, &meta)?;
        }
    }

    if let Some(question) = &args.question {
        let answer = client.ask(&document, question).await?;
        println!("{}", answer);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    logging::init("sumai", args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
