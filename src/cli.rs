//! Helpers shared by the command-line front ends

use crate::error::{Error, Result, EXIT_OK, EXIT_USER};
use clap::error::ErrorKind;
use std::process::ExitCode;

/// Parse command-line arguments.
///
/// Help and version requests print and exit 0; every other parse failure
/// prints the clap message and exits 1.
pub fn parse_args<T: clap::Parser>() -> std::result::Result<T, ExitCode> {
    T::try_parse().map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::from(EXIT_OK),
            _ => ExitCode::from(EXIT_USER),
        }
    })
}

/// Print an error the way every tool reports it and return its exit code
pub fn report(error: &Error) -> ExitCode {
    eprintln!("Error: {}", error);
    ExitCode::from(error.exit_code())
}

/// Run CPU-bound PDF work off the async runtime
pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("Task join error: {}", e))))?
}
