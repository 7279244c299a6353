//! Core library entry for the `codesummariser` CLI.
//!
//! Walks directories of source code, prices the run, and writes a CSV of
//! per-file summaries produced by a language model. Summaries are keyed by
//! a content hash so unchanged files are never sent to the model twice.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod discover;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod ports;
pub mod splitter;
pub mod store;
pub mod summary;
pub mod tokens;

use clap::Parser;

/// Parse arguments into a [`cli::Cli`].
///
/// # Errors
///
/// Returns an error string (including clap's help and version output) when
/// parsing does not produce a command.
pub fn parse<I, T>(args: I) -> Result<cli::Cli, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    cli::Cli::try_parse_from(args).map_err(|err| err.to_string())
}

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub async fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = parse(args)?;
    commands::dispatch(&cli.command).await
}
