//! Command dispatch and handlers.

pub mod estimate;
pub mod prune;
pub mod show;
pub mod summarise;

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::cassette::session::RecordingSession;
use crate::cli::{Command, RunArgs};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::discover::{discover, flatten};
use crate::language::Language;

/// Environment variable naming the directory runs are recorded into.
pub const RECORD_ENV: &str = "CODESUMMARISER_RECORD";

/// Dispatch a parsed command to its handler.
///
/// When `CODESUMMARISER_RECORD` is set to a directory path, all port
/// interactions are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch(command: &Command) -> Result<(), String> {
    let (ctx, session) = if let Ok(path) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording_at(PathBuf::from(path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let result = dispatch_with_context(command, &ctx).await;

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<(), String> {
    match command {
        Command::Summarise(args) => summarise::run(ctx, args).await,
        Command::Estimate(args) => estimate::run(ctx, args),
        Command::Show { path, summary_store, config } => {
            show::run(ctx, path.as_deref(), summary_store.as_deref(), config.as_deref())
        }
        Command::Prune { summary_store, config } => {
            prune::run(ctx, summary_store.as_deref(), config.as_deref())
        }
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

/// Resolves settings from the config file and the run flags, then validates them.
fn run_settings(ctx: &ServiceContext, args: &RunArgs) -> Result<Settings, String> {
    let mut settings = Settings::load(ctx.fs.as_ref(), args.config.as_deref())
        .map_err(|e| e.to_string())?;
    args.apply_to(&mut settings);
    settings.validate().map_err(|e| e.to_string())?;
    Ok(settings)
}

/// Resolves the store location for `show` and `prune`.
fn store_path(
    ctx: &ServiceContext,
    summary_store: Option<&Path>,
    config: Option<&Path>,
) -> Result<PathBuf, String> {
    if let Some(path) = summary_store {
        return Ok(path.to_path_buf());
    }
    let settings = Settings::load(ctx.fs.as_ref(), config).map_err(|e| e.to_string())?;
    Ok(settings.summary_store)
}

/// Discovers the files a run will cover, in processing order.
fn discover_files(
    ctx: &ServiceContext,
    settings: &Settings,
) -> Result<Vec<(PathBuf, Language)>, String> {
    let languages = settings.languages().map_err(|e| e.to_string())?;
    let groups = discover(ctx.fs.as_ref(), &settings.search_dirs, &languages, settings.recursive)
        .map_err(|e| e.to_string())?;
    Ok(flatten(&groups))
}

/// Reads every file for the cost estimate. Unreadable files are logged and
/// left out.
fn read_sources(ctx: &ServiceContext, files: &[(PathBuf, Language)]) -> Vec<(PathBuf, String)> {
    files
        .iter()
        .filter_map(|(path, _)| match ctx.fs.read_to_string(path) {
            Ok(contents) => Some((path.clone(), contents)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file for estimate");
                None
            }
        })
        .collect()
}
