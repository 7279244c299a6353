//! `codesummariser summarise` command.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use tracing::info;

use crate::cli::RunArgs;
use crate::context::ServiceContext;
use crate::error::SummariserError;
use crate::pipeline::Summariser;
use crate::store::SummaryStore;
use crate::tokens::{estimate_cost, TokenCounter};

use super::{discover_files, read_sources, run_settings};

const CONFIRM_PROMPT: &str = "Do you wish to continue with summarisation? [Y]/N...";

/// Execute the `summarise` command.
///
/// Prints the cost estimate, asks for confirmation unless `--yes` was
/// given, summarises new and changed files, and rewrites the store.
///
/// # Errors
///
/// Returns an error string if settings are invalid, the user declines, the
/// store cannot be loaded or saved, or any file failed to summarise.
pub async fn run(ctx: &ServiceContext, args: &RunArgs) -> Result<(), String> {
    let started = Instant::now();
    let settings = run_settings(ctx, args)?;
    let counter = TokenCounter::for_model(&settings.model).map_err(|e| e.to_string())?;

    let existing = SummaryStore::load(
        ctx.fs.as_ref(),
        &settings.summary_store,
        settings.always_check_existing_summaries,
    )
    .map_err(|e| e.to_string())?;

    let files = discover_files(ctx, &settings)?;
    if files.is_empty() {
        println!("No code files found with extensions {}.", settings.code_exts.join(", "));
        return Ok(());
    }

    let estimate = estimate_cost(&read_sources(ctx, &files), &counter, settings.cost_per_1k_tokens);
    println!("{estimate}");

    if !args.yes {
        let confirmed =
            confirm(io::stdin().lock(), io::stdout().lock()).map_err(|e| e.to_string())?;
        if !confirmed {
            return Err(SummariserError::Cancelled.to_string());
        }
    }

    let summariser = Summariser::new(ctx.llm.as_ref(), &counter, &settings);
    let (fresh, report) = summariser.summarise_files(ctx.fs.as_ref(), &files, &existing).await;

    let mut store = existing;
    store.merge(fresh);
    store.save(ctx.fs.as_ref(), &settings.summary_store).map_err(|e| e.to_string())?;

    println!("{report}. Summaries written to {}", settings.summary_store.display());
    info!(elapsed_secs = started.elapsed().as_secs_f64(), "summarisation run complete");

    if report.has_failures() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(path, reason)| format!("  {}: {reason}", path.display()))
            .collect();
        return Err(format!(
            "{} file(s) could not be summarised:\n{}",
            report.failed.len(),
            failed.join("\n")
        ));
    }
    Ok(())
}

/// Asks the user to confirm the run. Only `y` or `Y` continues.
fn confirm(mut input: impl BufRead, mut output: impl Write) -> io::Result<bool> {
    write!(output, "{CONFIRM_PROMPT}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
