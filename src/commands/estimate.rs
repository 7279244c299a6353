//! `codesummariser estimate` command.

use crate::cli::RunArgs;
use crate::context::ServiceContext;
use crate::tokens::{estimate_cost, TokenCounter};

use super::{discover_files, read_sources, run_settings};

/// Execute the `estimate` command: discovery and pricing only.
///
/// # Errors
///
/// Returns an error string if settings are invalid or discovery fails.
pub fn run(ctx: &ServiceContext, args: &RunArgs) -> Result<(), String> {
    let settings = run_settings(ctx, args)?;
    let counter = TokenCounter::for_model(&settings.model).map_err(|e| e.to_string())?;
    let files = discover_files(ctx, &settings)?;
    let estimate = estimate_cost(&read_sources(ctx, &files), &counter, settings.cost_per_1k_tokens);
    println!("Files: {}", estimate.files);
    println!("{estimate}");
    Ok(())
}
