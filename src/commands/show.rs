//! `codesummariser show` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::store::SummaryStore;
use crate::summary::FileSummary;

use super::store_path;

/// Execute the `show` command.
///
/// When `path` is provided, prints that file's summary.
/// When no `path` is given, lists every stored summary.
///
/// # Errors
///
/// Returns an error string if the store cannot be loaded or holds no
/// summary for `path`.
pub fn run(
    ctx: &ServiceContext,
    path: Option<&Path>,
    summary_store: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), String> {
    let store_path = store_path(ctx, summary_store, config)?;
    let store = SummaryStore::load(ctx.fs.as_ref(), &store_path, false).map_err(|e| e.to_string())?;

    if let Some(path) = path {
        let entry = lookup(&store, path)
            .ok_or_else(|| format!("no summary stored for {}", path.display()))?;
        print_entry(entry);
        return Ok(());
    }

    if store.is_empty() {
        println!("No summaries found in {}.", store_path.display());
        return Ok(());
    }
    for entry in store.iter() {
        print_entry(entry);
        println!();
    }
    println!("{} summaries in {}", store.len(), store_path.display());
    Ok(())
}

/// Finds `path` as given, or resolved against the working directory.
fn lookup<'a>(store: &'a SummaryStore, path: &Path) -> Option<&'a FileSummary> {
    store.get(path).or_else(|| {
        let absolute = std::env::current_dir().ok()?.join(path);
        store.get(&absolute)
    })
}

fn print_entry(entry: &FileSummary) {
    println!("{}", entry.path.display());
    println!("  hash: {}", entry.contents_hash);
    if entry.summary.is_empty() {
        println!("  (empty file)");
    } else {
        for line in entry.summary.lines() {
            println!("  {line}");
        }
    }
}
