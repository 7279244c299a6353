//! `codesummariser prune` command.

use std::path::Path;

use tracing::info;

use crate::context::ServiceContext;
use crate::store::SummaryStore;

use super::store_path;

/// Execute the `prune` command, dropping summaries of deleted files.
///
/// # Errors
///
/// Returns an error string if the store is missing, malformed, or cannot be
/// rewritten.
pub fn run(
    ctx: &ServiceContext,
    summary_store: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), String> {
    let store_path = store_path(ctx, summary_store, config)?;
    let mut store =
        SummaryStore::load(ctx.fs.as_ref(), &store_path, true).map_err(|e| e.to_string())?;

    let removed = store.retain_existing(|path| ctx.fs.exists(path));
    if removed.is_empty() {
        println!("Nothing to prune; all {} summaries are current.", store.len());
        return Ok(());
    }

    store.save(ctx.fs.as_ref(), &store_path).map_err(|e| e.to_string())?;
    for path in &removed {
        println!("removed {}", path.display());
    }
    info!(removed = removed.len(), kept = store.len(), "pruned summary store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::{LiveFileSystem, LiveLlmClient};
    use crate::summary::FileSummary;

    #[test]
    fn drops_entries_for_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept.sas");
        std::fs::write(&kept, "run;").unwrap();
        let gone = dir.path().join("gone.sas");
        let store_path = dir.path().join("summary.csv");

        let store: SummaryStore = vec![
            FileSummary::new(kept.clone(), "run;").with_summary("Kept."),
            FileSummary::new(gone.clone(), "quit;").with_summary("Gone."),
        ]
        .into_iter()
        .collect();
        store.save(&LiveFileSystem, &store_path).unwrap();

        let ctx = ServiceContext {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(LiveLlmClient::new()),
        };
        run(&ctx, Some(&store_path), None).unwrap();

        let pruned = SummaryStore::load(&LiveFileSystem, &store_path, true).unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(pruned.get(&kept).is_some());
        assert!(pruned.get(&gone).is_none());
    }
}
