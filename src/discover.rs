//! Finds the code files to summarise under the search directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SummariserError};
use crate::language::Language;
use crate::ports::FileSystem;

/// Files found for one configured extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup {
    /// Extension with leading dot, as configured.
    pub extension: String,
    /// Language the extension maps to.
    pub language: Language,
    /// Absolute, sorted, deduplicated paths.
    pub files: Vec<PathBuf>,
}

/// Walks `search_dirs` and groups matching files by extension, in the order
/// of `code_exts`. Extensions match case-sensitively.
///
/// Relative directories are resolved against the working directory.
///
/// # Errors
///
/// Returns an error if a search directory does not exist or cannot be walked.
pub fn discover(
    fs: &dyn FileSystem,
    search_dirs: &[PathBuf],
    code_exts: &[(String, Language)],
    recursive: bool,
) -> Result<Vec<CodeGroup>> {
    let mut found: Vec<BTreeSet<PathBuf>> = vec![BTreeSet::new(); code_exts.len()];

    for dir in search_dirs {
        let root = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir()?.join(dir)
        };
        if !fs.exists(&root) {
            return Err(SummariserError::Config(format!(
                "search directory {} does not exist",
                root.display()
            )));
        }
        let files = fs
            .walk(&root, recursive)
            .map_err(|source| SummariserError::Read {
                path: root.clone(),
                source,
            })?;
        debug!(dir = %root.display(), files = files.len(), recursive, "walked search directory");

        for file in files {
            if let Some(i) = code_exts.iter().position(|(ext, _)| has_extension(&file, ext)) {
                found[i].insert(file);
            }
        }
    }

    let groups: Vec<CodeGroup> = code_exts
        .iter()
        .zip(found)
        .map(|((extension, language), files)| CodeGroup {
            extension: extension.clone(),
            language: *language,
            files: files.into_iter().collect(),
        })
        .collect();

    for group in &groups {
        info!(extension = %group.extension, files = group.files.len(), "discovered code files");
    }
    Ok(groups)
}

/// Flattens groups into `(path, language)` pairs, group order preserved.
#[must_use]
pub fn flatten(groups: &[CodeGroup]) -> Vec<(PathBuf, Language)> {
    groups
        .iter()
        .flat_map(|g| g.files.iter().map(move |path| (path.clone(), g.language)))
        .collect()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    let wanted = ext.strip_prefix('.').unwrap_or(ext);
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == wanted)
}
