//! Summary store: the CSV table of file summaries kept between runs.
//!
//! The file has a `path,summary,contents_hash` header and one row per file.
//! It is always rewritten whole, with rows ordered by path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SummariserError};
use crate::ports::FileSystem;
use crate::summary::FileSummary;

const HEADER: [&str; 3] = ["path", "summary", "contents_hash"];

/// In-memory view of the summary CSV, keyed by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStore {
    entries: BTreeMap<PathBuf, FileSummary>,
}

impl SummaryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store at `path`.
    ///
    /// A missing file yields an empty store unless `required` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is required but missing, unreadable, has
    /// the wrong header, or contains a malformed row.
    pub fn load(fs: &dyn FileSystem, path: &Path, required: bool) -> Result<Self> {
        if !fs.exists(path) {
            if required {
                return Err(SummariserError::Store {
                    path: path.to_path_buf(),
                    message: "does not exist and existing summaries are required".into(),
                });
            }
            info!(path = %path.display(), "no existing summary store, starting fresh");
            return Ok(Self::new());
        }

        let contents = fs
            .read_to_string(path)
            .map_err(|source| SummariserError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let store = Self::from_csv(&contents).map_err(|e| match e {
            SummariserError::Store { message, .. } => SummariserError::Store {
                path: path.to_path_buf(),
                message,
            },
            other => SummariserError::Store {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;
        info!(path = %path.display(), entries = store.len(), "loaded summary store");
        Ok(store)
    }

    /// Parses CSV text into a store. Later rows win over earlier rows with
    /// the same path.
    ///
    /// # Errors
    ///
    /// Returns an error on a wrong header or malformed rows.
    pub fn from_csv(contents: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(contents.as_bytes());

        let headers = reader.headers()?;
        if headers.iter().ne(HEADER) && !headers.is_empty() {
            return Err(SummariserError::Store {
                path: PathBuf::new(),
                message: format!(
                    "unexpected header {:?}, expected {:?}",
                    headers.iter().collect::<Vec<_>>(),
                    HEADER
                ),
            });
        }

        let mut store = Self::new();
        for row in reader.deserialize::<FileSummary>() {
            store.insert(row?);
        }
        Ok(store)
    }

    /// Renders the store as CSV, header first, rows ordered by path.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be encoded.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for summary in self.entries.values() {
            writer.serialize(summary)?;
        }
        let bytes = writer.into_inner().map_err(|e| SummariserError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| SummariserError::Store {
            path: PathBuf::new(),
            message: format!("encoded store is not UTF-8: {e}"),
        })
    }

    /// Writes the store to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let csv = self.to_csv()?;
        fs.write(path, &csv)
            .map_err(|source| SummariserError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), entries = self.len(), "saved summary store");
        Ok(())
    }

    /// Looks up the stored summary for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&FileSummary> {
        self.entries.get(path)
    }

    /// Inserts or replaces the entry for the summary's path.
    pub fn insert(&mut self, summary: FileSummary) -> Option<FileSummary> {
        self.entries.insert(summary.path.clone(), summary)
    }

    /// Merges `newer` over this store; entries in `newer` replace stale ones.
    pub fn merge(&mut self, newer: SummaryStore) {
        for (_, summary) in newer.entries {
            self.insert(summary);
        }
    }

    /// Drops entries whose path fails `keep`, returning the removed paths.
    pub fn retain_existing(&mut self, mut keep: impl FnMut(&Path) -> bool) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        self.entries.retain(|path, _| {
            let kept = keep(path);
            if !kept {
                debug!(path = %path.display(), "dropping summary for missing file");
                removed.push(path.clone());
            }
            kept
        });
        removed
    }

    /// Number of stored summaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over summaries ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &FileSummary> {
        self.entries.values()
    }
}

impl FromIterator<FileSummary> for SummaryStore {
    fn from_iter<T: IntoIterator<Item = FileSummary>>(iter: T) -> Self {
        let mut store = Self::new();
        for summary in iter {
            store.insert(summary);
        }
        store
    }
}
