//! Filesystem port for file I/O operations.

use std::path::{Path, PathBuf};

use crate::error::PortError;

/// Provides filesystem access for reading, writing and walking files.
///
/// Abstracting the filesystem allows deterministic replay and testing
/// without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Lists regular files under `root`, sorted. Only direct children are
    /// returned unless `recursive` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a readable directory.
    fn walk(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>, PortError>;
}
