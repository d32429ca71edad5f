//! Test utilities for mars
//!
//! This crate provides shared testing utilities used across the mars workspace.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This ensures all test temporary files are centralized in a single location
/// that is gitignored and easy to clean up manually if needed.
///
/// # Returns
///
/// A `TempDir` instance that automatically cleans up on drop.
/// The directory is created at `.tmp/<random-name>` relative to the project root.
///
/// # Panics
///
/// Panics if:
/// - Unable to determine current directory
/// - Unable to create `.tmp/` directory
/// - Unable to create temporary subdirectory
///
/// # Examples
///
/// ```rust
/// use mars_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.txt");
/// std::fs::write(&file_path, "test data").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    let workspace_root = std::env::current_dir().expect("Failed to get current directory");

    let tmp_base = workspace_root.join(".tmp");

    // Ensure .tmp/ exists
    std::fs::create_dir_all(&tmp_base).expect("Failed to create .tmp directory");

    // Create unique subdirectory within .tmp/
    TempDir::new_in(&tmp_base).expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
///
/// Use this variant when you need proper error handling instead of panics.
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// A throwaway theme directory for engine tests
///
/// Creates a temporary directory holding a `templates/` root for template
/// sources and a sibling `cache/` directory for compiled artifacts, so a
/// test engine never touches the real user cache. Both live in the same
/// `TempDir` and disappear together on drop.
///
/// # Examples
///
/// ```rust
/// use mars_testkit::ThemeFixture;
///
/// let theme = ThemeFixture::new();
/// theme.write("hello.mt", "Hello {{ $name }}!");
/// assert!(theme.root().join("hello.mt").is_file());
/// ```
pub struct ThemeFixture {
    dir: TempDir,
}

impl ThemeFixture {
    /// Create the fixture with empty `templates/` and `cache/` directories
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or either subdirectory cannot be
    /// created.
    pub fn new() -> Self {
        let dir = temp_dir_in_workspace();
        std::fs::create_dir(dir.path().join("templates"))
            .expect("Failed to create templates directory");
        std::fs::create_dir(dir.path().join("cache")).expect("Failed to create cache directory");
        Self { dir }
    }

    /// The templates root, where engine options should point
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("templates")
    }

    /// The cache directory for compiled artifacts
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Write a template file under the templates root
    ///
    /// `name` is a relative path including the extension, for example
    /// `"hello.mt"` or `"pages/home.mt"`; parent directories are created
    /// as needed.
    ///
    /// # Returns
    ///
    /// The absolute path of the written file.
    ///
    /// # Panics
    ///
    /// Panics if directories or the file cannot be created.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create template subdirectory");
        }
        std::fs::write(&path, contents).expect("Failed to write template file");
        path
    }

    /// Canonical path of a previously written template file
    ///
    /// Cache keys hash the canonical source path, so tests that build
    /// artifacts by hand must use this form.
    ///
    /// # Panics
    ///
    /// Panics if the file does not exist.
    pub fn canonical(&self, name: &str) -> PathBuf {
        self.root()
            .join(name)
            .canonicalize()
            .expect("Failed to canonicalize template path")
    }
}

impl Default for ThemeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Push a file's modification time into the future
///
/// Freshness checks compare source and artifact mtimes; coarse filesystem
/// timestamp resolution makes "write, then write again" unreliable in
/// tests. Setting an explicit future mtime makes the ordering unambiguous.
///
/// # Panics
///
/// Panics if the file cannot be opened for writing or the timestamp cannot
/// be applied.
pub fn bump_mtime(path: &Path, seconds_ahead: u64) {
    let file = std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file for mtime update");
    let later = SystemTime::now() + Duration::from_secs(seconds_ahead);
    file.set_modified(later)
        .expect("Failed to set modification time");
}
