//! Compiled-artifact cache
//!
//! Artifacts live in one flat directory, one JSON file per (source, kind)
//! pair. The file name embeds a digest of the absolute source path, so two
//! themes that both have a `header` template never collide, and the same
//! file compiled as `template` and as `mail` keeps two artifacts.
//!
//! Loading is best-effort: a missing, unreadable, corrupt or
//! schema-mismatched artifact is reported as a cache miss and the caller
//! recompiles. Writes go through a temp file in the cache directory and an
//! atomic rename, so readers never observe a half-written artifact.

use crate::compile::{CompiledTemplate, SCHEMA_VERSION};
use crate::error::{Result, TemplateError};
use crate::options::TemplateKind;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Length of the path digest kept in artifact file names
const KEY_DIGEST_LEN: usize = 16;

/// On-disk store for compiled templates
#[derive(Debug)]
pub struct CompiledStore {
    dir: PathBuf,
}

impl CompiledStore {
    /// Open the store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|cause| TemplateError::CacheWrite {
            path: dir.clone(),
            reason: cause.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact file name for a source path and kind
    ///
    /// `{stem}.{digest}.{kind}.json`. The stem is only there to keep the
    /// directory browsable; the digest of the absolute path is what makes
    /// the key unique.
    pub fn key(source: &Path, kind: TemplateKind) -> String {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());

        let digest = Sha256::digest(source.as_os_str().as_encoded_bytes());
        let hex: String = digest
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect();

        format!("{}.{}.{}.json", stem, &hex[..KEY_DIGEST_LEN], kind.as_str())
    }

    /// Full path of the artifact for a source path and kind
    pub fn artifact_path(&self, source: &Path, kind: TemplateKind) -> PathBuf {
        self.dir.join(Self::key(source, kind))
    }

    /// Whether a usable artifact exists for this source
    ///
    /// The artifact must exist and be at least as new as the source file.
    /// On filesystems without modification times the existence check alone
    /// decides.
    pub fn is_fresh(&self, source: &Path, kind: TemplateKind) -> bool {
        let artifact = self.artifact_path(source, kind);
        let artifact_meta = match std::fs::metadata(&artifact) {
            Ok(meta) => meta,
            Err(_) => return false,
        };
        let source_meta = match std::fs::metadata(source) {
            Ok(meta) => meta,
            Err(_) => return false,
        };
        match (artifact_meta.modified(), source_meta.modified()) {
            (Ok(artifact_mtime), Ok(source_mtime)) => artifact_mtime >= source_mtime,
            _ => true,
        }
    }

    /// Load the artifact for a source path, if it is usable
    ///
    /// Any read, parse or schema failure is a miss, never an error; the
    /// compiler output will simply replace the bad artifact.
    pub fn load(&self, source: &Path, kind: TemplateKind) -> Option<CompiledTemplate> {
        let path = self.artifact_path(source, kind);
        let text = std::fs::read_to_string(path).ok()?;
        let compiled: CompiledTemplate = serde_json::from_str(&text).ok()?;
        if compiled.schema_version != SCHEMA_VERSION {
            return None;
        }
        Some(compiled)
    }

    /// Write an artifact atomically, replacing any previous one
    ///
    /// The temp file is created inside the cache directory so the final
    /// rename never crosses a filesystem boundary.
    pub fn write(&self, compiled: &CompiledTemplate) -> Result<PathBuf> {
        use std::io::Write;

        let path = self.artifact_path(&compiled.source, compiled.kind);
        let write_err = |cause: String| TemplateError::CacheWrite {
            path: path.clone(),
            reason: cause,
        };

        let content = serde_json::to_string_pretty(compiled)
            .map_err(|cause| write_err(cause.to_string()))?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|cause| write_err(cause.to_string()))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|cause| write_err(cause.to_string()))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|cause| write_err(cause.to_string()))?;
        temp_file
            .persist(&path)
            .map_err(|cause| write_err(cause.to_string()))?;

        Ok(path)
    }

    /// Remove every artifact; returns how many were deleted
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Number of artifacts currently stored
    pub fn len(&self) -> usize {
        walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
