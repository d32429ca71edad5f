//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration - where templates live, where compiled output goes,
/// and how strictly the compiler behaves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Root directory for theme templates (`@template` and name-based rendering)
    pub templates_root: PathBuf,

    /// Directory for compiled artifacts; defaults to the user cache dir
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Development mode: recompile on every render, ignoring cached artifacts
    #[serde(default)]
    pub dev: bool,

    /// Extension appended to template names given without one
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Defer unknown modifier names to render time instead of rejecting them
    /// at compile time
    #[serde(default)]
    pub permissive_modifiers: bool,
}

fn default_extension() -> String {
    "mt".to_string()
}

impl EngineOptions {
    /// Create options with the given templates root and defaults for the rest
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Self {
            templates_root: templates_root.into(),
            cache_dir: None,
            dev: false,
            extension: default_extension(),
            permissive_modifiers: false,
        }
    }

    /// Set the compiled-artifact directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set development mode
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Set the default template extension (without the leading dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Allow unregistered modifier names at compile time
    pub fn with_permissive_modifiers(mut self, permissive: bool) -> Self {
        self.permissive_modifiers = permissive;
        self
    }

    /// Resolve the effective cache directory
    ///
    /// Resolution order:
    /// 1. Explicit `cache_dir`
    /// 2. `dirs::cache_dir()/mars/templates`
    /// 3. `std::env::temp_dir()/mars/templates`
    pub fn resolve_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("mars")
            .join("templates")
    }
}

/// Cache-key type tag distinguishing ordinary templates from mail variants
/// that reuse the same compiler chain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Template,
    Mail,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Template => "template",
            TemplateKind::Mail => "mail",
        }
    }
}

impl Default for TemplateKind {
    fn default() -> Self {
        TemplateKind::Template
    }
}
