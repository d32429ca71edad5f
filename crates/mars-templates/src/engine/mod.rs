//! Engine facade: compile-or-reuse, then render
//!
//! The engine ties the pieces together: it locates template files under the
//! theme's templates root, keeps compiled programs in a [`CompiledStore`],
//! and executes them against a caller-supplied [`Scope`]. All methods take
//! `&self`; the scope carries all per-render mutability, so one engine can
//! be shared across threads.

use std::path::{Path, PathBuf};

use crate::cache::CompiledStore;
use crate::compile::{self, CompileParams, CompiledTemplate};
use crate::error::{Result, TemplateError};
use crate::options::{EngineOptions, TemplateKind};
use crate::path::ensure_safe_template_name;
use crate::render::modifiers::ModifierSet;
use crate::render::{render_program, IncludeLoader, RenderContext};
use crate::scope::Scope;
use crate::syntax::ast::Program;

/// Per-call rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Cache-key tag; mail templates keep separate artifacts
    pub kind: TemplateKind,
    /// Overrides the engine-wide dev flag for this call when set
    pub dev: Option<bool>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: TemplateKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = Some(dev);
        self
    }
}

/// Template engine for one theme
pub struct Engine {
    options: EngineOptions,
    store: CompiledStore,
    modifiers: ModifierSet,
}

impl Engine {
    /// Create an engine, opening (and creating) its cache directory
    pub fn new(options: EngineOptions) -> Result<Self> {
        let store = CompiledStore::open(options.resolve_cache_dir())?;
        Ok(Self {
            options,
            store,
            modifiers: ModifierSet::builtins(),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> &CompiledStore {
        &self.store
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// Mutable access for registering custom modifiers
    pub fn modifiers_mut(&mut self) -> &mut ModifierSet {
        &mut self.modifiers
    }

    /// Render a template by name, resolved under the templates root
    ///
    /// Names follow the same safety rules as `@template(...)`: relative,
    /// no traversal, extension appended.
    pub fn render_name(&self, name: &str, scope: &mut Scope) -> Result<String> {
        self.render_name_with(name, scope, &RenderOptions::default())
    }

    pub fn render_name_with(
        &self,
        name: &str,
        scope: &mut Scope,
        opts: &RenderOptions,
    ) -> Result<String> {
        let source = self.locate(name)?;
        self.render_file_with(&source, scope, opts)
    }

    /// Render a template file by path
    pub fn render_file(&self, path: &Path, scope: &mut Scope) -> Result<String> {
        self.render_file_with(path, scope, &RenderOptions::default())
    }

    pub fn render_file_with(
        &self,
        path: &Path,
        scope: &mut Scope,
        opts: &RenderOptions,
    ) -> Result<String> {
        // Canonical paths keep cache keys stable across spellings
        let source = canonical(path)?;
        let dev = opts.dev.unwrap_or(self.options.dev);
        let compiled = self.load_program(&source, opts.kind, dev)?;
        let loader = EngineLoader {
            engine: self,
            kind: opts.kind,
            dev,
        };
        let ctx = RenderContext::new(&self.modifiers, &loader);
        render_program(&compiled.program, scope, &ctx)
    }

    /// Render template source text directly, without touching the cache
    ///
    /// Include targets resolve against the templates root; included files
    /// themselves still go through the cache.
    pub fn render_str(&self, text: &str, scope: &mut Scope) -> Result<String> {
        let source = self.options.templates_root.join("<inline>");
        let params = CompileParams {
            source: &source,
            kind: TemplateKind::Template,
            templates_root: &self.options.templates_root,
            extension: &self.options.extension,
        };
        let compiled =
            compile::compile_source(text, params, &self.modifiers, self.options.permissive_modifiers)?;
        let loader = EngineLoader {
            engine: self,
            kind: TemplateKind::Template,
            dev: self.options.dev,
        };
        let ctx = RenderContext::new(&self.modifiers, &loader);
        render_program(&compiled.program, scope, &ctx)
    }

    /// Compile a template file and persist its artifact without rendering
    pub fn compile_file(&self, path: &Path, kind: TemplateKind) -> Result<Program> {
        let source = canonical(path)?;
        let compiled = self.compile(&source, kind)?;
        Ok(compiled.program)
    }

    /// Drop every cached artifact; returns how many were removed
    pub fn clear_cache(&self) -> Result<usize> {
        self.store.clear()
    }

    /// Resolve a template name to an absolute source path
    fn locate(&self, name: &str) -> Result<PathBuf> {
        ensure_safe_template_name(Path::new(name)).map_err(|cause| {
            TemplateError::TemplatePathEscape {
                name: name.to_string(),
                reason: cause.to_string(),
            }
        })?;
        let file_name = format!("{}.{}", name, self.options.extension);
        let path = self.options.templates_root.join(file_name);
        if !path.is_file() {
            return Err(TemplateError::TemplateNotFound {
                name: name.to_string(),
                path,
            });
        }
        canonical(&path)
    }

    /// Reuse a fresh cached artifact or compile and persist a new one
    fn load_program(
        &self,
        source: &Path,
        kind: TemplateKind,
        dev: bool,
    ) -> Result<CompiledTemplate> {
        if !dev && self.store.is_fresh(source, kind) {
            if let Some(compiled) = self.store.load(source, kind) {
                return Ok(compiled);
            }
        }
        self.compile(source, kind)
    }

    fn compile(&self, source: &Path, kind: TemplateKind) -> Result<CompiledTemplate> {
        let params = CompileParams {
            source,
            kind,
            templates_root: &self.options.templates_root,
            extension: &self.options.extension,
        };
        let compiled =
            compile::compile_file(params, &self.modifiers, self.options.permissive_modifiers)?;
        self.store.write(&compiled)?;
        Ok(compiled)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|cause| TemplateError::SourceRead {
        path: path.to_path_buf(),
        reason: cause.to_string(),
    })
}

/// Loads `@include`/`@template` targets through the engine's cache
struct EngineLoader<'a> {
    engine: &'a Engine,
    kind: TemplateKind,
    dev: bool,
}

impl IncludeLoader for EngineLoader<'_> {
    fn load(&self, path: &Path) -> Result<Program> {
        let compiled = self.engine.load_program(path, self.kind, self.dev)?;
        Ok(compiled.program)
    }
}
