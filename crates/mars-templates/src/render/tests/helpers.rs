//! Shared fixtures for renderer tests

use crate::error::{Result, TemplateError};
use crate::render::modifiers::ModifierSet;
use crate::render::{render_program, IncludeLoader, RenderContext};
use crate::scope::Scope;
use crate::syntax::ast::Program;
use crate::syntax::parse;
use std::path::Path;
use toml::toml;

/// Loader for templates that must not reach any include
pub(super) struct NoIncludes;

impl IncludeLoader for NoIncludes {
    fn load(&self, path: &Path) -> Result<Program> {
        Err(TemplateError::IncludeNotFound {
            name: path.display().to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Parse and render source with the builtin modifiers
pub(super) fn render_str(src: &str, scope: &mut Scope) -> Result<String> {
    let modifiers = ModifierSet::builtins();
    render_with_modifiers(src, scope, &modifiers)
}

/// Parse and render source with a caller-provided modifier set
pub(super) fn render_with_modifiers(
    src: &str,
    scope: &mut Scope,
    modifiers: &ModifierSet,
) -> Result<String> {
    let program = parse(src)?;
    let ctx = RenderContext::new(modifiers, &NoIncludes);
    render_program(&program, scope, &ctx)
}

/// Scope with flat scalar values and a couple of language strings
pub(super) fn simple_scope() -> Scope {
    let data = toml! {
        name = "World"
        title = "My Title"
        count = 42
        price = 9.99
        enabled = true
        disabled = false
        empty = ""
    };
    Scope::from_table(data)
        .with_string("app_title", "Mars")
        .with_string("greeting", "Hello")
}

/// Scope with nested tables and arrays
pub(super) fn nested_scope() -> Scope {
    let data = toml! {
        items = ["a", "b", "c"]

        [user]
        name = "Ada"
        email = "ada@example.com"

        [[user.posts]]
        title = "First"

        [[user.posts]]
        title = "Second"
    };
    Scope::from_table(data)
}
