//! Template compilation
//!
//! Runs the full chain for one file: parse, modifier validation, include
//! resolution. The product is a [`CompiledTemplate`], the unit the cache
//! stores on disk. Artifacts carry no timestamps or machine state beyond
//! the resolved source paths, so compiling the same file twice yields
//! byte-identical JSON.

mod resolve;

use crate::error::{Result, TemplateError};
use crate::options::TemplateKind;
use crate::render::modifiers::ModifierSet;
use crate::syntax::ast::{Expr, Node, Program};
use crate::syntax::parse;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Artifact schema version; bump on any change to the compiled tree shape.
/// Artifacts with another version are treated as cache misses and rebuilt.
pub const SCHEMA_VERSION: &str = "1";

/// A compiled template as stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledTemplate {
    pub schema_version: String,
    /// Absolute path of the source file this was compiled from
    pub source: PathBuf,
    pub kind: TemplateKind,
    pub program: Program,
}

/// Inputs for compiling one file
#[derive(Debug, Clone, Copy)]
pub struct CompileParams<'a> {
    /// Absolute path of the template file; `@include` targets resolve
    /// against its parent directory
    pub source: &'a Path,
    pub kind: TemplateKind,
    /// Theme root that `@template` targets resolve against
    pub templates_root: &'a Path,
    /// Extension appended to include and template names
    pub extension: &'a str,
}

/// Compile a template file
pub fn compile_file(
    params: CompileParams<'_>,
    modifiers: &ModifierSet,
    permissive_modifiers: bool,
) -> Result<CompiledTemplate> {
    let text = std::fs::read_to_string(params.source).map_err(|cause| {
        TemplateError::SourceRead {
            path: params.source.to_path_buf(),
            reason: cause.to_string(),
        }
    })?;
    compile_source(&text, params, modifiers, permissive_modifiers)
}

/// Compile template source text
///
/// With `permissive_modifiers` unset, every modifier named anywhere in the
/// template must be registered; otherwise unknown names are deferred and
/// fail only if the render actually reaches them.
pub fn compile_source(
    text: &str,
    params: CompileParams<'_>,
    modifiers: &ModifierSet,
    permissive_modifiers: bool,
) -> Result<CompiledTemplate> {
    let mut program = parse(text)?;

    if !permissive_modifiers {
        validate_modifiers(&program, modifiers)?;
    }

    resolve::resolve_includes(
        &mut program,
        params.source,
        params.templates_root,
        params.extension,
    )?;

    Ok(CompiledTemplate {
        schema_version: SCHEMA_VERSION.to_string(),
        source: params.source.to_path_buf(),
        kind: params.kind,
        program,
    })
}

/// Check that every modifier call in the program names a registered modifier
fn validate_modifiers(program: &Program, modifiers: &ModifierSet) -> Result<()> {
    validate_nodes(&program.nodes, modifiers)
}

fn validate_nodes(nodes: &[Node], modifiers: &ModifierSet) -> Result<()> {
    for node in nodes {
        match node {
            Node::Output { expr, .. } => validate_expr(expr, modifiers)?,
            Node::If {
                arms, else_body, ..
            } => {
                for arm in arms {
                    validate_expr(&arm.condition, modifiers)?;
                    validate_nodes(&arm.body, modifiers)?;
                }
                validate_nodes(else_body, modifiers)?;
            }
            Node::Foreach {
                collection, body, ..
            } => {
                validate_expr(collection, modifiers)?;
                validate_nodes(body, modifiers)?;
            }
            Node::Data { value, .. } | Node::Global { value, .. } => {
                validate_expr(value, modifiers)?;
            }
            Node::Text(_) | Node::Include { .. } => {}
        }
    }
    Ok(())
}

fn validate_expr(expr: &Expr, modifiers: &ModifierSet) -> Result<()> {
    match expr {
        Expr::Call { name, args, line } => {
            if !modifiers.contains(name) {
                return Err(TemplateError::UnknownModifier {
                    name: name.clone(),
                    line: *line,
                });
            }
            for arg in args {
                validate_expr(arg, modifiers)?;
            }
            Ok(())
        }
        Expr::Unary { operand, .. } => validate_expr(operand, modifiers),
        Expr::Binary { lhs, rhs, .. } => {
            validate_expr(lhs, modifiers)?;
            validate_expr(rhs, modifiers)
        }
        Expr::Str(_)
        | Expr::Int(_)
        | Expr::Float(_)
        | Expr::Bool(_)
        | Expr::Var { .. }
        | Expr::Lang { .. } => Ok(()),
    }
}
