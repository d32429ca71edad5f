//! Include resolution
//!
//! Rewrites every `@include` / `@template` node with the absolute path of
//! its target file. Resolution happens at compile time so a missing target
//! fails the compile of the file that names it, not some later render.
//!
//! `@include` is sibling-relative: the target lives next to the file being
//! compiled. `@template` is theme-relative: the target lives under the
//! templates root regardless of where the including file sits.

use crate::error::{Result, TemplateError};
use crate::path::ensure_safe_template_name;
use crate::syntax::ast::{IncludeOrigin, Node, Program};
use std::path::Path;

/// Resolve all include targets in `program`
///
/// `source` is the absolute path of the file being compiled. The configured
/// extension is appended to every target name.
pub(crate) fn resolve_includes(
    program: &mut Program,
    source: &Path,
    templates_root: &Path,
    extension: &str,
) -> Result<()> {
    resolve_nodes(&mut program.nodes, source, templates_root, extension)
}

fn resolve_nodes(
    nodes: &mut [Node],
    source: &Path,
    templates_root: &Path,
    extension: &str,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Include {
                name, origin, path, ..
            } => {
                let target = resolve_target(name, *origin, source, templates_root, extension)?;
                *path = Some(target);
            }
            Node::If {
                arms, else_body, ..
            } => {
                for arm in arms.iter_mut() {
                    resolve_nodes(&mut arm.body, source, templates_root, extension)?;
                }
                resolve_nodes(else_body, source, templates_root, extension)?;
            }
            Node::Foreach { body, .. } => {
                resolve_nodes(body, source, templates_root, extension)?;
            }
            Node::Text(_) | Node::Output { .. } | Node::Data { .. } | Node::Global { .. } => {}
        }
    }
    Ok(())
}

fn resolve_target(
    name: &str,
    origin: IncludeOrigin,
    source: &Path,
    templates_root: &Path,
    extension: &str,
) -> Result<std::path::PathBuf> {
    ensure_safe_template_name(Path::new(name)).map_err(|cause| {
        TemplateError::TemplatePathEscape {
            name: name.to_string(),
            reason: cause.to_string(),
        }
    })?;

    let file_name = format!("{}.{}", name, extension);
    let target = match origin {
        IncludeOrigin::Relative => source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&file_name),
        IncludeOrigin::Theme => templates_root.join(&file_name),
    };

    if !target.is_file() {
        return Err(match origin {
            IncludeOrigin::Relative => TemplateError::IncludeNotFound {
                name: name.to_string(),
                path: target,
            },
            IncludeOrigin::Theme => TemplateError::TemplateNotFound {
                name: name.to_string(),
                path: target,
            },
        });
    }

    Ok(target)
}
