//! Render-time failure modes

use super::helpers::{nested_scope, render_str, simple_scope};
use crate::error::TemplateError;
use crate::render::{render_program, IncludeLoader, RenderContext, MAX_INCLUDE_DEPTH};
use crate::scope::Scope;
use crate::syntax::ast::{IncludeOrigin, Node, Program};
use std::path::Path;

#[test]
fn test_undefined_variable_in_value_position() {
    let mut scope = simple_scope();
    let err = render_str("{{ $ghost }}", &mut scope).unwrap_err();
    match err {
        TemplateError::UndefinedValue { name, line } => {
            assert_eq!(name, "$ghost");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_undefined_path_in_value_position() {
    let mut scope = nested_scope();
    let err = render_str("{{ $user.ghost }}", &mut scope).unwrap_err();
    match err {
        TemplateError::UndefinedValue { name, .. } => assert_eq!(name, "$user.ghost"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_undefined_variable_in_comparison() {
    let mut scope = simple_scope();
    let err = render_str("@if($ghost == 1)x@endif", &mut scope).unwrap_err();
    assert!(matches!(err, TemplateError::UndefinedValue { .. }));
}

#[test]
fn test_array_has_no_text_form() {
    let mut scope = nested_scope();
    let err = render_str("{{ $items }}", &mut scope).unwrap_err();
    match err {
        TemplateError::ArrayInValue { expr, line } => {
            assert_eq!(expr, "$items");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_table_has_no_text_form() {
    let mut scope = nested_scope();
    let err = render_str("{{ $user }}", &mut scope).unwrap_err();
    assert!(matches!(err, TemplateError::TableInValue { .. }));
}

#[test]
fn test_ordering_mixed_types_fails() {
    let mut scope = simple_scope();
    let err = render_str("@if($name > 5)x@endif", &mut scope).unwrap_err();
    match err {
        TemplateError::TypeMismatch { op, .. } => assert_eq!(op, ">"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_arithmetic_on_string_fails() {
    let mut scope = simple_scope();
    let err = render_str("{{ $name + 1 }}", &mut scope).unwrap_err();
    match err {
        TemplateError::TypeMismatch { op, reason, .. } => {
            assert_eq!(op, "+");
            assert!(reason.contains("a string"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_integer_division_by_zero() {
    let mut scope = simple_scope();
    let err = render_str("{{ 10 / 0 }}", &mut scope).unwrap_err();
    match err {
        TemplateError::TypeMismatch { op, reason, .. } => {
            assert_eq!(op, "/");
            assert_eq!(reason, "division by zero");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_negating_a_string_fails() {
    let mut scope = simple_scope();
    let err = render_str("{{ -$name }}", &mut scope).unwrap_err();
    assert!(matches!(err, TemplateError::TypeMismatch { .. }));
}

#[test]
fn test_modifier_failure_carries_line() {
    let mut scope = nested_scope();
    let err = render_str("\n\n{{ $items | trim }}", &mut scope).unwrap_err();
    match err {
        TemplateError::Modifier { name, line, .. } => {
            assert_eq!(name, "trim");
            assert_eq!(line, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Loader that answers every include with another include of the same path.
struct SelfInclude;

impl SelfInclude {
    fn node(path: &Path) -> Node {
        Node::Include {
            name: "loop".to_string(),
            origin: IncludeOrigin::Relative,
            path: Some(path.to_path_buf()),
            line: 1,
        }
    }
}

impl IncludeLoader for SelfInclude {
    fn load(&self, path: &Path) -> crate::error::Result<Program> {
        Ok(Program {
            nodes: vec![Self::node(path)],
        })
    }
}

#[test]
fn test_include_depth_limit() {
    let program = Program {
        nodes: vec![SelfInclude::node(Path::new("loop.mt"))],
    };
    let modifiers = crate::render::modifiers::ModifierSet::builtins();
    let ctx = RenderContext::new(&modifiers, &SelfInclude);
    let mut scope = Scope::new();
    let err = render_program(&program, &mut scope, &ctx).unwrap_err();
    match err {
        TemplateError::IncludeDepth { depth, .. } => assert_eq!(depth, MAX_INCLUDE_DEPTH),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unresolved_include_is_rejected() {
    // Parse alone leaves include targets unresolved; rendering such a
    // program is a bug in the calling code, not in the template.
    let mut scope = Scope::new();
    let err = render_str("@include('partial')", &mut scope).unwrap_err();
    match err {
        TemplateError::Syntax { message, .. } => {
            assert!(message.contains("partial"), "message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
