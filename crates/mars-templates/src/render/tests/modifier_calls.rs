//! Modifier pipes and call-form application

use super::helpers::{render_str, render_with_modifiers, simple_scope};
use crate::error::TemplateError;
use crate::render::modifiers::ModifierSet;
use crate::scope::Scope;
use toml::Value;

#[test]
fn test_pipe_applies_left_to_right() {
    let mut scope = Scope::new().with_value("word", "  ab  ");
    let result = render_str("{{ $word | trim | upper }}", &mut scope).unwrap();
    assert_eq!(result, "AB");
}

#[test]
fn test_call_form_matches_pipe_form() {
    let mut scope = Scope::new().with_value("word", "  MiXeD  ");
    let piped = render_str("{{ $word | trim | lower }}", &mut scope).unwrap();
    let called = render_str("{{ lower(trim($word)) }}", &mut scope).unwrap();
    assert_eq!(piped, called);
    assert_eq!(piped, "mixed");
}

#[test]
fn test_modifier_on_literal() {
    let mut scope = Scope::new();
    let result = render_str("{{ 'shout' | upper }}", &mut scope).unwrap();
    assert_eq!(result, "SHOUT");
}

#[test]
fn test_length_of_array_and_string() {
    let mut scope = simple_scope().with_value("items", vec![1, 2, 3]);
    assert_eq!(render_str("{{ $items | length }}", &mut scope).unwrap(), "3");
    assert_eq!(render_str("{{ $name | length }}", &mut scope).unwrap(), "5");
}

#[test]
fn test_php_style_aliases() {
    let mut scope = Scope::new().with_value("word", "Kind");
    assert_eq!(
        render_str("{{ $word | strtoupper }}", &mut scope).unwrap(),
        "KIND"
    );
    assert_eq!(
        render_str("{{ $word | strtolower }}", &mut scope).unwrap(),
        "kind"
    );
}

#[test]
fn test_json_modifier() {
    let mut scope = Scope::new().with_value("flag", true);
    assert_eq!(render_str("{{ $flag | json }}", &mut scope).unwrap(), "true");

    let mut scope = Scope::new().with_value("items", vec!["a", "b"]);
    let result = render_str("{! $items | json !}", &mut scope).unwrap();
    assert_eq!(result, r#"["a","b"]"#);
}

#[test]
fn test_custom_modifier() {
    let mut modifiers = ModifierSet::builtins();
    modifiers
        .register("shout", |args| match args {
            [Value::String(text)] => Ok(Value::String(format!("{}!!", text.to_uppercase()))),
            _ => Err("shout expects one string".to_string()),
        })
        .unwrap();

    let mut scope = Scope::new().with_value("msg", "hey");
    let result =
        render_with_modifiers("{{ $msg | shout }}", &mut scope, &modifiers).unwrap();
    assert_eq!(result, "HEY!!");
}

#[test]
fn test_unknown_modifier_fails_at_render() {
    let mut scope = simple_scope();
    let err = render_str("{{ $name | sparkle }}", &mut scope).unwrap_err();
    match err {
        TemplateError::UnknownModifier { name, line } => {
            assert_eq!(name, "sparkle");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_modifier_with_extra_args() {
    let mut modifiers = ModifierSet::builtins();
    modifiers
        .register("wrap", |args| match args {
            [value, Value::String(open), Value::String(close)] => {
                let text = crate::render::modifiers::text_of(value)
                    .ok_or_else(|| "wrap expects a printable value".to_string())?;
                Ok(Value::String(format!("{open}{text}{close}")))
            }
            _ => Err("wrap expects a value and two strings".to_string()),
        })
        .unwrap();

    let mut scope = Scope::new().with_value("word", "core");
    let result =
        render_with_modifiers("{{ $word | wrap('[', ']') }}", &mut scope, &modifiers).unwrap();
    assert_eq!(result, "[core]");
}

#[test]
fn test_registering_raw_is_rejected() {
    let mut modifiers = ModifierSet::builtins();
    let err = modifiers.register("raw", |args| Ok(args[0].clone())).unwrap_err();
    assert!(matches!(err, TemplateError::ReservedModifier { .. }));
}

#[test]
fn test_raw_call_form_is_rejected() {
    let mut scope = simple_scope();
    let err = render_str("{{ raw($name) }}", &mut scope).unwrap_err();
    assert!(matches!(err, TemplateError::Syntax { .. }));
}
