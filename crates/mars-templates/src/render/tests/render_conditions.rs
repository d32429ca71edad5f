//! Conditional rendering: @if chains, truthiness, boolean operators

use super::helpers::{render_str, simple_scope};
use crate::scope::Scope;
use toml::toml;

#[test]
fn test_if_takes_true_branch() {
    let mut scope = simple_scope();
    let result = render_str("@if($enabled)on@else off@endif", &mut scope).unwrap();
    assert_eq!(result, "on");
}

#[test]
fn test_if_takes_else_branch() {
    let mut scope = simple_scope();
    let result = render_str("@if($disabled)on@else off@endif", &mut scope).unwrap();
    assert_eq!(result, " off");
}

#[test]
fn test_if_without_else_renders_nothing() {
    let mut scope = simple_scope();
    let result = render_str("[@if($disabled)on@endif]", &mut scope).unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn test_elseif_first_match_wins() {
    let data = toml! {
        grade = 75
    };
    let mut scope = Scope::from_table(data);
    let template =
        "@if($grade >= 90)A@elseif($grade >= 70)B@elseif($grade >= 50)C@else F@endif";
    let result = render_str(template, &mut scope).unwrap();
    assert_eq!(result, "B");
}

#[test]
fn test_truthiness() {
    let data = toml! {
        zero = 0
        zero_float = 0.0
        blank = ""
        text = "x"
        none = []
        some = [1]
        yes = true
        no = false
    };

    let cases = [
        ("zero", "F"),
        ("zero_float", "F"),
        ("blank", "F"),
        ("none", "F"),
        ("no", "F"),
        ("text", "T"),
        ("some", "T"),
        ("yes", "T"),
    ];

    for (name, expected) in cases {
        let mut scope = Scope::from_table(data.clone());
        let template = format!("@if(${})T@else F@endif", name);
        let result = render_str(&template, &mut scope).unwrap();
        assert_eq!(result.trim(), expected, "variable '{}'", name);
    }
}

#[test]
fn test_comparisons() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($count > 10)big@endif", &mut scope).unwrap(),
        "big"
    );
    assert_eq!(
        render_str("@if($count <= 41)small@else big@endif", &mut scope).unwrap(),
        " big"
    );
    assert_eq!(
        render_str("@if($count == 42)exact@endif", &mut scope).unwrap(),
        "exact"
    );
    assert_eq!(
        render_str("@if($count != 42)other@else same@endif", &mut scope).unwrap(),
        " same"
    );
    assert_eq!(
        render_str("@if('apple' < 'banana')sorted@endif", &mut scope).unwrap(),
        "sorted"
    );
}

#[test]
fn test_int_float_equality_promotes() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($count == 42.0)equal@endif", &mut scope).unwrap(),
        "equal"
    );
}

#[test]
fn test_boolean_operators() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($enabled && $count > 10)both@endif", &mut scope).unwrap(),
        "both"
    );
    assert_eq!(
        render_str("@if($disabled || $enabled)either@endif", &mut scope).unwrap(),
        "either"
    );
    assert_eq!(
        render_str("@if(!$disabled)negated@endif", &mut scope).unwrap(),
        "negated"
    );
}

#[test]
fn test_undefined_variable_is_falsy_in_condition() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($missing)yes@else no@endif", &mut scope).unwrap(),
        " no"
    );
    assert_eq!(
        render_str("@if(!$missing)inverted@endif", &mut scope).unwrap(),
        "inverted"
    );
    assert_eq!(
        render_str("@if($missing || $enabled)fallback@endif", &mut scope).unwrap(),
        "fallback"
    );
    assert_eq!(
        render_str("@if($missing && $enabled)never@else skipped@endif", &mut scope).unwrap(),
        " skipped"
    );
}

#[test]
fn test_undefined_path_is_falsy_in_condition() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($count.nothing)yes@else no@endif", &mut scope).unwrap(),
        " no"
    );
}

#[test]
fn test_condition_on_modifier_result() {
    let mut scope = Scope::new().with_value("padded", "   ");
    assert_eq!(
        render_str("@if(trim($padded))text@else blank@endif", &mut scope).unwrap(),
        " blank"
    );
}

#[test]
fn test_condition_with_arithmetic() {
    let mut scope = simple_scope();
    assert_eq!(
        render_str("@if($count * 2 == 84)doubled@endif", &mut scope).unwrap(),
        "doubled"
    );
}

#[test]
fn test_nested_if_blocks() {
    let mut scope = simple_scope();
    let template = "@if($enabled)@if($count > 40)deep@endif@endif";
    assert_eq!(render_str(template, &mut scope).unwrap(), "deep");
}
