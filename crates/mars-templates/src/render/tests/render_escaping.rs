//! Escaping behavior across the three output syntaxes

use super::helpers::render_str;
use crate::scope::Scope;

fn html_scope() -> Scope {
    Scope::new()
        .with_value("markup", "<b>bold & brash</b>")
        .with_value("quoted", r#"say "hi" & 'bye'"#)
        .with_value("multiline", "one\ntwo")
}

#[test]
fn test_default_output_is_escaped() {
    let mut scope = html_scope();
    let result = render_str("{{ $markup }}", &mut scope).unwrap();
    assert_eq!(result, "&lt;b&gt;bold &amp; brash&lt;/b&gt;");
}

#[test]
fn test_triple_brace_escapes_twice() {
    let mut scope = html_scope();
    let result = render_str("{{{ $markup }}}", &mut scope).unwrap();
    assert_eq!(result, "&amp;lt;b&amp;gt;bold &amp;amp; brash&amp;lt;/b&amp;gt;");
}

#[test]
fn test_bang_block_never_escapes() {
    let mut scope = html_scope();
    let result = render_str("{! $markup !}", &mut scope).unwrap();
    assert_eq!(result, "<b>bold & brash</b>");
}

#[test]
fn test_raw_pipe_suppresses_default_escape() {
    let mut scope = html_scope();
    let result = render_str("{{ $markup | raw }}", &mut scope).unwrap();
    assert_eq!(result, "<b>bold & brash</b>");
}

#[test]
fn test_raw_pipe_suppresses_double_escape() {
    let mut scope = html_scope();
    let result = render_str("{{{ $markup | raw }}}", &mut scope).unwrap();
    assert_eq!(result, "<b>bold & brash</b>");
}

#[test]
fn test_quotes_are_escaped() {
    let mut scope = html_scope();
    let result = render_str("{{ $quoted }}", &mut scope).unwrap();
    assert_eq!(result, "say &quot;hi&quot; &amp; &#39;bye&#39;");
}

#[test]
fn test_escaping_runs_after_modifiers() {
    let mut scope = html_scope();
    let result = render_str("{{ $markup | upper }}", &mut scope).unwrap();
    assert_eq!(result, "&lt;B&gt;BOLD &amp; BRASH&lt;/B&gt;");
}

#[test]
fn test_nl2br_markup_needs_raw() {
    let mut scope = html_scope();
    // Without raw the inserted tags are escaped like any other value
    let escaped = render_str("{{ $multiline | nl2br }}", &mut scope).unwrap();
    assert_eq!(escaped, "one&lt;br /&gt;\ntwo");

    let raw = render_str("{{ $multiline | nl2br | raw }}", &mut scope).unwrap();
    assert_eq!(raw, "one<br />\ntwo");
}

#[test]
fn test_raw_position_in_chain_is_irrelevant() {
    let mut scope = html_scope();
    let early = render_str("{{ $markup | raw | upper }}", &mut scope).unwrap();
    let late = render_str("{{ $markup | upper | raw }}", &mut scope).unwrap();
    assert_eq!(early, "<B>BOLD & BRASH</B>");
    assert_eq!(early, late);
}

#[test]
fn test_escaped_values_inside_loop() {
    let mut scope = Scope::new().with_value(
        "tags",
        vec!["<i>", "<em>"],
    );
    let result = render_str("@foreach($tags as $t){{ $t }};@endforeach", &mut scope).unwrap();
    assert_eq!(result, "&lt;i&gt;;&lt;em&gt;;");
}
