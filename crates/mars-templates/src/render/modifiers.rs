//! Modifier registry
//!
//! Modifiers are named value transformations reached through pipe stages
//! (`$x | trim`) or call syntax (`trim($x)`); both forms run the same
//! function with the subject as first argument. The engine ships a small
//! PHP-flavored builtin set and applications register their own on top.
//!
//! `raw` is not a modifier. The parser turns it into an escape-mode switch,
//! and the registry refuses the name so a registered function can never
//! shadow that meaning.

use crate::error::{Result, TemplateError};
use std::collections::HashMap;
use toml::Value;

/// A modifier implementation
///
/// Errors are plain strings; the renderer wraps them with the modifier name
/// and template line.
pub type ModifierFn = Box<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>;

/// Named modifier table
pub struct ModifierSet {
    map: HashMap<String, ModifierFn>,
}

impl std::fmt::Debug for ModifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModifierSet").field("names", &names).finish()
    }
}

impl ModifierSet {
    /// An empty set with no builtins
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// The builtin set
    ///
    /// `lower`/`upper`/`trim`/`length`/`nl2br`/`json`, plus the PHP names
    /// `strtolower`/`strtoupper` as aliases so templates written against
    /// the original framework keep working.
    pub fn builtins() -> Self {
        let mut set = Self::empty();
        set.insert("lower", |args| text_arg(args).map(|s| s.to_lowercase().into()));
        set.insert("strtolower", |args| {
            text_arg(args).map(|s| s.to_lowercase().into())
        });
        set.insert("upper", |args| text_arg(args).map(|s| s.to_uppercase().into()));
        set.insert("strtoupper", |args| {
            text_arg(args).map(|s| s.to_uppercase().into())
        });
        set.insert("trim", |args| text_arg(args).map(|s| s.trim().into()));
        set.insert("length", |args| {
            let value = one(args)?;
            let len = match value {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Table(table) => table.len(),
                other => {
                    return Err(format!(
                        "expected a string or collection, got {}",
                        type_name(other)
                    ));
                }
            };
            Ok(Value::Integer(len as i64))
        });
        set.insert("nl2br", |args| text_arg(args).map(|s| nl2br(&s).into()));
        set.insert("json", |args| {
            let value = one(args)?;
            serde_json::to_string(&to_json(value)).map(Value::String).map_err(|e| e.to_string())
        });
        set
    }

    /// Register a modifier, replacing any previous one with the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        modifier: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Result<()> {
        let name = name.into();
        if name == "raw" {
            return Err(TemplateError::ReservedModifier { name });
        }
        self.map.insert(name, Box::new(modifier));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Run a modifier on already-evaluated arguments
    pub fn apply(&self, name: &str, args: &[Value], line: usize) -> Result<Value> {
        let modifier = self
            .map
            .get(name)
            .ok_or_else(|| TemplateError::UnknownModifier {
                name: name.to_string(),
                line,
            })?;
        modifier(args).map_err(|reason| TemplateError::Modifier {
            name: name.to_string(),
            reason,
            line,
        })
    }

    fn insert(
        &mut self,
        name: &str,
        modifier: impl Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) {
        self.map.insert(name.to_string(), Box::new(modifier));
    }
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self::builtins()
    }
}

fn one(args: &[Value]) -> std::result::Result<&Value, String> {
    match args {
        [value] => Ok(value),
        _ => Err(format!("expected exactly 1 argument, got {}", args.len())),
    }
}

fn text_arg(args: &[Value]) -> std::result::Result<String, String> {
    let value = one(args)?;
    text_of(value).ok_or_else(|| format!("cannot convert {} to text", type_name(value)))
}

/// Scalar-to-text coercion shared by modifiers and the renderer
///
/// Booleans follow the original framework's echo semantics: true is "1",
/// false is the empty string. Arrays and tables have no text form.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(n) => Some(n.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Boolean(true) => Some("1".to_string()),
        Value::Boolean(false) => Some(String::new()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "a string",
        Value::Integer(_) => "an integer",
        Value::Float(_) => "a float",
        Value::Boolean(_) => "a boolean",
        Value::Datetime(_) => "a datetime",
        Value::Array(_) => "an array",
        Value::Table(_) => "a table",
    }
}

/// Insert `<br />` before each newline, keeping the newline itself
fn nl2br(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                out.push_str("<br />\r");
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    out.push('\n');
                }
            }
            '\n' => out.push_str("<br />\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Convert a scope value to a JSON value
///
/// toml's own serializer mangles datetimes outside toml output, so the
/// conversion is explicit. Datetimes become their display string; float
/// infinities and NaN, which JSON cannot carry, become null.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Table(table) => serde_json::Value::Object(
            table
                .iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::toml;

    fn apply_one(name: &str, value: Value) -> Result<Value> {
        ModifierSet::builtins().apply(name, &[value], 1)
    }

    #[test]
    fn test_builtin_names_present() {
        let set = ModifierSet::builtins();
        for name in [
            "lower",
            "strtolower",
            "upper",
            "strtoupper",
            "trim",
            "length",
            "nl2br",
            "json",
        ] {
            assert!(set.contains(name), "missing builtin '{}'", name);
        }
        assert!(!set.contains("raw"));
    }

    #[test]
    fn test_case_modifiers() {
        assert_eq!(
            apply_one("lower", "MiXeD".into()).unwrap(),
            Value::String("mixed".into())
        );
        assert_eq!(
            apply_one("strtoupper", "MiXeD".into()).unwrap(),
            Value::String("MIXED".into())
        );
    }

    #[test]
    fn test_alias_matches_short_name() {
        let a = apply_one("lower", "AbC".into()).unwrap();
        let b = apply_one("strtolower", "AbC".into()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_trim() {
        assert_eq!(
            apply_one("trim", "  padded \n".into()).unwrap(),
            Value::String("padded".into())
        );
    }

    #[test]
    fn test_numeric_subject_coerced() {
        assert_eq!(
            apply_one("lower", Value::Integer(42)).unwrap(),
            Value::String("42".into())
        );
    }

    #[test]
    fn test_length() {
        assert_eq!(
            apply_one("length", "héllo".into()).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            apply_one("length", Value::Array(vec![1.into(), 2.into()])).unwrap(),
            Value::Integer(2)
        );
        let table = toml! {
            a = 1
            b = 2
            c = 3
        };
        assert_eq!(
            apply_one("length", Value::Table(table)).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_length_rejects_scalars_without_length() {
        let err = apply_one("length", Value::Boolean(true)).unwrap_err();
        match err {
            TemplateError::Modifier { name, reason, .. } => {
                assert_eq!(name, "length");
                assert!(reason.contains("boolean"));
            }
            other => panic!("expected Modifier error, got {other:?}"),
        }
    }

    #[test]
    fn test_nl2br_keeps_newlines() {
        assert_eq!(
            apply_one("nl2br", "a\nb\r\nc".into()).unwrap(),
            Value::String("a<br />\nb<br />\r\nc".into())
        );
    }

    #[test]
    fn test_json_table() {
        let table = toml! {
            name = "mars"
            tags = ["a", "b"]
        };
        let out = apply_one("json", Value::Table(table)).unwrap();
        assert_eq!(
            out,
            Value::String(r#"{"name":"mars","tags":["a","b"]}"#.into())
        );
    }

    #[test]
    fn test_register_custom_modifier() {
        let mut set = ModifierSet::builtins();
        set.register("shout", |args| {
            let value = args.first().ok_or("expected a value")?;
            let text = text_of(value).ok_or("expected text")?;
            Ok(Value::String(format!("{}!", text.to_uppercase())))
        })
        .unwrap();

        assert_eq!(
            set.apply("shout", &["hey".into()], 1).unwrap(),
            Value::String("HEY!".into())
        );
    }

    #[test]
    fn test_register_raw_refused() {
        let mut set = ModifierSet::empty();
        let err = set
            .register("raw", |_| Ok(Value::Boolean(true)))
            .unwrap_err();
        assert!(matches!(err, TemplateError::ReservedModifier { .. }));
        assert!(!set.contains("raw"));
    }

    #[test]
    fn test_unknown_modifier_at_apply() {
        let err = ModifierSet::builtins()
            .apply("sparkle", &["x".into()], 9)
            .unwrap_err();
        match err {
            TemplateError::UnknownModifier { name, line } => {
                assert_eq!(name, "sparkle");
                assert_eq!(line, 9);
            }
            other => panic!("expected UnknownModifier, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_arity_reported() {
        let err = ModifierSet::builtins()
            .apply("trim", &["a".into(), "b".into()], 2)
            .unwrap_err();
        match err {
            TemplateError::Modifier { reason, line, .. } => {
                assert!(reason.contains("exactly 1"));
                assert_eq!(line, 2);
            }
            other => panic!("expected Modifier error, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_text_follows_echo_semantics() {
        assert_eq!(text_of(&Value::Boolean(true)).unwrap(), "1");
        assert_eq!(text_of(&Value::Boolean(false)).unwrap(), "");
        assert_eq!(text_of(&Value::Array(vec![])), None);
    }
}
