//! Variable scope for template rendering
//!
//! A [`Scope`] is a stack of frames over [`toml::Value`] tables plus a flat
//! table of language strings. Lookup walks the stack innermost-first, so a
//! `@foreach` loop variable shadows an outer variable of the same name and
//! the shadowing ends when the loop frame is popped.
//!
//! `@data` writes into the innermost frame; `@global` writes into the root
//! frame, which survives every push/pop and is visible to included templates.

use std::collections::HashMap;
use toml::map::Map;
use toml::Value;

/// Variables and language strings visible to a render pass
#[derive(Debug, Clone)]
pub struct Scope {
    /// Frame stack. Index 0 is the root frame; the last entry is innermost.
    frames: Vec<Map<String, Value>>,
    /// Bare-identifier lookups (`{{ app_title }}`) resolve here.
    strings: HashMap<String, String>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create an empty scope with a single root frame
    pub fn new() -> Self {
        Self {
            frames: vec![Map::new()],
            strings: HashMap::new(),
        }
    }

    /// Create a scope whose root frame is the given table
    pub fn from_table(table: Map<String, Value>) -> Self {
        Self {
            frames: vec![table],
            strings: HashMap::new(),
        }
    }

    /// Builder: set a variable in the root frame
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder: register a language string
    pub fn with_string(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.strings.insert(key.into(), text.into());
        self
    }

    /// Builder: register a batch of language strings
    pub fn with_strings<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, text) in entries {
            self.strings.insert(key.into(), text.into());
        }
        self
    }

    /// Set a variable in the innermost frame
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value.into());
        }
    }

    /// Set a variable in the root frame
    ///
    /// The root frame outlives loop and include frames, so the value stays
    /// visible after the current block ends.
    pub fn insert_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(frame) = self.frames.first_mut() {
            frame.insert(name.into(), value.into());
        }
    }

    /// Look up a variable, innermost frame first
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Look up a language string by key
    pub fn language_string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Push a fresh frame (entering a loop body)
    pub fn push_frame(&mut self) {
        self.frames.push(Map::new());
    }

    /// Pop the innermost frame
    ///
    /// The root frame is never popped; a pop at depth 1 is a no-op.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Current frame depth (1 = root only)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
