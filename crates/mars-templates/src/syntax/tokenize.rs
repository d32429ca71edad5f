//! Tokenization for the template compiler
//!
//! Splits template source into literal text runs, output blocks and `@`
//! directives in a single forward pass over the bytes. Expression sources
//! inside blocks are captured verbatim and handed to the expression parser
//! later; this pass only finds the boundaries.
//!
//! Every boundary byte (`{`, `@`, quotes, parens) is ASCII, so byte-wise
//! scanning is safe on UTF-8 input: continuation bytes can never collide
//! with a delimiter.

use crate::error::{Result, TemplateError};
use crate::syntax::ast::EscapeMode;

/// A template-level token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Literal text, kept verbatim including whitespace and newlines
    Text(String),
    /// `{{ .. }}`, `{{{ .. }}}` or `{! .. !}` with the raw expression source
    Output {
        src: String,
        mode: EscapeMode,
        line: usize,
    },
    If { src: String, line: usize },
    ElseIf { src: String, line: usize },
    Else { line: usize },
    EndIf { line: usize },
    Foreach { src: String, line: usize },
    EndForeach { line: usize },
    Include { src: String, line: usize },
    Template { src: String, line: usize },
    Data { src: String, line: usize },
    Global { src: String, line: usize },
}

/// Directive keywords that take a parenthesized argument
///
/// A keyword without a following `(` is literal text, so prose like
/// "email us @include time" passes through untouched.
const PAREN_KEYWORDS: [&str; 7] = [
    "if", "elseif", "foreach", "include", "template", "data", "global",
];

/// Directive keywords that never take arguments
const BARE_KEYWORDS: [&str; 3] = ["else", "endif", "endforeach"];

/// Tokenize template source
pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>> {
    Scanner::new(src).run()
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut run_start = self.pos;

        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'{' => {
                    let (close, mode, open) = if self.lookahead("{{{") {
                        ("}}}", EscapeMode::Double, "{{{")
                    } else if self.lookahead("{{") {
                        ("}}", EscapeMode::Html, "{{")
                    } else if self.lookahead("{!") {
                        ("!}", EscapeMode::Raw, "{!")
                    } else {
                        text.push_str(&self.src[run_start..self.pos]);
                        text.push('{');
                        self.pos += 1;
                        run_start = self.pos;
                        continue;
                    };

                    text.push_str(&self.src[run_start..self.pos]);
                    flush_text(&mut tokens, &mut text);

                    let line = self.line;
                    let src = self.scan_delimited(open, close)?;
                    tokens.push(Token::Output {
                        src: src.trim().to_string(),
                        mode,
                        line,
                    });
                    run_start = self.pos;
                }
                b'@' => {
                    let before = self.pos;
                    match self.scan_directive()? {
                        Some(token) => {
                            text.push_str(&self.src[run_start..before]);
                            flush_text(&mut tokens, &mut text);
                            tokens.push(token);
                            run_start = self.pos;
                        }
                        None => {
                            // Not a directive. The scanner already advanced
                            // past the `@` and any identifier; keep those
                            // bytes in the current text run.
                        }
                    }
                }
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => {
                    self.pos += 1;
                }
            }
        }

        text.push_str(&self.src[run_start..self.pos]);
        flush_text(&mut tokens, &mut text);
        Ok(tokens)
    }

    fn lookahead(&self, prefix: &str) -> bool {
        self.bytes[self.pos..].starts_with(prefix.as_bytes())
    }

    /// Scan from an opening delimiter to its closing one, quote-aware
    ///
    /// `pos` must be at the first byte of `open`; on success it lands just
    /// past `close`. Quoted sections (`'..'` or `".."`) hide the closing
    /// delimiter, so `{{ 'a}}b' }}` captures the whole string literal.
    fn scan_delimited(&mut self, open: &str, close: &str) -> Result<String> {
        let open_line = self.line;
        self.pos += open.len();
        let content_start = self.pos;
        let mut quote: Option<u8> = None;

        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            match quote {
                Some(q) => {
                    if byte == q {
                        quote = None;
                    } else if byte == b'\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
                None => {
                    if byte == b'\'' || byte == b'"' {
                        quote = Some(byte);
                        self.pos += 1;
                    } else if self.lookahead(close) {
                        let content = self.src[content_start..self.pos].to_string();
                        self.pos += close.len();
                        return Ok(content);
                    } else {
                        if byte == b'\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                }
            }
        }

        Err(TemplateError::Syntax {
            message: format!("unterminated '{}' block, expected '{}'", open, close),
            line: open_line,
        })
    }

    /// Try to scan a directive at `pos` (which is at `@`)
    ///
    /// Returns `None` when the `@` does not start a directive; in that case
    /// `pos` has advanced past the `@` and any identifier so the caller
    /// keeps them as text.
    fn scan_directive(&mut self) -> Result<Option<Token>> {
        let at = self.pos;
        let mut end = at + 1;
        while end < self.bytes.len() && is_ident_byte(self.bytes[end]) {
            end += 1;
        }
        let word = &self.src[at + 1..end];

        if BARE_KEYWORDS.contains(&word) {
            self.pos = end;
            let line = self.line;
            return Ok(Some(match word {
                "else" => Token::Else { line },
                "endif" => Token::EndIf { line },
                _ => Token::EndForeach { line },
            }));
        }

        if PAREN_KEYWORDS.contains(&word) {
            // Look past horizontal whitespace for the opening paren
            let mut paren = end;
            while paren < self.bytes.len()
                && (self.bytes[paren] == b' ' || self.bytes[paren] == b'\t')
            {
                paren += 1;
            }
            if paren < self.bytes.len() && self.bytes[paren] == b'(' {
                let line = self.line;
                self.pos = paren;
                let src = self.scan_parenthesized(word)?;
                let src = src.trim().to_string();
                return Ok(Some(match word {
                    "if" => Token::If { src, line },
                    "elseif" => Token::ElseIf { src, line },
                    "foreach" => Token::Foreach { src, line },
                    "include" => Token::Include { src, line },
                    "template" => Token::Template { src, line },
                    "data" => Token::Data { src, line },
                    _ => Token::Global { src, line },
                }));
            }
        }

        // Plain `@` in text (email addresses, CSS at-rules, prose)
        self.pos = end.max(at + 1);
        Ok(None)
    }

    /// Scan a balanced, quote-aware parenthesized group
    ///
    /// `pos` must be at `(`; on success it lands just past the matching `)`
    /// and the content between the outer parens is returned.
    fn scan_parenthesized(&mut self, keyword: &str) -> Result<String> {
        let open_line = self.line;
        self.pos += 1;
        let content_start = self.pos;
        let mut depth = 1usize;
        let mut quote: Option<u8> = None;

        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            match quote {
                Some(q) => {
                    if byte == q {
                        quote = None;
                    } else if byte == b'\n' {
                        self.line += 1;
                    }
                }
                None => match byte {
                    b'\'' | b'"' => quote = Some(byte),
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            let content = self.src[content_start..self.pos].to_string();
                            self.pos += 1;
                            return Ok(content);
                        }
                    }
                    b'\n' => self.line += 1,
                    _ => {}
                },
            }
            self.pos += 1;
        }

        Err(TemplateError::Syntax {
            message: format!("unclosed '(' after @{}", keyword),
            line: open_line,
        })
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn flush_text(tokens: &mut Vec<Token>, text: &mut String) {
    if !text.is_empty() {
        tokens.push(Token::Text(std::mem::take(text)));
    }
}
