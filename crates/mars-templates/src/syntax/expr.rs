//! Expression parsing
//!
//! The tokenizer captures expression sources verbatim; this module lexes and
//! parses them into [`Expr`] trees. One expression grammar serves every
//! directive, with a dedicated entry point per context so that `@foreach`
//! heads, include names and `@data` argument lists each get their own shape
//! checked at compile time.
//!
//! Precedence, loosest first: `|` pipes, `||`, `&&`, comparisons, `+ -`,
//! `* /`, unary `! -`. Pipe stages desugar to [`Expr::Call`] with the piped
//! value as first argument; a `raw` stage sets a flag instead and is only
//! legal in output blocks.

use crate::error::{Result, TemplateError};
use crate::syntax::ast::{BinaryOp, Expr, PathSeg, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Var(String),
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Dot,
    Arrow,
    At,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Not,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    FatArrow,
}

impl ExprToken {
    fn describe(&self) -> String {
        match self {
            ExprToken::Var(name) => format!("'${}'", name),
            ExprToken::Ident(name) => format!("'{}'", name),
            ExprToken::Str(_) => "string literal".to_string(),
            ExprToken::Int(n) => format!("'{}'", n),
            ExprToken::Float(n) => format!("'{}'", n),
            ExprToken::Dot => "'.'".to_string(),
            ExprToken::Arrow => "'->'".to_string(),
            ExprToken::At => "'@'".to_string(),
            ExprToken::LBracket => "'['".to_string(),
            ExprToken::RBracket => "']'".to_string(),
            ExprToken::LParen => "'('".to_string(),
            ExprToken::RParen => "')'".to_string(),
            ExprToken::Comma => "','".to_string(),
            ExprToken::Pipe => "'|'".to_string(),
            ExprToken::Not => "'!'".to_string(),
            ExprToken::AndAnd => "'&&'".to_string(),
            ExprToken::OrOr => "'||'".to_string(),
            ExprToken::EqEq => "'=='".to_string(),
            ExprToken::NotEq => "'!='".to_string(),
            ExprToken::Lt => "'<'".to_string(),
            ExprToken::Le => "'<='".to_string(),
            ExprToken::Gt => "'>'".to_string(),
            ExprToken::Ge => "'>='".to_string(),
            ExprToken::Plus => "'+'".to_string(),
            ExprToken::Minus => "'-'".to_string(),
            ExprToken::Star => "'*'".to_string(),
            ExprToken::Slash => "'/'".to_string(),
            ExprToken::FatArrow => "'=>'".to_string(),
        }
    }
}

/// Parse an expression where every pipe stage must be a real modifier
///
/// Used for conditions and `@data`/`@global` values. A `raw` stage is
/// rejected here.
pub(crate) fn parse_expression(src: &str, line: usize) -> Result<Expr> {
    let mut parser = Parser::new(src, line)?;
    let (expr, _) = parser.parse_pipe(false)?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse an output-block expression, allowing a `raw` pipe stage
///
/// Returns the expression and whether `raw` appeared anywhere in the chain.
pub(crate) fn parse_output(src: &str, line: usize) -> Result<(Expr, bool)> {
    let mut parser = Parser::new(src, line)?;
    let (expr, raw) = parser.parse_pipe(true)?;
    parser.expect_end()?;
    Ok((expr, raw))
}

/// A parsed `@foreach` head: `collection as [$key =>] $binding`
#[derive(Debug)]
pub(crate) struct ForeachHead {
    pub collection: Expr,
    pub key: Option<String>,
    pub binding: String,
}

/// Parse `@foreach(collection as $item)` / `@foreach(collection as $k => $v)`
pub(crate) fn parse_foreach_head(src: &str, line: usize) -> Result<ForeachHead> {
    let mut parser = Parser::new(src, line)?;
    let (collection, _) = parser.parse_pipe(false)?;

    match parser.next() {
        Some(ExprToken::Ident(word)) if word == "as" => {}
        other => {
            return Err(parser.unexpected(other.as_ref(), "'as'"));
        }
    }

    let first = parser.expect_var("a loop variable after 'as'")?;
    if parser.eat(&ExprToken::FatArrow) {
        let second = parser.expect_var("a loop variable after '=>'")?;
        parser.expect_end()?;
        Ok(ForeachHead {
            collection,
            key: Some(first),
            binding: second,
        })
    } else {
        parser.expect_end()?;
        Ok(ForeachHead {
            collection,
            key: None,
            binding: first,
        })
    }
}

/// Parse the single quoted-string argument of `@include` / `@template`
///
/// Template names are resolved at compile time, so only a static string
/// literal is accepted.
pub(crate) fn parse_name_arg(src: &str, line: usize) -> Result<String> {
    let mut parser = Parser::new(src, line)?;
    let name = match parser.next() {
        Some(ExprToken::Str(name)) => name,
        other => {
            return Err(parser.unexpected(other.as_ref(), "a quoted template name"));
        }
    };
    parser.expect_end()?;
    if name.trim().is_empty() {
        return Err(TemplateError::EmptyTemplateName { line });
    }
    Ok(name)
}

/// Parse the `('name', value)` argument list of `@data` / `@global`
pub(crate) fn parse_assign_args(src: &str, line: usize, directive: &str) -> Result<(String, Expr)> {
    let mut parser = Parser::new(src, line)?;
    let name = match parser.next() {
        Some(ExprToken::Str(name)) => name,
        other => {
            return Err(parser.unexpected(other.as_ref(), "a quoted variable name"));
        }
    };
    if name.trim().is_empty() {
        return Err(TemplateError::Syntax {
            message: format!("@{} variable name must not be empty", directive),
            line,
        });
    }
    match parser.next() {
        Some(ExprToken::Comma) => {}
        other => {
            return Err(parser.unexpected(other.as_ref(), "',' and a value"));
        }
    }
    let (value, _) = parser.parse_pipe(false)?;
    parser.expect_end()?;
    Ok((name, value))
}

struct Parser {
    tokens: Vec<ExprToken>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(src: &str, line: usize) -> Result<Self> {
        Ok(Self {
            tokens: lex(src, line)?,
            pos: 0,
            line,
        })
    }

    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<ExprToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &ExprToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, got: Option<&ExprToken>, expected: &str) -> TemplateError {
        let message = match got {
            Some(token) => format!("expected {}, found {}", expected, token.describe()),
            None => format!("expected {}, found end of expression", expected),
        };
        TemplateError::Syntax {
            message,
            line: self.line,
        }
    }

    fn expect(&mut self, token: ExprToken, expected: &str) -> Result<()> {
        match self.next() {
            Some(found) if found == token => Ok(()),
            other => Err(self.unexpected(other.as_ref(), expected)),
        }
    }

    fn expect_var(&mut self, expected: &str) -> Result<String> {
        match self.next() {
            Some(ExprToken::Var(name)) => Ok(name),
            other => Err(self.unexpected(other.as_ref(), expected)),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) => {
                let message = format!("unexpected trailing {}", token.describe());
                Err(TemplateError::Syntax {
                    message,
                    line: self.line,
                })
            }
        }
    }

    /// Pipe chain, loosest level. Returns the expression and the raw flag.
    fn parse_pipe(&mut self, allow_raw: bool) -> Result<(Expr, bool)> {
        let mut expr = self.parse_or()?;
        let mut raw = false;

        while self.eat(&ExprToken::Pipe) {
            let name = match self.next() {
                Some(ExprToken::Ident(name)) => name,
                other => {
                    return Err(self.unexpected(other.as_ref(), "a modifier name after '|'"));
                }
            };

            if name == "raw" {
                if !allow_raw {
                    return Err(TemplateError::Syntax {
                        message: "the 'raw' modifier is only valid in output blocks".to_string(),
                        line: self.line,
                    });
                }
                if self.peek() == Some(&ExprToken::LParen) {
                    return Err(TemplateError::Syntax {
                        message: "'raw' takes no arguments".to_string(),
                        line: self.line,
                    });
                }
                raw = true;
                continue;
            }

            let mut args = vec![expr];
            if self.eat(&ExprToken::LParen) {
                self.parse_args(&mut args)?;
            }
            expr = Expr::Call {
                name,
                args,
                line: self.line,
            };
        }

        Ok((expr, raw))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&ExprToken::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line: self.line,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&ExprToken::AndAnd) {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line: self.line,
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(ExprToken::EqEq) => BinaryOp::Eq,
                Some(ExprToken::NotEq) => BinaryOp::Ne,
                Some(ExprToken::Lt) => BinaryOp::Lt,
                Some(ExprToken::Le) => BinaryOp::Le,
                Some(ExprToken::Gt) => BinaryOp::Gt,
                Some(ExprToken::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line: self.line,
            };
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(ExprToken::Plus) => BinaryOp::Add,
                Some(ExprToken::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line: self.line,
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(ExprToken::Star) => BinaryOp::Mul,
                Some(ExprToken::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line: self.line,
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&ExprToken::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line: self.line,
            });
        }
        if self.eat(&ExprToken::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                line: self.line,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(ExprToken::Str(s)) => Ok(Expr::Str(s)),
            Some(ExprToken::Int(n)) => Ok(Expr::Int(n)),
            Some(ExprToken::Float(n)) => Ok(Expr::Float(n)),
            Some(ExprToken::Var(name)) => {
                let path = self.parse_path()?;
                Ok(Expr::Var {
                    name,
                    path,
                    line: self.line,
                })
            }
            Some(ExprToken::Ident(word)) => match word.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ => {
                    if self.eat(&ExprToken::LParen) {
                        if word == "raw" {
                            return Err(TemplateError::Syntax {
                                message: "'raw' is reserved and cannot be called; use it as a \
                                          pipe stage"
                                    .to_string(),
                                line: self.line,
                            });
                        }
                        let mut args = Vec::new();
                        self.parse_args(&mut args)?;
                        Ok(Expr::Call {
                            name: word,
                            args,
                            line: self.line,
                        })
                    } else {
                        Ok(Expr::Lang {
                            key: word,
                            line: self.line,
                        })
                    }
                }
            },
            Some(ExprToken::LParen) => {
                let (expr, _) = self.parse_pipe(false)?;
                self.expect(ExprToken::RParen, "')'")?;
                Ok(expr)
            }
            other => Err(self.unexpected(other.as_ref(), "an expression")),
        }
    }

    /// `.key`, `->key`, `@key`, `['key']` and `[0]` steps after a variable
    fn parse_path(&mut self) -> Result<Vec<PathSeg>> {
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some(ExprToken::Dot) | Some(ExprToken::Arrow) | Some(ExprToken::At) => {
                    self.pos += 1;
                    match self.next() {
                        Some(ExprToken::Ident(key)) => path.push(PathSeg::Key(key)),
                        other => {
                            return Err(self.unexpected(other.as_ref(), "a property name"));
                        }
                    }
                }
                Some(ExprToken::LBracket) => {
                    self.pos += 1;
                    let seg = match self.next() {
                        Some(ExprToken::Str(key)) => PathSeg::Key(key),
                        Some(ExprToken::Int(index)) => PathSeg::Index(index),
                        other => {
                            return Err(
                                self.unexpected(other.as_ref(), "a string key or integer index")
                            );
                        }
                    };
                    self.expect(ExprToken::RBracket, "']'")?;
                    path.push(seg);
                }
                _ => return Ok(path),
            }
        }
    }

    /// Comma-separated argument list; the opening paren is already consumed
    fn parse_args(&mut self, args: &mut Vec<Expr>) -> Result<()> {
        if self.eat(&ExprToken::RParen) {
            return Ok(());
        }
        loop {
            let (arg, _) = self.parse_pipe(false)?;
            args.push(arg);
            if self.eat(&ExprToken::Comma) {
                continue;
            }
            self.expect(ExprToken::RParen, "')' or ','")?;
            return Ok(());
        }
    }
}

fn lex(src: &str, line: usize) -> Result<Vec<ExprToken>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let err = |message: String| TemplateError::Syntax { message, line };

    while pos < bytes.len() {
        let byte = bytes[pos];
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'$' => {
                let start = pos + 1;
                let mut end = start;
                while end < bytes.len() && is_ident_byte(bytes[end]) {
                    end += 1;
                }
                if end == start {
                    return Err(err("expected a variable name after '$'".to_string()));
                }
                tokens.push(ExprToken::Var(src[start..end].to_string()));
                pos = end;
            }
            b'\'' | b'"' => {
                let quote = byte;
                let start = pos + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end] != quote {
                    end += 1;
                }
                if end == bytes.len() {
                    return Err(err("unterminated string literal".to_string()));
                }
                tokens.push(ExprToken::Str(src[start..end].to_string()));
                pos = end + 1;
            }
            b'0'..=b'9' => {
                let start = pos;
                let mut end = pos;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                let is_float = end + 1 < bytes.len()
                    && bytes[end] == b'.'
                    && bytes[end + 1].is_ascii_digit();
                if is_float {
                    end += 1;
                    while end < bytes.len() && bytes[end].is_ascii_digit() {
                        end += 1;
                    }
                    let value: f64 = src[start..end]
                        .parse()
                        .map_err(|_| err(format!("invalid number '{}'", &src[start..end])))?;
                    tokens.push(ExprToken::Float(value));
                } else {
                    let value: i64 = src[start..end]
                        .parse()
                        .map_err(|_| err(format!("integer '{}' out of range", &src[start..end])))?;
                    tokens.push(ExprToken::Int(value));
                }
                pos = end;
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = pos;
                let mut end = pos;
                while end < bytes.len() && is_ident_byte(bytes[end]) {
                    end += 1;
                }
                tokens.push(ExprToken::Ident(src[start..end].to_string()));
                pos = end;
            }
            b'-' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    tokens.push(ExprToken::Arrow);
                    pos += 2;
                } else {
                    tokens.push(ExprToken::Minus);
                    pos += 1;
                }
            }
            b'=' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    tokens.push(ExprToken::FatArrow);
                    pos += 2;
                } else if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(ExprToken::EqEq);
                    // `===` compares the same way as `==`
                    pos += if bytes.get(pos + 2) == Some(&b'=') { 3 } else { 2 };
                } else {
                    return Err(err("assignment '=' is not supported; use '=='".to_string()));
                }
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(ExprToken::NotEq);
                    pos += if bytes.get(pos + 2) == Some(&b'=') { 3 } else { 2 };
                } else {
                    tokens.push(ExprToken::Not);
                    pos += 1;
                }
            }
            b'&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    tokens.push(ExprToken::AndAnd);
                    pos += 2;
                } else {
                    return Err(err("single '&' is not an operator; use '&&'".to_string()));
                }
            }
            b'|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    tokens.push(ExprToken::OrOr);
                    pos += 2;
                } else {
                    tokens.push(ExprToken::Pipe);
                    pos += 1;
                }
            }
            b'<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(ExprToken::Le);
                    pos += 2;
                } else {
                    tokens.push(ExprToken::Lt);
                    pos += 1;
                }
            }
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(ExprToken::Ge);
                    pos += 2;
                } else {
                    tokens.push(ExprToken::Gt);
                    pos += 1;
                }
            }
            b'.' => {
                tokens.push(ExprToken::Dot);
                pos += 1;
            }
            b'@' => {
                tokens.push(ExprToken::At);
                pos += 1;
            }
            b'[' => {
                tokens.push(ExprToken::LBracket);
                pos += 1;
            }
            b']' => {
                tokens.push(ExprToken::RBracket);
                pos += 1;
            }
            b'(' => {
                tokens.push(ExprToken::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(ExprToken::RParen);
                pos += 1;
            }
            b',' => {
                tokens.push(ExprToken::Comma);
                pos += 1;
            }
            b'+' => {
                tokens.push(ExprToken::Plus);
                pos += 1;
            }
            b'*' => {
                tokens.push(ExprToken::Star);
                pos += 1;
            }
            b'/' => {
                tokens.push(ExprToken::Slash);
                pos += 1;
            }
            _ => {
                let ch = src[pos..].chars().next().unwrap_or('?');
                return Err(err(format!("unexpected character '{}' in expression", ch)));
            }
        }
    }

    Ok(tokens)
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
