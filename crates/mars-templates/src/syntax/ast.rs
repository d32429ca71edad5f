//! Compiled template tree
//!
//! The parser lowers template source into this tree and the renderer executes
//! it. The tree is also what a compiled artifact stores on disk, so every
//! type here derives `Serialize`/`Deserialize` and nothing in it depends on
//! compile-time state such as timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A fully parsed template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub nodes: Vec<Node>,
}

/// One step of a variable path (`$user.name`, `$rows[0]`, `$map['k']`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathSeg {
    /// Named lookup into a table. `.name`, `->name`, `@name` and `['name']`
    /// all lower to this.
    Key(String),
    /// Positional lookup into an array
    Index(i64),
}

/// How an output block escapes its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscapeMode {
    /// `{{ expr }}`: HTML-escape once
    Html,
    /// `{{{ expr }}}`: HTML-escape twice
    Double,
    /// `{! expr !}` or a `raw` pipe stage: emit verbatim
    Raw,
}

/// Where an include directive resolves from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeOrigin {
    /// `@include(name)`: sibling of the including file
    Relative,
    /// `@template(name)`: relative to the theme's templates root
    Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// An expression inside a directive or output block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `$name` with an optional path into the value
    Var {
        name: String,
        path: Vec<PathSeg>,
        line: usize,
    },
    /// Bare identifier: looked up in the language-string table
    Lang { key: String, line: usize },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    /// A modifier applied as a call (`trim($x)`) or desugared from a pipe
    /// stage (`$x | trim`)
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
}

impl Expr {
    /// Line the expression starts on, for error reporting
    pub fn line(&self) -> usize {
        match self {
            Expr::Var { line, .. }
            | Expr::Lang { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Call { line, .. } => *line,
            _ => 0,
        }
    }
}

/// One `@if` or `@elseif` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfArm {
    pub condition: Expr,
    pub body: Vec<Node>,
    pub line: usize,
}

/// A node of the compiled tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Literal template text, kept verbatim
    Text(String),
    /// `{{ .. }}`, `{{{ .. }}}` or `{! .. !}`
    Output {
        expr: Expr,
        escape: EscapeMode,
        line: usize,
    },
    /// `@if` chain with `@elseif` arms and an optional `@else` body
    If {
        arms: Vec<IfArm>,
        else_body: Vec<Node>,
        line: usize,
    },
    /// `@foreach($items as $item)` or `@foreach($items as $key => $item)`
    Foreach {
        key: Option<String>,
        binding: String,
        collection: Expr,
        body: Vec<Node>,
        line: usize,
    },
    /// `@include(..)` / `@template(..)`. `path` is filled by the resolver
    /// before the artifact is written.
    Include {
        name: String,
        origin: IncludeOrigin,
        path: Option<PathBuf>,
        line: usize,
    },
    /// `@data(name, value)`: set a variable in the current frame
    Data {
        name: String,
        value: Expr,
        line: usize,
    },
    /// `@global(name, value)`: set a variable in the root frame
    Global {
        name: String,
        value: Expr,
        line: usize,
    },
}

fn is_ident_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit())
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSeg::Key(key) if is_ident_key(key) => write!(f, ".{}", key),
            PathSeg::Key(key) => write!(f, "['{}']", key),
            PathSeg::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "'{}'", s),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{}", n),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Var { name, path, .. } => {
                write!(f, "${}", name)?;
                for seg in path {
                    write!(f, "{}", seg)?;
                }
                Ok(())
            }
            Expr::Lang { key, .. } => write!(f, "{}", key),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
            },
            Expr::Binary { op, lhs, rhs, .. } => {
                write!(f, "{} {} {}", lhs, op.symbol(), rhs)
            }
            Expr::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
