//! Template language front end
//!
//! The tokenizer splits source into text runs, output blocks and directives;
//! the parser builds the tree defined in [`ast`]. Directive arguments share
//! one expression grammar with a dedicated entry point per context.

pub mod ast;
mod expr;
mod parse;
mod tokenize;

pub(crate) use parse::parse;
