//! Program execution
//!
//! Walks a compiled program against a [`Scope`] and produces the rendered
//! output. Compiled includes are fetched through [`IncludeLoader`], so the
//! renderer never touches the compiler or the cache directly; the engine
//! wires those together.
//!
//! Undefined variables are an error where a value is needed, but a bare
//! variable used as a condition (including under `!`, `&&`, `||`) or as a
//! `@foreach` collection quietly counts as false / empty. Templates probe
//! optional data constantly; conditions are where that is legitimate.

pub mod escape;
pub mod modifiers;

#[cfg(test)]
mod tests;

use crate::error::{Result, TemplateError};
use crate::render::modifiers::{text_of, type_name, ModifierSet};
use crate::scope::Scope;
use crate::syntax::ast::{BinaryOp, EscapeMode, Expr, Node, PathSeg, Program, UnaryOp};
use std::cmp::Ordering;
use std::path::Path;
use toml::Value;

/// Hard ceiling on include nesting
///
/// Includes resolve per file, so two files including each other would
/// recurse without this bound.
pub const MAX_INCLUDE_DEPTH: usize = 64;

/// Source of compiled programs for `@include` / `@template` execution
///
/// The engine implements this with its cache-aware loader; tests plug in
/// fixed maps or a loader that refuses everything.
pub trait IncludeLoader {
    fn load(&self, path: &Path) -> Result<Program>;
}

/// Everything a render pass can reach, passed explicitly
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub modifiers: &'a ModifierSet,
    pub loader: &'a dyn IncludeLoader,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(modifiers: &'a ModifierSet, loader: &'a dyn IncludeLoader) -> Self {
        Self {
            modifiers,
            loader,
            depth: 0,
        }
    }

    fn deeper(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }
}

/// Execute a program and return the rendered text
pub fn render_program(program: &Program, scope: &mut Scope, ctx: &RenderContext) -> Result<String> {
    let mut out = String::new();
    render_nodes(&program.nodes, scope, ctx, &mut out)?;
    Ok(out)
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut Scope,
    ctx: &RenderContext,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output { expr, escape, line } => {
                let value = eval_value(expr, scope, ctx)?;
                let text = match &value {
                    Value::Array(_) => {
                        return Err(TemplateError::ArrayInValue {
                            expr: expr.to_string(),
                            line: *line,
                        });
                    }
                    Value::Table(_) => {
                        return Err(TemplateError::TableInValue {
                            expr: expr.to_string(),
                            line: *line,
                        });
                    }
                    other => text_of(other).unwrap_or_default(),
                };
                match escape {
                    EscapeMode::Html => out.push_str(&escape::escape_html(&text)),
                    EscapeMode::Double => out.push_str(&escape::escape_html_twice(&text)),
                    EscapeMode::Raw => out.push_str(&text),
                }
            }
            Node::If {
                arms, else_body, ..
            } => {
                let mut taken = false;
                for arm in arms {
                    if eval_condition(&arm.condition, scope, ctx)? {
                        render_nodes(&arm.body, scope, ctx, out)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    render_nodes(else_body, scope, ctx, out)?;
                }
            }
            Node::Foreach {
                key,
                binding,
                collection,
                body,
                line,
            } => {
                let value = match eval_lenient(collection, scope, ctx)? {
                    Some(value) => value,
                    // An unset collection renders nothing
                    None => continue,
                };
                scope.push_frame();
                let outcome = run_foreach(
                    key.as_deref(),
                    binding,
                    &value,
                    collection,
                    body,
                    *line,
                    scope,
                    ctx,
                    out,
                );
                scope.pop_frame();
                outcome?;
            }
            Node::Include {
                name, path, line, ..
            } => {
                let target = match path {
                    Some(target) => target,
                    None => {
                        return Err(TemplateError::Syntax {
                            message: format!("include '{}' was not resolved before render", name),
                            line: *line,
                        });
                    }
                };
                if ctx.depth >= MAX_INCLUDE_DEPTH {
                    return Err(TemplateError::IncludeDepth {
                        path: target.clone(),
                        depth: ctx.depth,
                    });
                }
                let program = ctx.loader.load(target)?;
                // Included templates share the caller's scope
                render_nodes(&program.nodes, scope, &ctx.deeper(), out)?;
            }
            Node::Data { name, value, .. } => {
                let value = eval_value(value, scope, ctx)?;
                scope.insert(name.clone(), value);
            }
            Node::Global { name, value, .. } => {
                let value = eval_value(value, scope, ctx)?;
                scope.insert_global(name.clone(), value);
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_foreach(
    key: Option<&str>,
    binding: &str,
    value: &Value,
    collection: &Expr,
    body: &[Node],
    line: usize,
    scope: &mut Scope,
    ctx: &RenderContext,
    out: &mut String,
) -> Result<()> {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if let Some(key) = key {
                    scope.insert(key.to_string(), Value::Integer(index as i64));
                }
                scope.insert(binding.to_string(), item.clone());
                render_nodes(body, scope, ctx, out)?;
            }
            Ok(())
        }
        Value::Table(table) => {
            for (entry_key, entry) in table {
                if let Some(key) = key {
                    scope.insert(key.to_string(), Value::String(entry_key.clone()));
                }
                scope.insert(binding.to_string(), entry.clone());
                render_nodes(body, scope, ctx, out)?;
            }
            Ok(())
        }
        other => Err(TemplateError::NotIterable {
            expr: format!("{} ({})", collection, type_name(other)),
            line,
        }),
    }
}

/// Evaluate an expression to a value; undefined variables are an error
fn eval_value(expr: &Expr, scope: &Scope, ctx: &RenderContext) -> Result<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Int(n) => Ok(Value::Integer(*n)),
        Expr::Float(n) => Ok(Value::Float(*n)),
        Expr::Bool(b) => Ok(Value::Boolean(*b)),
        Expr::Var { name, path, line } => {
            lookup_var(scope, name, path).ok_or_else(|| TemplateError::UndefinedValue {
                name: expr.to_string(),
                line: *line,
            })
        }
        // A missing language string falls back to its own key
        Expr::Lang { key, .. } => Ok(Value::String(
            scope.language_string(key).unwrap_or(key).to_string(),
        )),
        Expr::Unary { op, operand, line } => match op {
            UnaryOp::Not => Ok(Value::Boolean(!eval_condition(operand, scope, ctx)?)),
            UnaryOp::Neg => match eval_value(operand, scope, ctx)? {
                Value::Integer(n) => Ok(Value::Integer(-n)),
                Value::Float(n) => Ok(Value::Float(-n)),
                other => Err(TemplateError::TypeMismatch {
                    op: "-".to_string(),
                    reason: format!("cannot negate {}", type_name(&other)),
                    line: *line,
                }),
            },
        },
        Expr::Binary { op, lhs, rhs, line } => eval_binary(*op, lhs, rhs, *line, scope, ctx),
        Expr::Call { name, args, line } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_value(arg, scope, ctx)?);
            }
            ctx.modifiers.apply(name, &values, *line)
        }
    }
}

/// Evaluate for a position where absence is tolerated
///
/// A bare variable that is unset resolves to `None`; anything else
/// evaluates strictly.
fn eval_lenient(expr: &Expr, scope: &Scope, ctx: &RenderContext) -> Result<Option<Value>> {
    match expr {
        Expr::Var { name, path, .. } => Ok(lookup_var(scope, name, path)),
        _ => eval_value(expr, scope, ctx).map(Some),
    }
}

/// Evaluate an expression as a condition
///
/// Bare variables get the lenient treatment here, directly and under the
/// boolean operators; everything else evaluates strictly and its result is
/// tested for truthiness.
fn eval_condition(expr: &Expr, scope: &Scope, ctx: &RenderContext) -> Result<bool> {
    match expr {
        Expr::Var { name, path, .. } => {
            Ok(lookup_var(scope, name, path).is_some_and(|value| truthy(&value)))
        }
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
            ..
        } => Ok(!eval_condition(operand, scope, ctx)?),
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
            ..
        } => Ok(eval_condition(lhs, scope, ctx)? && eval_condition(rhs, scope, ctx)?),
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
            ..
        } => Ok(eval_condition(lhs, scope, ctx)? || eval_condition(rhs, scope, ctx)?),
        _ => Ok(truthy(&eval_value(expr, scope, ctx)?)),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    line: usize,
    scope: &Scope,
    ctx: &RenderContext,
) -> Result<Value> {
    match op {
        BinaryOp::And => Ok(Value::Boolean(
            eval_condition(lhs, scope, ctx)? && eval_condition(rhs, scope, ctx)?,
        )),
        BinaryOp::Or => Ok(Value::Boolean(
            eval_condition(lhs, scope, ctx)? || eval_condition(rhs, scope, ctx)?,
        )),
        BinaryOp::Eq | BinaryOp::Ne => {
            let left = eval_value(lhs, scope, ctx)?;
            let right = eval_value(rhs, scope, ctx)?;
            let equal = values_equal(&left, &right);
            Ok(Value::Boolean(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let left = eval_value(lhs, scope, ctx)?;
            let right = eval_value(rhs, scope, ctx)?;
            compare_values(op, &left, &right, line).map(Value::Boolean)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let left = eval_value(lhs, scope, ctx)?;
            let right = eval_value(rhs, scope, ctx)?;
            arith(op, &left, &right, line)
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            (*x as f64) == *y
        }
        _ => left == right,
    }
}

fn compare_values(op: BinaryOp, left: &Value, right: &Value, line: usize) -> Result<bool> {
    let ordering = match (left, right) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => {
            return Err(TemplateError::TypeMismatch {
                op: op.symbol().to_string(),
                reason: format!(
                    "cannot order {} against {}",
                    type_name(left),
                    type_name(right)
                ),
                line,
            });
        }
    };

    // NaN never orders; every comparison against it is false
    let ordering = match ordering {
        Some(ordering) => ordering,
        None => return Ok(false),
    };

    Ok(match op {
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}

fn arith(op: BinaryOp, left: &Value, right: &Value, line: usize) -> Result<Value> {
    let mismatch = |reason: String| TemplateError::TypeMismatch {
        op: op.symbol().to_string(),
        reason,
        line,
    };

    match (left, right) {
        (Value::Integer(x), Value::Integer(y)) => match op {
            BinaryOp::Add => Ok(int_or_float(x.checked_add(*y), *x as f64 + *y as f64)),
            BinaryOp::Sub => Ok(int_or_float(x.checked_sub(*y), *x as f64 - *y as f64)),
            BinaryOp::Mul => Ok(int_or_float(x.checked_mul(*y), *x as f64 * *y as f64)),
            _ => {
                if *y == 0 {
                    return Err(mismatch("division by zero".to_string()));
                }
                if x % y == 0 {
                    Ok(Value::Integer(x / y))
                } else {
                    Ok(Value::Float(*x as f64 / *y as f64))
                }
            }
        },
        (Value::Integer(_), Value::Float(_))
        | (Value::Float(_), Value::Integer(_))
        | (Value::Float(_), Value::Float(_)) => {
            let x = as_f64(left);
            let y = as_f64(right);
            match op {
                BinaryOp::Add => Ok(Value::Float(x + y)),
                BinaryOp::Sub => Ok(Value::Float(x - y)),
                BinaryOp::Mul => Ok(Value::Float(x * y)),
                _ => {
                    if y == 0.0 {
                        return Err(mismatch("division by zero".to_string()));
                    }
                    Ok(Value::Float(x / y))
                }
            }
        }
        _ => Err(mismatch(format!(
            "expects numbers, got {} and {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

fn int_or_float(exact: Option<i64>, overflowed: f64) -> Value {
    match exact {
        Some(n) => Value::Integer(n),
        None => Value::Float(overflowed),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(n) => *n as f64,
        Value::Float(n) => *n,
        _ => 0.0,
    }
}

/// Walk a variable path down the scope
fn lookup_var(scope: &Scope, name: &str, path: &[PathSeg]) -> Option<Value> {
    let mut current = scope.lookup(name)?;
    for seg in path {
        current = match (seg, current) {
            (PathSeg::Key(key), Value::Table(table)) => table.get(key)?,
            (PathSeg::Index(index), Value::Array(items)) => {
                if *index < 0 {
                    return None;
                }
                items.get(*index as usize)?
            }
            // Numeric subscripts reach numeric-string keys in tables
            (PathSeg::Index(index), Value::Table(table)) => table.get(&index.to_string())?,
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Truthiness for conditions
///
/// Empty strings, zero, empty collections and false are falsy; everything
/// else is truthy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Integer(n) => *n != 0,
        Value::Float(n) => *n != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Table(table) => !table.is_empty(),
        Value::Datetime(_) => true,
    }
}
