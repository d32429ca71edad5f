//! Template parser
//!
//! Consumes the token stream and builds the compiled tree. Block pairing
//! (`@if`/`@endif`, `@foreach`/`@endforeach`) and arm ordering are enforced
//! here; the shapes of the expressions inside directives were already
//! checked by the expression parser.

use crate::error::{Result, TemplateError};
use crate::syntax::ast::{EscapeMode, IfArm, IncludeOrigin, Node, Program};
use crate::syntax::expr;
use crate::syntax::tokenize::{tokenize, Token};

/// Parse template source into a program
///
/// Include directives come out unresolved; the compiler's resolve pass
/// fills in their target paths.
pub(crate) fn parse(src: &str) -> Result<Program> {
    let tokens = tokenize(src)?;
    let mut cursor = Cursor { tokens, pos: 0 };
    let nodes = parse_nodes(&mut cursor)?;

    // A terminator left over here has no opening directive
    match cursor.peek() {
        None => Ok(Program { nodes }),
        Some(Token::ElseIf { line, .. }) => Err(stray("@elseif", "@if", *line)),
        Some(Token::Else { line }) => Err(stray("@else", "@if", *line)),
        Some(Token::EndIf { line }) => Err(stray("@endif", "@if", *line)),
        Some(Token::EndForeach { line }) => Err(stray("@endforeach", "@foreach", *line)),
        Some(_) => unreachable!("parse_nodes only stops at terminators"),
    }
}

fn stray(directive: &str, opener: &str, line: usize) -> TemplateError {
    TemplateError::Syntax {
        message: format!("{} without a matching {}", directive, opener),
        line,
    }
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

/// Parse nodes until a block terminator or end of input
///
/// Stops *before* `@elseif`/`@else`/`@endif`/`@endforeach` so the enclosing
/// block handler can consume its own terminator.
fn parse_nodes(cursor: &mut Cursor) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();

    loop {
        match cursor.peek() {
            None
            | Some(Token::ElseIf { .. })
            | Some(Token::Else { .. })
            | Some(Token::EndIf { .. })
            | Some(Token::EndForeach { .. }) => return Ok(nodes),
            Some(_) => {}
        }

        let token = match cursor.next() {
            Some(token) => token,
            None => return Ok(nodes),
        };

        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Output { src, mode, line } => {
                let (expr, raw) = expr::parse_output(&src, line)?;
                let escape = if raw { EscapeMode::Raw } else { mode };
                nodes.push(Node::Output { expr, escape, line });
            }
            Token::If { src, line } => {
                nodes.push(parse_if(cursor, &src, line)?);
            }
            Token::Foreach { src, line } => {
                let head = expr::parse_foreach_head(&src, line)?;
                let body = parse_nodes(cursor)?;
                match cursor.next() {
                    Some(Token::EndForeach { .. }) => {}
                    _ => {
                        return Err(TemplateError::Syntax {
                            message: "missing @endforeach".to_string(),
                            line,
                        });
                    }
                }
                nodes.push(Node::Foreach {
                    key: head.key,
                    binding: head.binding,
                    collection: head.collection,
                    body,
                    line,
                });
            }
            Token::Include { src, line } => {
                let name = expr::parse_name_arg(&src, line)?;
                nodes.push(Node::Include {
                    name,
                    origin: IncludeOrigin::Relative,
                    path: None,
                    line,
                });
            }
            Token::Template { src, line } => {
                let name = expr::parse_name_arg(&src, line)?;
                nodes.push(Node::Include {
                    name,
                    origin: IncludeOrigin::Theme,
                    path: None,
                    line,
                });
            }
            Token::Data { src, line } => {
                let (name, value) = expr::parse_assign_args(&src, line, "data")?;
                nodes.push(Node::Data { name, value, line });
            }
            Token::Global { src, line } => {
                let (name, value) = expr::parse_assign_args(&src, line, "global")?;
                nodes.push(Node::Global { name, value, line });
            }
            Token::ElseIf { .. }
            | Token::Else { .. }
            | Token::EndIf { .. }
            | Token::EndForeach { .. } => {
                unreachable!("terminators are handled before consuming")
            }
        }
    }
}

/// Parse an `@if` chain; the `@if` token itself is already consumed
fn parse_if(cursor: &mut Cursor, condition_src: &str, if_line: usize) -> Result<Node> {
    let condition = expr::parse_expression(condition_src, if_line)?;
    let body = parse_nodes(cursor)?;
    let mut arms = vec![IfArm {
        condition,
        body,
        line: if_line,
    }];
    let mut else_body = Vec::new();

    loop {
        match cursor.next() {
            Some(Token::ElseIf { src, line }) => {
                let condition = expr::parse_expression(&src, line)?;
                let body = parse_nodes(cursor)?;
                arms.push(IfArm {
                    condition,
                    body,
                    line,
                });
            }
            Some(Token::Else { line }) => {
                else_body = parse_nodes(cursor)?;
                match cursor.next() {
                    Some(Token::EndIf { .. }) => break,
                    Some(Token::ElseIf { line, .. }) => {
                        return Err(TemplateError::Syntax {
                            message: "@elseif is not allowed after @else".to_string(),
                            line,
                        });
                    }
                    Some(Token::Else { line }) => {
                        return Err(TemplateError::Syntax {
                            message: "duplicate @else".to_string(),
                            line,
                        });
                    }
                    _ => {
                        return Err(TemplateError::Syntax {
                            message: "missing @endif".to_string(),
                            line,
                        });
                    }
                }
            }
            Some(Token::EndIf { .. }) => break,
            _ => {
                return Err(TemplateError::Syntax {
                    message: "missing @endif".to_string(),
                    line: if_line,
                });
            }
        }
    }

    Ok(Node::If {
        arms,
        else_body,
        line: if_line,
    })
}
