use text_size::TextSize;
use weft_syntax::{NodeId, NodeKind, TokenKind};

use crate::ParseResult;
use crate::parser::Parser;

mod args;
mod exprs;
mod stmts;

pub(crate) fn module(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let mut body = Vec::new();
    while !p.at(TokenKind::EndMarker) {
        stmts::statement(p, &mut body)?;
    }
    Ok(p.alloc(NodeKind::Module { body }, TextSize::new(0)))
}

/// The body of a compound statement: an indented block or simple statements on the
/// same line.
fn suite(p: &mut Parser<'_>) -> ParseResult<Vec<NodeId>> {
    p.expect_op(":")?;

    let mut body = Vec::new();
    if p.at(TokenKind::Newline) {
        p.advance();
        p.expect(TokenKind::Indent)?;
        while !p.at(TokenKind::Dedent) && !p.at(TokenKind::EndMarker) {
            stmts::statement(p, &mut body)?;
        }
        p.expect(TokenKind::Dedent)?;
    } else {
        stmts::simple_statements(p, &mut body)?;
    }
    Ok(body)
}

fn dotted_name(p: &mut Parser<'_>) -> ParseResult<String> {
    let mut name = p.identifier()?;
    while p.eat_op(".") {
        name.push('.');
        name.push_str(&p.identifier()?);
    }
    Ok(name)
}

/// Parses `item (',' item)* [',']` up to (not including) `close`.
fn comma_separated<T>(
    p: &mut Parser<'_>,
    close: &str,
    mut item: impl FnMut(&mut Parser<'_>) -> ParseResult<T>,
) -> ParseResult<Vec<T>> {
    let mut items = Vec::new();
    while !p.at_op(close) {
        items.push(item(p)?);
        if !p.eat_op(",") {
            break;
        }
    }
    Ok(items)
}
