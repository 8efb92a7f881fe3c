use weft_syntax::{Arguments, Keyword, NodeId, NodeKind};

use super::exprs::{generator_after, named_expr, test};
use crate::ParseResult;
use crate::parser::Parser;

/// Arguments of a call or a class header, after the opening parenthesis.
pub(super) fn call_arguments(p: &mut Parser<'_>) -> ParseResult<(Vec<NodeId>, Vec<Keyword>)> {
    let mut args = Vec::new();
    let mut keywords = Vec::new();

    while !p.at_op(")") {
        let start = p.start();
        if p.eat_op("*") {
            let value = test(p)?;
            args.push(p.alloc(NodeKind::Starred { value }, start));
        } else if p.eat_op("**") {
            let value = test(p)?;
            keywords.push(Keyword { arg: None, value, start });
        } else if p.at_identifier() && p.nth_at_op(1, "=") {
            let arg = p.advance().to_owned();
            p.advance();
            let value = test(p)?;
            keywords.push(Keyword { arg: Some(arg), value, start });
        } else {
            let value = named_expr(p)?;
            let value = generator_after(p, value)?.unwrap_or(value);
            args.push(value);
        }

        if !p.eat_op(",") {
            break;
        }
    }
    Ok((args, keywords))
}

/// A parameter list ending before `close`: `)` for functions, `:` for lambdas.
pub(super) fn parameters(p: &mut Parser<'_>, close: &str, annotated: bool) -> ParseResult<NodeId> {
    let start = p.start();
    let mut arguments = Arguments::default();
    let mut keyword_only = false;

    while !p.at_op(close) {
        if p.eat_op("/") {
            if keyword_only || !arguments.posonlyargs.is_empty() {
                return p.error("unexpected '/'");
            }
            arguments.posonlyargs = std::mem::take(&mut arguments.args);
        } else if p.eat_op("**") {
            arguments.kwarg = Some(parameter(p, annotated)?);
        } else if p.eat_op("*") {
            keyword_only = true;
            if !p.at_op(",") && !p.at_op(close) {
                arguments.vararg = Some(parameter(p, annotated)?);
            }
        } else {
            let param = parameter(p, annotated)?;
            let default = if p.eat_op("=") { Some(test(p)?) } else { None };
            if keyword_only {
                arguments.kwonlyargs.push(param);
                arguments.kw_defaults.push(default);
            } else {
                arguments.args.push(param);
                match default {
                    Some(default) => arguments.defaults.push(default),
                    None if !arguments.defaults.is_empty() => {
                        return p.error("non-default argument follows default argument");
                    }
                    None => {}
                }
            }
        }

        if !p.eat_op(",") {
            break;
        }
    }

    Ok(p.alloc(NodeKind::Arguments(arguments), start))
}

fn parameter(p: &mut Parser<'_>, annotated: bool) -> ParseResult<NodeId> {
    let start = p.start();
    let name = p.identifier()?;
    let annotation = if annotated && p.eat_op(":") { Some(test(p)?) } else { None };
    Ok(p.alloc(NodeKind::Arg { name, annotation }, start))
}
