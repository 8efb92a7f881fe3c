use weft_syntax::{Alias, BinOpKind, ClassDef, FunctionDef, NodeId, NodeKind, TokenKind, WithItem};

use super::exprs::{
    named_expr, star_expr_or_bit_or, target_list, test, testlist_star_expr, yield_expr,
};
use super::{args, comma_separated, dotted_name, suite};
use crate::ParseResult;
use crate::parser::Parser;

pub(super) fn statement(p: &mut Parser<'_>, body: &mut Vec<NodeId>) -> ParseResult<()> {
    let node = match p.peek_text() {
        _ if !p.at(TokenKind::Name) && !p.at_op("@") => return simple_statements(p, body),
        "if" => if_statement(p, "if")?,
        "while" => while_statement(p)?,
        "for" => for_statement(p, false)?,
        "try" => try_statement(p)?,
        "with" => with_statement(p, false)?,
        "def" => function_def(p, Vec::new(), false)?,
        "class" => class_def(p, Vec::new())?,
        "@" => decorated(p)?,
        "async" if p.nth_at_keyword(1, "def") => {
            p.advance();
            function_def(p, Vec::new(), true)?
        }
        "async" if p.nth_at_keyword(1, "for") => {
            p.advance();
            for_statement(p, true)?
        }
        "async" if p.nth_at_keyword(1, "with") => {
            p.advance();
            with_statement(p, true)?
        }
        _ => return simple_statements(p, body),
    };
    body.push(node);
    Ok(())
}

/// One or more small statements separated by `;` and ended by a newline.
pub(super) fn simple_statements(p: &mut Parser<'_>, body: &mut Vec<NodeId>) -> ParseResult<()> {
    loop {
        body.push(small_statement(p)?);
        if !p.eat_op(";") || p.at(TokenKind::Newline) {
            break;
        }
    }
    p.expect(TokenKind::Newline)
}

fn at_statement_end(p: &Parser<'_>) -> bool {
    p.at(TokenKind::Newline) || p.at(TokenKind::EndMarker) || p.at_op(";")
}

fn small_statement(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    if !p.at(TokenKind::Name) {
        return expression_statement(p);
    }

    let kind = match p.peek_text() {
        "pass" => {
            p.advance();
            NodeKind::Pass
        }
        "break" => {
            p.advance();
            NodeKind::Break
        }
        "continue" => {
            p.advance();
            NodeKind::Continue
        }
        "return" => {
            p.advance();
            let value = if at_statement_end(p) { None } else { Some(testlist_star_expr(p)?) };
            NodeKind::Return { value }
        }
        "raise" => {
            p.advance();
            let mut cause = None;
            let exc = if at_statement_end(p) {
                None
            } else {
                let exc = test(p)?;
                if p.eat_keyword("from") {
                    cause = Some(test(p)?);
                }
                Some(exc)
            };
            NodeKind::Raise { exc, cause }
        }
        "global" => {
            p.advance();
            NodeKind::Global { names: names(p)? }
        }
        "nonlocal" => {
            p.advance();
            NodeKind::Nonlocal { names: names(p)? }
        }
        "del" => {
            p.advance();
            let mut targets = vec![star_expr_or_bit_or(p)?];
            while p.eat_op(",") && !at_statement_end(p) {
                targets.push(star_expr_or_bit_or(p)?);
            }
            NodeKind::Delete { targets }
        }
        "assert" => {
            p.advance();
            let test_node = test(p)?;
            let msg = if p.eat_op(",") { Some(test(p)?) } else { None };
            NodeKind::Assert { test: test_node, msg }
        }
        "import" => {
            p.advance();
            let mut names = vec![alias(p, true)?];
            while p.eat_op(",") {
                names.push(alias(p, true)?);
            }
            NodeKind::Import { names }
        }
        "from" => import_from(p)?,
        _ => return expression_statement(p),
    };
    Ok(p.alloc(kind, start))
}

fn names(p: &mut Parser<'_>) -> ParseResult<Vec<String>> {
    let mut names = vec![p.identifier()?];
    while p.eat_op(",") {
        names.push(p.identifier()?);
    }
    Ok(names)
}

fn alias(p: &mut Parser<'_>, dotted: bool) -> ParseResult<Alias> {
    let name = if dotted { dotted_name(p)? } else { p.identifier()? };
    let asname = if p.eat_keyword("as") { Some(p.identifier()?) } else { None };
    Ok(Alias { name, asname })
}

fn import_from(p: &mut Parser<'_>) -> ParseResult<NodeKind> {
    p.expect_keyword("from")?;

    let mut level = 0;
    loop {
        if p.eat_op(".") {
            level += 1;
        } else if p.eat_op("...") {
            level += 3;
        } else {
            break;
        }
    }

    let module = if p.at_keyword("import") { None } else { Some(dotted_name(p)?) };
    if module.is_none() && level == 0 {
        return p.error("expected module name");
    }
    p.expect_keyword("import")?;

    let names = if p.eat_op("*") {
        vec![Alias { name: "*".to_owned(), asname: None }]
    } else if p.eat_op("(") {
        let names = comma_separated(p, ")", |p| alias(p, false))?;
        p.expect_op(")")?;
        names
    } else {
        let mut names = vec![alias(p, false)?];
        while p.eat_op(",") {
            names.push(alias(p, false)?);
        }
        names
    };
    Ok(NodeKind::ImportFrom { module, names, level })
}

/// Expression statements, assignments, augmented and annotated assignments.
fn expression_statement(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    let first = if p.at_keyword("yield") { yield_expr(p)? } else { testlist_star_expr(p)? };

    if p.eat_op(":") {
        let annotation = test(p)?;
        let value = if p.eat_op("=") { Some(assigned_value(p)?) } else { None };
        return Ok(p.alloc(NodeKind::AnnAssign { target: first, annotation, value }, start));
    }

    let augmented =
        if p.at(TokenKind::Op) { BinOpKind::from_augmented(p.peek_text()) } else { None };
    if let Some(op) = augmented {
        p.advance();
        let value = assigned_value(p)?;
        return Ok(p.alloc(NodeKind::AugAssign { target: first, op, value }, start));
    }

    if p.at_op("=") {
        let mut targets = vec![first];
        while p.eat_op("=") {
            targets.push(assigned_value(p)?);
        }
        let value = targets.pop().unwrap_or(first);
        return Ok(p.alloc(NodeKind::Assign { targets, value }, start));
    }

    Ok(p.alloc(NodeKind::Expr { value: first }, start))
}

fn assigned_value(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    if p.at_keyword("yield") { yield_expr(p) } else { testlist_star_expr(p) }
}

/// `if` and `elif` share this: an `elif` becomes a nested `If` in the else branch.
fn if_statement(p: &mut Parser<'_>, keyword: &str) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword(keyword)?;
    let test = named_expr(p)?;
    let body = suite(p)?;
    let orelse = if p.at_keyword("elif") {
        vec![if_statement(p, "elif")?]
    } else if p.eat_keyword("else") {
        suite(p)?
    } else {
        Vec::new()
    };
    Ok(p.alloc(NodeKind::If { test, body, orelse }, start))
}

fn else_clause(p: &mut Parser<'_>) -> ParseResult<Vec<NodeId>> {
    if p.eat_keyword("else") { suite(p) } else { Ok(Vec::new()) }
}

fn while_statement(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("while")?;
    let test = named_expr(p)?;
    let body = suite(p)?;
    let orelse = else_clause(p)?;
    Ok(p.alloc(NodeKind::While { test, body, orelse }, start))
}

fn for_statement(p: &mut Parser<'_>, is_async: bool) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("for")?;
    let target = target_list(p)?;
    p.expect_keyword("in")?;
    let iter = testlist_star_expr(p)?;
    let body = suite(p)?;
    let orelse = else_clause(p)?;
    Ok(p.alloc(NodeKind::For { is_async, target, iter, body, orelse }, start))
}

fn try_statement(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("try")?;
    let body = suite(p)?;

    let mut handlers = Vec::new();
    while p.at_keyword("except") {
        let start = p.start();
        p.advance();
        let mut name = None;
        let typ = if p.at_op(":") {
            None
        } else {
            let typ = test(p)?;
            if p.eat_keyword("as") {
                name = Some(p.identifier()?);
            }
            Some(typ)
        };
        let body = suite(p)?;
        handlers.push(p.alloc(NodeKind::ExceptHandler { typ, name, body }, start));
    }

    let orelse = if handlers.is_empty() { Vec::new() } else { else_clause(p)? };
    let finalbody = if p.eat_keyword("finally") { suite(p)? } else { Vec::new() };
    if handlers.is_empty() && finalbody.is_empty() {
        return p.error("expected 'except' or 'finally' block");
    }
    Ok(p.alloc(NodeKind::Try { body, handlers, orelse, finalbody }, start))
}

fn with_statement(p: &mut Parser<'_>, is_async: bool) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("with")?;

    let mut items = Vec::new();
    loop {
        let context_expr = test(p)?;
        let optional_vars =
            if p.eat_keyword("as") { Some(star_expr_or_bit_or(p)?) } else { None };
        items.push(WithItem { context_expr, optional_vars });
        if !p.eat_op(",") {
            break;
        }
    }

    let body = suite(p)?;
    Ok(p.alloc(NodeKind::With { is_async, items, body }, start))
}

fn decorated(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let mut decorators = Vec::new();
    while p.eat_op("@") {
        decorators.push(named_expr(p)?);
        p.expect(TokenKind::Newline)?;
    }

    if p.at_keyword("class") {
        class_def(p, decorators)
    } else if p.at_keyword("async") && p.nth_at_keyword(1, "def") {
        p.advance();
        function_def(p, decorators, true)
    } else {
        function_def(p, decorators, false)
    }
}

fn function_def(
    p: &mut Parser<'_>,
    decorators: Vec<NodeId>,
    is_async: bool,
) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("def")?;
    let name = p.identifier()?;

    p.expect_op("(")?;
    let params = args::parameters(p, ")", true)?;
    p.expect_op(")")?;

    let returns = if p.eat_op("->") { Some(test(p)?) } else { None };
    let body = suite(p)?;
    let def = FunctionDef { is_async, name, decorators, args: params, returns, body };
    Ok(p.alloc(NodeKind::FunctionDef(def), start))
}

fn class_def(p: &mut Parser<'_>, decorators: Vec<NodeId>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("class")?;
    let name = p.identifier()?;

    let (bases, keywords) = if p.eat_op("(") {
        let arguments = args::call_arguments(p)?;
        p.expect_op(")")?;
        arguments
    } else {
        (Vec::new(), Vec::new())
    };

    let body = suite(p)?;
    Ok(p.alloc(NodeKind::ClassDef(ClassDef { name, decorators, bases, keywords, body }), start))
}
