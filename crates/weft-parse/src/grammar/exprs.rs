use text_size::TextSize;
use weft_syntax::{
    BinOpKind, BoolOpKind, CmpOpKind, Constant, NodeId, NodeKind, TokenKind, UnaryOpKind,
};

use super::args;
use crate::ParseResult;
use crate::parser::{Parser, is_keyword};

/// Can the next token begin an expression?
pub(super) fn at_expr_start(p: &Parser<'_>) -> bool {
    match p.peek_kind() {
        TokenKind::Number | TokenKind::String => true,
        TokenKind::Name => {
            !is_keyword(p.peek_text())
                || matches!(
                    p.peek_text(),
                    "None" | "True" | "False" | "not" | "lambda" | "await" | "yield"
                )
        }
        TokenKind::Op => {
            matches!(p.peek_text(), "(" | "[" | "{" | "-" | "+" | "~" | "*" | "**" | "...")
        }
        _ => false,
    }
}

/// Comma-separated expressions and starred expressions, a tuple if there is a comma.
pub(super) fn testlist_star_expr(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let first = star_expr_or(p, test)?;
    tuple_tail(p, first, |p| star_expr_or(p, test))
}

/// Assignment targets of `for` loops and comprehensions.
pub(super) fn target_list(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let first = star_expr_or_bit_or(p)?;
    tuple_tail(p, first, star_expr_or_bit_or)
}

fn tuple_tail(
    p: &mut Parser<'_>,
    first: NodeId,
    mut element: impl FnMut(&mut Parser<'_>) -> ParseResult<NodeId>,
) -> ParseResult<NodeId> {
    if !p.at_op(",") {
        return Ok(first);
    }

    let mut elts = vec![first];
    while p.eat_op(",") && at_expr_start(p) && !p.at_keyword("yield") {
        elts.push(element(p)?);
    }
    let start = p.start_of(first);
    Ok(p.alloc(NodeKind::Tuple { elts }, start))
}

pub(super) fn star_expr_or_bit_or(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    star_expr_or(p, bit_or)
}

fn star_expr_or(
    p: &mut Parser<'_>,
    otherwise: fn(&mut Parser<'_>) -> ParseResult<NodeId>,
) -> ParseResult<NodeId> {
    if p.at_op("*") {
        let start = p.start();
        p.advance();
        let value = bit_or(p)?;
        Ok(p.alloc(NodeKind::Starred { value }, start))
    } else {
        otherwise(p)
    }
}

pub(super) fn yield_expr(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("yield")?;
    if p.eat_keyword("from") {
        let value = test(p)?;
        return Ok(p.alloc(NodeKind::YieldFrom { value }, start));
    }
    let value = if at_expr_start(p) { Some(testlist_star_expr(p)?) } else { None };
    Ok(p.alloc(NodeKind::Yield { value }, start))
}

/// `name := value` or a plain expression.
pub(super) fn named_expr(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    if p.at_identifier() && p.nth_at_op(1, ":=") {
        let start = p.start();
        let id = p.advance().to_owned();
        let target = p.alloc(NodeKind::Name { id }, start);
        p.advance();
        let value = test(p)?;
        return Ok(p.alloc(NodeKind::NamedExpr { target, value }, start));
    }
    test(p)
}

pub(super) fn test(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    if p.at_keyword("lambda") {
        return lambda(p);
    }

    let body = or_test(p)?;
    if !p.eat_keyword("if") {
        return Ok(body);
    }
    let test = or_test(p)?;
    p.expect_keyword("else")?;
    let orelse = self::test(p)?;
    let start = p.start_of(body);
    Ok(p.alloc(NodeKind::IfExp { test, body, orelse }, start))
}

fn lambda(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_keyword("lambda")?;
    let args = args::parameters(p, ":", false)?;
    p.expect_op(":")?;
    let body = test(p)?;
    Ok(p.alloc(NodeKind::Lambda { args, body }, start))
}

pub(super) fn or_test(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    bool_op(p, BoolOpKind::Or, and_test)
}

fn and_test(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    bool_op(p, BoolOpKind::And, not_test)
}

fn bool_op(
    p: &mut Parser<'_>,
    op: BoolOpKind,
    operand: fn(&mut Parser<'_>) -> ParseResult<NodeId>,
) -> ParseResult<NodeId> {
    let first = operand(p)?;
    if !p.at_keyword(op.as_str()) {
        return Ok(first);
    }

    let mut values = vec![first];
    while p.eat_keyword(op.as_str()) {
        values.push(operand(p)?);
    }
    let start = p.start_of(first);
    Ok(p.alloc(NodeKind::BoolOp { op, values }, start))
}

fn not_test(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    if p.at_keyword("not") {
        let start = p.start();
        p.advance();
        let operand = not_test(p)?;
        return Ok(p.alloc(NodeKind::UnaryOp { op: UnaryOpKind::Not, operand }, start));
    }
    comparison(p)
}

fn comparison_op(p: &mut Parser<'_>) -> Option<CmpOpKind> {
    let op = match (p.peek_kind(), p.peek_text()) {
        (TokenKind::Op, "==") => CmpOpKind::Eq,
        (TokenKind::Op, "!=") => CmpOpKind::NotEq,
        (TokenKind::Op, "<") => CmpOpKind::Lt,
        (TokenKind::Op, "<=") => CmpOpKind::LtE,
        (TokenKind::Op, ">") => CmpOpKind::Gt,
        (TokenKind::Op, ">=") => CmpOpKind::GtE,
        (TokenKind::Name, "in") => CmpOpKind::In,
        (TokenKind::Name, "not") if p.nth_at_keyword(1, "in") => {
            p.advance();
            CmpOpKind::NotIn
        }
        (TokenKind::Name, "is") if p.nth_at_keyword(1, "not") => {
            p.advance();
            CmpOpKind::IsNot
        }
        (TokenKind::Name, "is") => CmpOpKind::Is,
        _ => return None,
    };
    p.advance();
    Some(op)
}

fn comparison(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let left = bit_or(p)?;

    let mut ops = Vec::new();
    let mut comparators = Vec::new();
    while let Some(op) = comparison_op(p) {
        ops.push(op);
        comparators.push(bit_or(p)?);
    }

    if ops.is_empty() {
        return Ok(left);
    }
    let start = p.start_of(left);
    Ok(p.alloc(NodeKind::Compare { left, ops, comparators }, start))
}

/// Left-associative binary operators, loosest first.
const BINARY_LEVELS: &[&[&str]] =
    &[&["|"], &["^"], &["&"], &["<<", ">>"], &["+", "-"], &["*", "/", "%", "//", "@"]];

pub(super) fn bit_or(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    binary(p, 0)
}

fn binary(p: &mut Parser<'_>, level: usize) -> ParseResult<NodeId> {
    let Some(ops) = BINARY_LEVELS.get(level) else {
        return factor(p);
    };

    let mut left = binary(p, level + 1)?;
    while p.at(TokenKind::Op) && ops.contains(&p.peek_text()) {
        let Some(op) = BinOpKind::from_op(p.advance()) else {
            return p.error("expected a binary operator");
        };
        let right = binary(p, level + 1)?;
        let start = p.start_of(left);
        left = p.alloc(NodeKind::BinOp { left, op, right }, start);
    }
    Ok(left)
}

fn factor(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let op = match (p.peek_kind(), p.peek_text()) {
        (TokenKind::Op, "+") => UnaryOpKind::UAdd,
        (TokenKind::Op, "-") => UnaryOpKind::USub,
        (TokenKind::Op, "~") => UnaryOpKind::Invert,
        _ => return power(p),
    };
    let start = p.start();
    p.advance();
    let operand = factor(p)?;
    Ok(p.alloc(NodeKind::UnaryOp { op, operand }, start))
}

fn power(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let left = if p.at_keyword("await") {
        let start = p.start();
        p.advance();
        let value = primary(p)?;
        p.alloc(NodeKind::Await { value }, start)
    } else {
        primary(p)?
    };

    if !p.eat_op("**") {
        return Ok(left);
    }
    let right = factor(p)?;
    let start = p.start_of(left);
    Ok(p.alloc(NodeKind::BinOp { left, op: BinOpKind::Pow, right }, start))
}

/// An atom followed by attribute accesses, calls and subscripts.
fn primary(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let mut node = atom(p)?;
    loop {
        let start = p.start_of(node);
        let kind = if p.eat_op(".") {
            NodeKind::Attribute { value: node, attr: p.identifier()? }
        } else if p.eat_op("(") {
            let (args, keywords) = args::call_arguments(p)?;
            p.expect_op(")")?;
            NodeKind::Call { func: node, args, keywords }
        } else if p.eat_op("[") {
            let slice = subscript_list(p)?;
            p.expect_op("]")?;
            NodeKind::Subscript { value: node, slice }
        } else {
            return Ok(node);
        };
        node = p.alloc(kind, start);
    }
}

fn subscript_list(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let first = subscript(p)?;
    if !p.at_op(",") {
        return Ok(first);
    }

    let mut elts = vec![first];
    while p.eat_op(",") && !p.at_op("]") {
        elts.push(subscript(p)?);
    }
    let start = p.start_of(first);
    Ok(p.alloc(NodeKind::Tuple { elts }, start))
}

fn subscript(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    let lower = if p.at_op(":") {
        None
    } else {
        let lower = star_expr_or(p, named_expr)?;
        if !p.at_op(":") {
            return Ok(lower);
        }
        Some(lower)
    };

    p.expect_op(":")?;
    let slice_part = |p: &mut Parser<'_>| -> ParseResult<Option<NodeId>> {
        if p.at_op(":") || p.at_op(",") || p.at_op("]") { Ok(None) } else { test(p).map(Some) }
    };
    let upper = slice_part(p)?;
    let step = if p.eat_op(":") { slice_part(p)? } else { None };
    Ok(p.alloc(NodeKind::Slice { lower, upper, step }, start))
}

fn atom(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    match p.peek_kind() {
        TokenKind::Number => {
            let text = p.advance().to_owned();
            Ok(p.alloc(NodeKind::Constant(Constant::Number(text)), start))
        }
        TokenKind::String => strings(p),
        TokenKind::Name => {
            let constant = match p.peek_text() {
                "None" => Constant::None,
                "True" => Constant::True,
                "False" => Constant::False,
                _ => {
                    let id = p.identifier()?;
                    return Ok(p.alloc(NodeKind::Name { id }, start));
                }
            };
            p.advance();
            Ok(p.alloc(NodeKind::Constant(constant), start))
        }
        TokenKind::Op => match p.peek_text() {
            "(" => parenthesized(p),
            "[" => list(p),
            "{" => dict_or_set(p),
            "..." => {
                p.advance();
                Ok(p.alloc(NodeKind::Constant(Constant::Ellipsis), start))
            }
            _ => p.error("expected expression"),
        },
        _ => p.error("expected expression"),
    }
}

/// Adjacent string literals form a single node.
fn strings(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    let mut literals = Vec::new();
    while p.at(TokenKind::String) {
        literals.push(p.advance().to_owned());
    }

    let prefix = |literal: &String| {
        let quote = literal.find(['\'', '"']).unwrap_or(0);
        literal[..quote].to_ascii_lowercase()
    };
    let kind = if literals.iter().any(|literal| prefix(literal).contains('f')) {
        NodeKind::JoinedStr { literals }
    } else if literals.iter().any(|literal| prefix(literal).contains('b')) {
        NodeKind::Constant(Constant::Bytes(literals))
    } else {
        NodeKind::Constant(Constant::Str(literals))
    };
    Ok(p.alloc(kind, start))
}

fn at_comprehension(p: &Parser<'_>) -> bool {
    p.at_keyword("for") || (p.at_keyword("async") && p.nth_at_keyword(1, "for"))
}

pub(super) fn comprehensions(p: &mut Parser<'_>) -> ParseResult<Vec<NodeId>> {
    let mut generators = Vec::new();
    while at_comprehension(p) {
        let start = p.start();
        let is_async = p.eat_keyword("async");
        p.expect_keyword("for")?;
        let target = target_list(p)?;
        p.expect_keyword("in")?;
        let iter = or_test(p)?;

        let mut ifs = Vec::new();
        while p.eat_keyword("if") {
            ifs.push(or_test(p)?);
        }
        generators.push(p.alloc(NodeKind::Comprehension { is_async, target, iter, ifs }, start));
    }
    Ok(generators)
}

/// `elt for ...` once `elt` has been parsed, else `None`.
pub(super) fn generator_after(p: &mut Parser<'_>, elt: NodeId) -> ParseResult<Option<NodeId>> {
    if !at_comprehension(p) {
        return Ok(None);
    }
    let generators = comprehensions(p)?;
    let start = p.start_of(elt);
    Ok(Some(p.alloc(NodeKind::GeneratorExp { elt, generators }, start)))
}

fn parenthesized(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_op("(")?;

    if p.eat_op(")") {
        return Ok(p.alloc(NodeKind::Tuple { elts: Vec::new() }, start));
    }
    if p.at_keyword("yield") {
        let node = yield_expr(p)?;
        p.expect_op(")")?;
        return Ok(node);
    }

    let first = star_expr_or(p, named_expr)?;
    if let Some(generator) = generator_after(p, first)? {
        p.expect_op(")")?;
        return Ok(generator);
    }
    if !p.at_op(",") {
        p.expect_op(")")?;
        return Ok(first);
    }

    let mut elts = vec![first];
    while p.eat_op(",") && !p.at_op(")") {
        elts.push(star_expr_or(p, named_expr)?);
    }
    p.expect_op(")")?;
    Ok(p.alloc(NodeKind::Tuple { elts }, start))
}

fn list(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_op("[")?;

    if p.eat_op("]") {
        return Ok(p.alloc(NodeKind::List { elts: Vec::new() }, start));
    }

    let first = star_expr_or(p, named_expr)?;
    if at_comprehension(p) {
        let generators = comprehensions(p)?;
        p.expect_op("]")?;
        return Ok(p.alloc(NodeKind::ListComp { elt: first, generators }, start));
    }

    let mut elts = vec![first];
    while p.eat_op(",") && !p.at_op("]") {
        elts.push(star_expr_or(p, named_expr)?);
    }
    p.expect_op("]")?;
    Ok(p.alloc(NodeKind::List { elts }, start))
}

fn dict_or_set(p: &mut Parser<'_>) -> ParseResult<NodeId> {
    let start = p.start();
    p.expect_op("{")?;

    if p.eat_op("}") {
        return Ok(p.alloc(NodeKind::Dict { keys: Vec::new(), values: Vec::new() }, start));
    }

    let first_key = if p.eat_op("**") {
        None
    } else {
        let key = star_expr_or(p, test)?;
        if !p.at_op(":") {
            return set(p, key, start);
        }
        Some(key)
    };

    if first_key.is_some() {
        p.expect_op(":")?;
    }
    let first_value = if first_key.is_some() { test(p)? } else { bit_or(p)? };

    if let Some(key) = first_key.filter(|_| at_comprehension(p)) {
        let generators = comprehensions(p)?;
        p.expect_op("}")?;
        return Ok(p.alloc(NodeKind::DictComp { key, value: first_value, generators }, start));
    }

    let mut keys = vec![first_key];
    let mut values = vec![first_value];
    while p.eat_op(",") && !p.at_op("}") {
        if p.eat_op("**") {
            keys.push(None);
            values.push(bit_or(p)?);
        } else {
            keys.push(Some(test(p)?));
            p.expect_op(":")?;
            values.push(test(p)?);
        }
    }
    p.expect_op("}")?;
    Ok(p.alloc(NodeKind::Dict { keys, values }, start))
}

fn set(p: &mut Parser<'_>, first: NodeId, start: TextSize) -> ParseResult<NodeId> {
    if at_comprehension(p) {
        let generators = comprehensions(p)?;
        p.expect_op("}")?;
        return Ok(p.alloc(NodeKind::SetComp { elt: first, generators }, start));
    }

    let mut elts = vec![first];
    while p.eat_op(",") && !p.at_op("}") {
        elts.push(star_expr_or(p, test)?);
    }
    p.expect_op("}")?;
    Ok(p.alloc(NodeKind::Set { elts }, start))
}
