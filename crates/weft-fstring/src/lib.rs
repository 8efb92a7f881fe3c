//! Rewrites `'...' % values` expressions into f-strings.
//!
//! Candidates are found with [`traverse`] and rewritten afterwards, one at a
//! time. A rewrite replaces the first token of the expression with the new
//! literal and kills the rest, so every token index stays valid; the expression
//! subtree is swapped for a single string constant.

mod format;
#[cfg(test)]
mod tests;

use weft_sync::{
    ConsistencyError, LinkedTree, SyncError, renumber, replace_node, replace_token, tokens_for_node,
    traverse,
};
use weft_syntax::{BinOpKind, Constant, Node, NodeId, NodeKind, TokenKind, TokenRange};

use crate::format::Piece;

/// Why an interpolation was left alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteSkipped {
    #[error("string literal has a prefix")]
    Prefixed,
    #[error("triple-quoted string literal")]
    TripleQuoted,
    #[error("implicitly concatenated string literals")]
    Concatenated,
    #[error("mapping keys are not supported")]
    MappingKey,
    #[error("{specifiers} specifiers for {values} values")]
    CountMismatch { specifiers: usize, values: usize },
    #[error("backslash in a value")]
    Backslash,
    #[error("'#' in a value")]
    Hash,
    #[error("expression spans lines")]
    MultiLine,
    #[error("value starts with a brace")]
    Braces,
    #[error("value would need parentheses")]
    Parentheses,
    #[error("starred value")]
    Starred,
    #[error("no quote character fits")]
    QuoteConflict,
    #[error("unsupported specifier {0:?}")]
    UnsupportedSpecifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Line and new literal of each rewritten expression.
    pub rewritten: Vec<(u32, String)>,
    pub skipped: Vec<(u32, RewriteSkipped)>,
}

/// Rewrites every convertible `%` interpolation of a string literal in place.
pub fn rewrite_interpolations(linked: &mut LinkedTree) -> Result<RewriteReport, RewriteError> {
    let mut candidates = Vec::new();
    traverse(&linked.tree, |node| {
        if is_candidate(linked, node) {
            candidates.push(node);
        }
    })?;

    let mut report = RewriteReport::default();
    for node in candidates {
        // Already replaced along with an enclosing interpolation.
        if !linked.tree.is_attached(node) {
            continue;
        }
        let Some(range) = tokens_for_node(linked, node)? else { continue };
        let line = linked.tokens[range.first].line_number;

        match fstring(linked, node, range)? {
            Ok(text) => {
                tracing::debug!(file = %linked.file_name, line, %text, "rewrote interpolation");
                splice(linked, node, range, &text);
                report.rewritten.push((line, text));
            }
            Err(reason) => {
                tracing::debug!(file = %linked.file_name, line, %reason, "skipped interpolation");
                report.skipped.push((line, reason));
            }
        }
    }

    if !report.rewritten.is_empty() {
        renumber(&mut linked.tree);
    }
    Ok(report)
}

fn is_candidate(linked: &LinkedTree, node: NodeId) -> bool {
    match linked.tree.kind(node) {
        NodeKind::BinOp { left, op: BinOpKind::Mod, .. } => {
            matches!(linked.tree.kind(*left), NodeKind::Constant(Constant::Str(_)))
        }
        _ => false,
    }
}

struct Value {
    text: String,
    kind: NodeKind,
}

/// The f-string for the interpolation `node`, or why there is none.
fn fstring(
    linked: &LinkedTree,
    node: NodeId,
    range: TokenRange,
) -> Result<Result<String, RewriteSkipped>, SyncError> {
    let NodeKind::BinOp { left, right, .. } = linked.tree.kind(node) else {
        return Ok(Err(RewriteSkipped::Concatenated));
    };
    let NodeKind::Constant(Constant::Str(literals)) = linked.tree.kind(*left) else {
        return Ok(Err(RewriteSkipped::Concatenated));
    };
    let [literal] = literals.as_slice() else {
        return Ok(Err(RewriteSkipped::Concatenated));
    };

    let spans_lines = range.indices().any(|index| {
        let token = &linked.tokens[index];
        token.kind == TokenKind::Comment || token.text.contains('\n')
    });
    if spans_lines {
        return Ok(Err(RewriteSkipped::MultiLine));
    }

    let values = values(linked, *right)?;
    Ok(render(literal, &values))
}

/// The operands right of `%`; a tuple supplies one value per element.
fn values(linked: &LinkedTree, right: NodeId) -> Result<Vec<Value>, SyncError> {
    let elements = match linked.tree.kind(right) {
        NodeKind::Tuple { elts } => elts.clone(),
        _ => vec![right],
    };

    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        let text = match tokens_for_node(linked, element)? {
            Some(range) => range
                .indices()
                .map(|index| &linked.tokens[index])
                .filter(|token| token.kind != TokenKind::Killed)
                .map(|token| token.text.as_str())
                .collect(),
            None => String::new(),
        };
        values.push(Value { text, kind: linked.tree.kind(element).clone() });
    }
    Ok(values)
}

fn render(literal: &str, values: &[Value]) -> Result<String, RewriteSkipped> {
    let delimiter = match literal.chars().next() {
        Some(quote @ ('\'' | '"')) => quote,
        _ => return Err(RewriteSkipped::Prefixed),
    };
    if literal.starts_with("'''") || literal.starts_with("\"\"\"") {
        return Err(RewriteSkipped::TripleQuoted);
    }
    let body = &literal[1..literal.len() - 1];
    let pieces = format::parse(body)?;

    let specifiers = pieces.iter().filter(|piece| matches!(piece, Piece::Specifier(_))).count();
    if specifiers != values.len() {
        return Err(RewriteSkipped::CountMismatch { specifiers, values: values.len() });
    }
    for value in values {
        check_value(value)?;
    }
    let quote = choose_quote(delimiter, body, values)?;

    let mut out = String::from("f");
    out.push(quote);
    let mut values = values.iter();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(&text.replace('{', "{{").replace('}', "}}")),
            Piece::Specifier(specifier) => {
                let Some(value) = values.next() else {
                    return Err(RewriteSkipped::CountMismatch { specifiers, values: specifiers });
                };
                out.push_str(&specifier.render(&value.text)?);
            }
        }
    }
    out.push(quote);
    Ok(out)
}

fn check_value(value: &Value) -> Result<(), RewriteSkipped> {
    match value.kind {
        NodeKind::Lambda { .. } | NodeKind::NamedExpr { .. } => {
            return Err(RewriteSkipped::Parentheses);
        }
        NodeKind::Starred { .. } => return Err(RewriteSkipped::Starred),
        _ => {}
    }
    if value.text.contains('\\') {
        Err(RewriteSkipped::Backslash)
    } else if value.text.contains('#') {
        Err(RewriteSkipped::Hash)
    } else if value.text.starts_with('{') {
        Err(RewriteSkipped::Braces)
    } else {
        Ok(())
    }
}

/// The original delimiter, unless a value uses it.
fn choose_quote(delimiter: char, body: &str, values: &[Value]) -> Result<char, RewriteSkipped> {
    let other = if delimiter == '"' { '\'' } else { '"' };
    [delimiter, other]
        .into_iter()
        .find(|&quote| {
            (quote == delimiter || !body.contains(quote))
                && values.iter().all(|value| !value.text.contains(quote))
        })
        .ok_or(RewriteSkipped::QuoteConflict)
}

fn splice(linked: &mut LinkedTree, node: NodeId, range: TokenRange, text: &str) {
    replace_token(&mut linked.tokens, range.first, TokenKind::String, text);
    for index in range.first + 1..=range.last {
        linked.tokens.kill(index);
    }

    let kind = NodeKind::Constant(Constant::Str(vec![text.to_owned()]));
    let mut literal = Node::new(kind, linked.tree[node].start);
    literal.token_range = Some(range);
    let literal = linked.tree.alloc(literal);
    replace_node(&mut linked.tree, node, literal);
    linked.tokens[range.first].node = Some(literal);
}
