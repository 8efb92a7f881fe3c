use weft_syntax::{NodeId, NodeKind, SyntaxTree, TokenKind, TokenRange, Tokens};

use crate::generator::CallParens;
use crate::{LinkedTree, SyncError};

/// The nearest statement enclosing `node`, `node` itself included.
///
/// Returns `None` for the module and for nodes that only have the module (or
/// a definition) above them.
pub fn find_statement_node(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    if matches!(tree.kind(node), NodeKind::Module { .. }) {
        return None;
    }
    tree.ancestors(node).find(|&ancestor| tree.kind(ancestor).is_statement())
}

pub fn nearest_common_ancestor(tree: &SyntaxTree, a: NodeId, b: NodeId) -> Option<NodeId> {
    tree.ancestors(b).find(|&ancestor| tree.is_ancestor(ancestor, a))
}

/// Puts `new` in place of `old` in the parent of `old`.
///
/// Returns `false` if `old` is the root.
pub fn replace_node(tree: &mut SyntaxTree, old: NodeId, new: NodeId) -> bool {
    match tree[old].parent {
        Some(parent) => {
            tree.replace_child(parent, old, new);
            true
        }
        None => false,
    }
}

/// Gives a token a new kind and text. See [`Tokens::replace`].
pub fn replace_token(tokens: &mut Tokens, index: usize, kind: TokenKind, text: &str) {
    tokens.replace(index, kind, text);
}

/// All tokens of `node`, extended back over opening parentheses that balance
/// closing ones inside the node, and forward past closing parentheses that
/// balance opening ones.
pub fn tokens_for_node(
    linked: &LinkedTree,
    node: NodeId,
) -> Result<Option<TokenRange>, SyncError> {
    let Some(range) = linked.tree[node].token_range else {
        return Ok(None);
    };
    let first = match_open_parens(&linked.file_name, &linked.tokens, range)?;
    let last = match_parens(&linked.file_name, &linked.tokens, range)?;
    Ok(Some(TokenRange { first, last }))
}

/// Returns the index from which every `)` closed in `range` is opened.
///
/// Parentheses are never linked, so `(a, b)[0]` starts at `a`.
pub fn match_open_parens(
    file_name: &str,
    tokens: &Tokens,
    range: TokenRange,
) -> Result<usize, SyncError> {
    let mut level = 0_usize;
    let mut missing = 0_usize;
    for index in range.indices() {
        let token = &tokens[index];
        if token.is_op("(") {
            level += 1;
        } else if token.is_op(")") {
            match level.checked_sub(1) {
                Some(open) => level = open,
                None => missing += 1,
            }
        }
    }

    let mut first = range.first;
    while missing > 0 && first > 0 {
        let token = &tokens[first - 1];
        if token.is_op("(") {
            missing -= 1;
        } else if token.is_op(")") {
            missing += 1;
        } else if token.is_significant() || token.is_op(",") || token.is_op(";") {
            break;
        }
        first -= 1;
    }

    if missing != 0 {
        let token = &tokens[range.first];
        return Err(SyncError {
            file: file_name.to_owned(),
            line: token.line_number,
            expected: format!("{missing} more '('"),
            found: first
                .checked_sub(1)
                .and_then(|index| tokens.get(index))
                .map_or_else(|| "start of token list".to_owned(), |token| token.show()),
            index: first.saturating_sub(1),
        });
    }
    Ok(first)
}

/// Returns the index just past which every `(` opened in `range` is closed.
pub fn match_parens(
    file_name: &str,
    tokens: &Tokens,
    range: TokenRange,
) -> Result<usize, SyncError> {
    let mut level = 0_usize;
    for index in range.indices() {
        let token = &tokens[index];
        if token.is_op("(") {
            level += 1;
        } else if token.is_op(")") {
            if level == 0 {
                break;
            }
            level -= 1;
        }
    }

    let mut last = range.last;
    while level > 0 && last + 1 < tokens.len() {
        let token = &tokens[last + 1];
        if token.is_op(")") {
            level -= 1;
        } else if token.is_op("(") {
            level += 1;
        } else if token.is_significant() {
            break;
        }
        last += 1;
    }

    if level != 0 {
        let token = &tokens[range.first];
        return Err(SyncError {
            file: file_name.to_owned(),
            line: token.line_number,
            expected: format!("{level} more ')'"),
            found: tokens
                .get(last + 1)
                .map_or_else(|| "end of token list".to_owned(), |token| token.show()),
            index: last + 1,
        });
    }
    Ok(last)
}

/// Index of the `)` closing the `(` at `open`.
pub(crate) fn matching_paren(tokens: &Tokens, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for token in tokens.as_slice().get(open..)? {
        if token.is_op("(") {
            depth += 1;
        } else if token.is_op(")") {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(token.index);
            }
        }
    }
    None
}

/// Hands the parentheses of every call to the call node.
///
/// Parentheses are not significant, so the generator leaves them unlinked; the
/// extent of a call should still include them.
pub(crate) fn link_call_parens(tokens: &mut Tokens, tree: &mut SyntaxTree, calls: &[CallParens]) {
    for &(call, open, close) in calls {
        tokens[open].node = Some(call);
        tokens[close].node = Some(call);

        let range = TokenRange { first: open, last: close };
        let ancestors: Vec<NodeId> = tree.ancestors(call).collect();
        for node in ancestors {
            tree[node].cover(range);
        }
    }
}
