//! Two-way links between the token sequence and the syntax tree.
//!
//! [`synchronize`] walks the tree in source order and matches every significant
//! token against the grammar rule of the node being visited. Afterwards each
//! significant token knows its node, each node knows the inclusive range of
//! tokens below it, and the tree carries parent, children and visitation
//! indices for [`traverse`].

mod generator;
mod nodes;
#[cfg(test)]
mod tests;
mod traverse;

use weft_parse::ParseError;
use weft_syntax::{SyntaxTree, Tokens};
use weft_tokenizer::LexError;

pub use crate::nodes::{
    find_statement_node, match_open_parens, match_parens, nearest_common_ancestor, replace_node,
    replace_token, tokens_for_node,
};
pub use crate::traverse::{ConsistencyError, renumber, traverse};

/// Tokens and tree of one source file after synchronization.
#[derive(Debug, Clone)]
pub struct LinkedTree {
    pub file_name: String,
    pub tokens: Tokens,
    pub tree: SyntaxTree,
}

impl LinkedTree {
    /// The source text, minus anything a rewrite has killed.
    pub fn text(&self) -> String {
        self.tokens.text()
    }
}

/// The grammar rule of a node and the token sequence disagree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}: line {line}: expected {expected}, found {found} (token {index})")]
pub struct SyncError {
    pub file: String,
    pub line: u32,
    pub expected: String,
    pub found: String,
    pub index: usize,
}

/// Any failure on the way from source text to a [`LinkedTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Links `tokens` and `tree`, which must describe the same source text.
pub fn synchronize(
    file_name: &str,
    mut tokens: Tokens,
    mut tree: SyntaxTree,
) -> Result<LinkedTree, SyncError> {
    let call_parens = generator::Generator::new(file_name, &mut tokens, &mut tree).run()?;
    nodes::link_call_parens(&mut tokens, &mut tree, &call_parens);

    tracing::debug!(file = file_name, tokens = tokens.len(), nodes = tree.len(), "synchronized");
    Ok(LinkedTree { file_name: file_name.to_owned(), tokens, tree })
}

/// Tokenizes, parses and synchronizes `text`.
pub fn link(file_name: &str, text: &str) -> Result<LinkedTree, LinkError> {
    let tokens = weft_tokenizer::make_tokens(text)?;
    let tree = weft_parse::parse(text)?;
    Ok(synchronize(file_name, tokens, tree)?)
}
