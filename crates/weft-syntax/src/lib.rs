//! Token sequence and syntax tree shared by every pass.
//!
//! Tokens live in one index-stable [`Tokens`] sequence; the syntax tree is a flat
//! arena of [`Node`]s addressed by [`NodeId`]. Links between the two (token to node,
//! node to token range, parent and children) start out empty and are filled in by
//! the synchronizer.

mod ast;
mod token;
mod tree;

pub use ast::{
    Alias, Arguments, BinOpKind, BoolOpKind, ClassDef, CmpOpKind, Constant, FunctionDef, Keyword,
    NodeKind, UnaryOpKind, WithItem,
};
pub use text_size::{TextRange, TextSize};
pub use token::{Token, TokenKind, Tokens};
pub use tree::{Node, NodeId, SyntaxTree, TokenRange};
