use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use text_size::TextRange;

use crate::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    /// End of a logical line.
    Newline,
    /// Line break that does not end a logical line: blank lines, comment-only
    /// lines and breaks inside brackets.
    Nl,
    Indent,
    Dedent,
    Ws,
    Comment,
    EndMarker,
    /// Left behind by a rewrite; never serialized.
    Killed,
}

impl TokenKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Number => "number",
            Self::String => "string",
            Self::Op => "op",
            Self::Newline => "newline",
            Self::Nl => "nl",
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Ws => "ws",
            Self::Comment => "comment",
            Self::EndMarker => "endmarker",
            Self::Killed => "killed",
        }
    }

    pub const fn is_line_end(self) -> bool {
        matches!(self, Self::Newline | Self::Nl)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Position in the token sequence. Never changes.
    pub index: usize,
    /// 1-based line of the first character.
    pub line_number: u32,
    /// Physical source line containing the first character, including its line break.
    pub line: Arc<str>,
    pub range: TextRange,
    pub node: Option<NodeId>,
    /// For line ends: the statement owning the line the token terminates.
    pub statement: Option<NodeId>,
}

impl Token {
    /// Significant tokens are the ones the synchronizer matches and links.
    ///
    /// Commas, semicolons and parentheses are syntax the tree does not record
    /// directly, so they are treated like whitespace.
    pub fn is_significant(&self) -> bool {
        match self.kind {
            TokenKind::Name | TokenKind::Number | TokenKind::String | TokenKind::EndMarker => true,
            TokenKind::Op => !matches!(self.text.as_str(), "," | ";" | "(" | ")"),
            _ => false,
        }
    }

    pub fn is_op(&self, text: &str) -> bool {
        self.kind == TokenKind::Op && self.text == text
    }

    pub fn is_name(&self, text: &str) -> bool {
        self.kind == TokenKind::Name && self.text == text
    }

    pub fn show(&self) -> String {
        match self.kind {
            TokenKind::EndMarker => "end of file".to_owned(),
            kind => format!("{kind} {:?}", self.text),
        }
    }
}

/// The token sequence of one source file.
///
/// Tokens are never removed: a rewrite marks unused tokens as [`TokenKind::Killed`]
/// so that every index stays valid for the lifetime of the sequence.
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    tokens: Vec<Token>,
}

impl Tokens {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.iter().enumerate().all(|(i, token)| token.index == i));
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Concatenates the text of every live token.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .filter(|token| token.kind != TokenKind::Killed)
            .map(|token| token.text.as_str())
            .collect()
    }

    /// First significant token after `index`, without moving any cursor.
    pub fn next_significant(&self, index: Option<usize>) -> Option<&Token> {
        let start = index.map_or(0, |i| i + 1);
        self.tokens.get(start..)?.iter().find(|token| token.is_significant())
    }

    /// Gives the token at `index` a new kind and text and unlinks it.
    ///
    /// The end marker and tokens that are already killed are left alone.
    pub fn replace(&mut self, index: usize, kind: TokenKind, text: impl Into<String>) {
        let token = &mut self.tokens[index];
        if matches!(token.kind, TokenKind::EndMarker | TokenKind::Killed) {
            return;
        }
        token.kind = kind;
        token.text = text.into();
        token.node = None;
    }

    pub fn kill(&mut self, index: usize) {
        self.replace(index, TokenKind::Killed, "");
    }
}

impl Index<usize> for Tokens {
    type Output = Token;

    #[track_caller]
    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl IndexMut<usize> for Tokens {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut Token {
        &mut self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
