use la_arena::Arena;
use text_size::TextSize;
use weft_syntax::{Node, NodeId, NodeKind, SyntaxTree, TokenKind};
use weft_tokenizer::{RawToken, Tokenizer};

use crate::{ParseError, ParseResult};

pub(crate) struct Parser<'src> {
    text: &'src str,
    /// Lexer tokens minus comments and non-logical line breaks.
    tokens: Vec<RawToken>,
    pos: usize,
    nodes: Arena<Node>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(text: &'src str) -> ParseResult<Self> {
        let tokens = Tokenizer::new(text)
            .tokenize()?
            .into_iter()
            .filter(|token| !matches!(token.kind, TokenKind::Comment | TokenKind::Nl))
            .collect();
        Ok(Self { text, tokens, pos: 0, nodes: Arena::new() })
    }

    fn nth_token(&self, n: usize) -> RawToken {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + n).min(last)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.nth_token(0).kind
    }

    pub(crate) fn peek_text(&self) -> &'src str {
        self.nth_text(0)
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'src str {
        &self.text[self.nth_token(n).range]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_op(&self, op: &str) -> bool {
        self.at(TokenKind::Op) && self.peek_text() == op
    }

    pub(crate) fn nth_at_op(&self, n: usize, op: &str) -> bool {
        self.nth_token(n).kind == TokenKind::Op && self.nth_text(n) == op
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.nth_at_keyword(0, keyword)
    }

    pub(crate) fn nth_at_keyword(&self, n: usize, keyword: &str) -> bool {
        self.nth_token(n).kind == TokenKind::Name && self.nth_text(n) == keyword
    }

    /// A name that is not a reserved word.
    pub(crate) fn at_identifier(&self) -> bool {
        self.at(TokenKind::Name) && !is_keyword(self.peek_text())
    }

    pub(crate) fn advance(&mut self) -> &'src str {
        let text = self.peek_text();
        if !self.at(TokenKind::EndMarker) {
            self.pos += 1;
        }
        text
    }

    pub(crate) fn eat_op(&mut self, op: &str) -> bool {
        let matched = self.at_op(op);
        if matched {
            self.advance();
        }
        matched
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        let matched = self.at_keyword(keyword);
        if matched {
            self.advance();
        }
        matched
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.at(kind) {
            self.advance();
            Ok(())
        } else {
            self.error(format!("expected {kind}"))
        }
    }

    pub(crate) fn expect_op(&mut self, op: &str) -> ParseResult<()> {
        if self.eat_op(op) { Ok(()) } else { self.error(format!("expected '{op}'")) }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) { Ok(()) } else { self.error(format!("expected '{keyword}'")) }
    }

    pub(crate) fn identifier(&mut self) -> ParseResult<String> {
        if self.at_identifier() {
            Ok(self.advance().to_owned())
        } else {
            self.error("expected identifier")
        }
    }

    pub(crate) fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        let token = self.nth_token(0);
        let message = message.into();
        let message = match token.kind {
            TokenKind::Indent => "unexpected indent".to_owned(),
            TokenKind::Dedent => "unexpected unindent".to_owned(),
            TokenKind::EndMarker => format!("{message}, found end of file"),
            _ => format!("{message}, found '{}'", self.peek_text().escape_debug()),
        };
        Err(ParseError::Syntax { message, range: token.range })
    }

    /// Offset of the next token; the start of whatever node is parsed next.
    pub(crate) fn start(&self) -> TextSize {
        self.nth_token(0).range.start()
    }

    pub(crate) fn start_of(&self, node: NodeId) -> TextSize {
        self.nodes[node].start
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, start: TextSize) -> NodeId {
        self.nodes.alloc(Node::new(kind, start))
    }

    pub(crate) fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree::new(self.nodes, root)
    }
}

pub(crate) fn is_keyword(text: &str) -> bool {
    matches!(
        text,
        "False"
            | "None"
            | "True"
            | "and"
            | "as"
            | "assert"
            | "async"
            | "await"
            | "break"
            | "class"
            | "continue"
            | "def"
            | "del"
            | "elif"
            | "else"
            | "except"
            | "finally"
            | "for"
            | "from"
            | "global"
            | "if"
            | "import"
            | "in"
            | "is"
            | "lambda"
            | "nonlocal"
            | "not"
            | "or"
            | "pass"
            | "raise"
            | "return"
            | "try"
            | "while"
            | "with"
            | "yield"
    )
}
