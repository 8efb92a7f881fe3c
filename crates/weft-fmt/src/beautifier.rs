use std::sync::LazyLock;

use regex::Regex;
use weft_sync::LinkedTree;
use weft_syntax::{Constant, NodeId, NodeKind, SyntaxTree, Token, TokenKind};

use crate::Options;
use crate::lines;
use crate::output::{self, Kind, LineEnd, Output};

static NO_BEAUTIFY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*pragma:\s*no\s*beautify\b").expect("valid regex")
});
static BEAUTIFY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*pragma:\s*beautify\b").expect("valid regex"));

/// Names spaced like binary operators.
const WORD_OPS: &[&str] = &["and", "elif", "else", "for", "if", "in", "not", "or", "while"];

/// Keywords that keep their blank before an opening bracket.
const KEYWORDS: &[&str] = &[
    "as", "assert", "await", "del", "except", "from", "import", "is", "lambda", "raise", "return",
    "with", "yield",
];

pub(crate) struct Beautifier<'a> {
    linked: &'a LinkedTree,
    options: &'a Options,
    code: Vec<Output>,
    /// Literal indentation of every open block, innermost last.
    indents: Vec<String>,
    paren_level: usize,
    square_level: usize,
    curly_level: usize,
    /// Open parentheses of calls and parameter lists.
    in_arg_list: usize,
    verbatim: bool,
    /// Index in `code` where the current logical line starts.
    line_start: usize,
    split_count: usize,
    join_count: usize,
}

impl<'a> Beautifier<'a> {
    pub(crate) fn new(linked: &'a LinkedTree, options: &'a Options) -> Self {
        Self {
            linked,
            options,
            code: vec![Output::new(Kind::FileStart, "")],
            indents: Vec::new(),
            paren_level: 0,
            square_level: 0,
            curly_level: 0,
            in_arg_list: 0,
            verbatim: false,
            line_start: 1,
            split_count: 0,
            join_count: 0,
        }
    }

    pub(crate) fn run(mut self) -> String {
        let linked = self.linked;
        for token in &linked.tokens {
            if self.verbatim {
                self.verbatim_token(token);
            } else {
                self.token(token);
            }
        }

        tracing::debug!(
            file = %linked.file_name,
            split = self.split_count,
            joined = self.join_count,
            "beautified"
        );
        output::render(&self.code)
    }

    fn token(&mut self, token: &Token) {
        match token.kind {
            TokenKind::Name => self.name(&token.text),
            TokenKind::Number => {
                self.blank();
                self.push(Kind::Number, &token.text);
            }
            TokenKind::String => {
                self.push(Kind::String, regularize_nls(&token.text));
                self.blank();
            }
            TokenKind::Op => self.op(token),
            TokenKind::Newline => self.line_end(token, LineEnd::Newline),
            TokenKind::Nl => self.line_end(token, LineEnd::Nl),
            TokenKind::Indent => {
                self.indents.push(token.text.clone());
                self.line_indent();
            }
            TokenKind::Dedent => {
                self.indents.pop();
                self.line_indent();
            }
            TokenKind::Ws => self.ws(&token.text),
            TokenKind::Comment => self.comment(token),
            TokenKind::EndMarker => self.end_marker(),
            TokenKind::Killed => {}
        }
    }

    /// Copies `token` unchanged until a `# pragma: beautify` comment.
    fn verbatim_token(&mut self, token: &Token) {
        let text = regularize_nls(&token.text);
        match token.kind {
            TokenKind::Comment => {
                if BEAUTIFY.is_match(&text) {
                    self.verbatim = false;
                }
                self.push(Kind::Comment, text.trim_end());
            }
            TokenKind::Killed => {}
            kind => {
                if kind == TokenKind::Indent {
                    self.indents.push(token.text.clone());
                } else if kind == TokenKind::Dedent {
                    self.indents.pop();
                }
                self.push(Kind::Verbatim, text);
            }
        }
    }

    fn comment(&mut self, token: &Token) {
        let text = token.text.as_str();
        if BEAUTIFY.is_match(text) {
            self.verbatim = false;
        } else if NO_BEAUTIFY.is_match(text) {
            self.verbatim = true;
        }

        self.clean(Kind::Blank);
        if token.line.trim_start().starts_with('#') {
            // Whole-line comments keep their own indentation.
            self.clean(Kind::HardBlank);
            self.clean(Kind::LineIndent);
            self.push(Kind::Comment, token.line.trim_end());
        } else {
            self.push(Kind::Comment, format!("  {}", text.trim_end()));
        }
    }

    fn end_marker(&mut self) {
        while matches!(self.prev_kind(), Kind::LineEnd(_) | Kind::LineIndent) {
            self.code.pop();
        }
        if self.code.len() > 1 {
            self.code.push(Output::line_end(LineEnd::Newline));
        }
    }

    fn name(&mut self, name: &str) {
        let after_relative_dots = self.code.last().is_some_and(|prev| {
            prev.kind == Kind::OpNoBlanks && matches!(prev.text.as_str(), "." | "...")
        });
        if name == "import" && after_relative_dots {
            self.push(Kind::Blank, " ");
        }

        if WORD_OPS.contains(&name) {
            self.word_op(name);
        } else {
            self.word(name);
        }
    }

    fn op(&mut self, token: &Token) {
        let linked = self.linked;
        let node = token.node.map(|node| linked.tree.kind(node));
        let text = token.text.as_str();

        match text {
            "." => self.dot(text),
            "..." if matches!(node, Some(NodeKind::ImportFrom { .. })) => self.dot(text),
            "@" if matches!(node, Some(NodeKind::FunctionDef(_) | NodeKind::ClassDef(_))) => {
                self.clean(Kind::Blank);
                self.push(Kind::OpNoBlanks, text);
            }
            ":" => self.colon(token.node),
            "," | ";" => {
                self.clean(Kind::Blank);
                self.push(Kind::Op, text);
                self.blank();
            }
            "(" | "[" | "{" => self.lt(text),
            ")" | "]" | "}" => self.rt(text),
            "=" if matches!(
                node,
                Some(NodeKind::Call { .. } | NodeKind::Arguments(_) | NodeKind::ClassDef(_))
            ) =>
            {
                self.clean(Kind::Blank);
                self.push(Kind::OpNoBlanks, text);
            }
            "~" | "+" | "-" if matches!(node, Some(NodeKind::UnaryOp { .. })) => {
                self.unary_op(text);
            }
            "*" | "**"
                if matches!(
                    node,
                    Some(
                        NodeKind::Starred { .. }
                            | NodeKind::Arguments(_)
                            | NodeKind::Call { .. }
                            | NodeKind::Dict { .. }
                    )
                ) =>
            {
                self.unary_op(text);
            }
            _ => self.binary_op(text),
        }
    }

    fn dot(&mut self, text: &str) {
        // `from . import x` keeps the blank after `from`.
        let after_from = matches!(
            self.code.as_slice(),
            [.., word, blank] if word.kind == Kind::Word && word.text == "from"
                && blank.kind == Kind::Blank
        );
        if !after_from {
            self.clean(Kind::Blank);
        }
        self.push(Kind::OpNoBlanks, text);
    }

    /// Slice colons are spaced like binary operators only around complex bounds.
    fn colon(&mut self, node: Option<NodeId>) {
        let linked = self.linked;
        let tree = &linked.tree;
        // `a[1:2, ::]` keeps the blank after its comma.
        let after_comma = matches!(
            self.code.as_slice(),
            [.., comma, blank] if comma.is_op(",") && blank.kind == Kind::Blank
        );
        if !after_comma {
            self.clean(Kind::Blank);
        }

        let Some(NodeKind::Slice { lower, upper, step }) = node.map(|node| tree.kind(node)) else {
            self.push(Kind::Op, ":");
            self.blank();
            return;
        };
        if [lower, upper, step].into_iter().flatten().any(|&part| is_expr(tree, part)) {
            if !matches!(self.prev_text(), "[" | ":") {
                self.blank();
            }
            self.push(Kind::Op, ":");
            self.blank();
        } else {
            self.push(Kind::OpNoBlanks, ":");
        }
    }

    fn lt(&mut self, text: &str) {
        match text {
            "(" => self.paren_level += 1,
            "[" => self.square_level += 1,
            _ => self.curly_level += 1,
        }

        self.clean(Kind::Blank);
        match self.prev_kind() {
            Kind::Op | Kind::WordOp => {
                self.blank();
                self.push(Kind::Lt, text);
            }
            Kind::Word => {
                if text == "{" || KEYWORDS.contains(&self.prev_text()) {
                    self.blank();
                } else if text == "(" {
                    self.in_arg_list += 1;
                }
                self.push(Kind::Lt, text);
            }
            _ => self.push(Kind::OpNoBlanks, text),
        }
    }

    fn rt(&mut self, text: &str) {
        match text {
            ")" => {
                self.paren_level = self.paren_level.saturating_sub(1);
                self.in_arg_list = self.in_arg_list.saturating_sub(1);
            }
            "]" => self.square_level = self.square_level.saturating_sub(1),
            _ => self.curly_level = self.curly_level.saturating_sub(1),
        }
        self.clean(Kind::Blank);
        self.push(Kind::Rt, text);
    }

    fn unary_op(&mut self, text: &str) {
        self.clean(Kind::Blank);
        if self.prev_kind() != Kind::Lt {
            self.blank();
        }
        self.push(Kind::UnaryOp, text);
    }

    fn binary_op(&mut self, text: &str) {
        self.blank();
        self.push(Kind::Op, text);
        self.blank();
    }

    fn word(&mut self, text: &str) {
        if self.square_level > 0 {
            self.blank();
            self.push(Kind::Word, text);
        } else if self.in_arg_list > 0 {
            self.push(Kind::Word, text);
            self.blank();
        } else {
            self.blank();
            self.push(Kind::Word, text);
            self.blank();
        }
    }

    fn word_op(&mut self, text: &str) {
        self.blank();
        self.push(Kind::WordOp, text);
        self.blank();
    }

    /// Whitespace survives only as a backslash continuation or as the
    /// indentation of a line continued inside brackets.
    fn ws(&mut self, text: &str) {
        if text.contains("\\\n") || text.contains("\\\r\n") {
            self.clean(Kind::Blank);
            self.push(Kind::OpNoBlanks, regularize_nls(text));
        } else if self.prev_kind() == Kind::LineIndent && self.in_brackets() {
            self.clean(Kind::LineIndent);
            self.push(Kind::HardBlank, text);
        }
    }

    fn line_end(&mut self, token: &Token, kind: LineEnd) {
        self.clean(Kind::Blank);
        self.clean(Kind::LineIndent);
        self.code.push(Output::line_end(kind));

        let split = self.split_line(token);
        if !split && kind == LineEnd::Newline {
            self.join_lines();
        }
        if kind == LineEnd::Newline || !self.in_brackets() {
            self.line_start = self.code.len();
        }
        self.line_indent();
    }

    /// Splits the physical line just ended, if it belongs to a long statement.
    fn split_line(&mut self, token: &Token) -> bool {
        if self.options.max_split_width == 0 {
            return false;
        }
        let linked = self.linked;
        let long = token
            .statement
            .is_some_and(|statement| linked.tree.kind(statement).is_long_statement());
        if !long {
            return false;
        }

        let end = self.code.len() - 1;
        let start = self.code[..end]
            .iter()
            .rposition(|piece| matches!(piece.kind, Kind::LineEnd(_) | Kind::FileStart))
            .map_or(0, |i| i + 1);
        let Some(lines) = lines::split(&self.code[start..end], self.options) else {
            return false;
        };

        self.code.truncate(start);
        for line in lines {
            self.code.extend(line);
            self.code.push(Output::line_end(LineEnd::Split));
        }
        self.split_count += 1;
        true
    }

    /// Joins the physical lines of the logical line just ended, if they fit.
    fn join_lines(&mut self) {
        if self.options.max_join_width == 0 {
            return;
        }
        let end = self.code.len() - 1;
        let mut start = self.line_start.min(end);
        let mut indent = "";
        if self.code[start].kind == Kind::LineIndent {
            indent = self.code[start].text.as_str();
            start += 1;
        }
        let Some(joined) = lines::join(indent, &self.code[start..end], self.options) else {
            return;
        };

        self.code.truncate(start);
        self.code.push(Output::new(Kind::Verbatim, joined));
        self.code.push(Output::line_end(LineEnd::Newline));
        self.join_count += 1;
    }

    fn line_indent(&mut self) {
        self.clean(Kind::LineIndent);
        let indent = self.indents.last().map_or("", String::as_str);
        self.code.push(Output::new(Kind::LineIndent, indent));
    }

    fn blank(&mut self) {
        if !matches!(
            self.prev_kind(),
            Kind::Blank
                | Kind::FileStart
                | Kind::HardBlank
                | Kind::LineEnd(_)
                | Kind::LineIndent
                | Kind::Lt
                | Kind::OpNoBlanks
                | Kind::UnaryOp
        ) {
            self.push(Kind::Blank, " ");
        }
    }

    /// Drops the last piece if it has the given kind.
    fn clean(&mut self, kind: Kind) {
        if self.prev_kind() == kind {
            self.code.pop();
        }
    }

    fn push(&mut self, kind: Kind, text: impl Into<String>) {
        self.code.push(Output::new(kind, text));
    }

    fn prev_kind(&self) -> Kind {
        self.code.last().map_or(Kind::FileStart, |piece| piece.kind)
    }

    fn prev_text(&self) -> &str {
        self.code.last().map_or("", |piece| piece.text.as_str())
    }

    const fn in_brackets(&self) -> bool {
        self.paren_level + self.square_level + self.curly_level > 0
    }
}

/// Any expression other than a negated number.
fn is_expr(tree: &SyntaxTree, node: NodeId) -> bool {
    match tree.kind(node) {
        NodeKind::BinOp { .. } | NodeKind::Call { .. } | NodeKind::IfExp { .. } => true,
        NodeKind::UnaryOp { operand, .. } => {
            !matches!(tree.kind(*operand), NodeKind::Constant(Constant::Number(_)))
        }
        _ => false,
    }
}

fn regularize_nls(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
