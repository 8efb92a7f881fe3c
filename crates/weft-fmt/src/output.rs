#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineEnd {
    /// Ends a logical line.
    Newline,
    /// Blank line, comment-only line or a break inside brackets.
    Nl,
    /// Inserted by line splitting.
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    FileStart,
    LineEnd(LineEnd),
    LineIndent,
    Blank,
    /// Leading whitespace of a line continued inside brackets; never cleaned.
    HardBlank,
    Op,
    OpNoBlanks,
    Lt,
    Rt,
    UnaryOp,
    Word,
    WordOp,
    String,
    Number,
    Comment,
    Verbatim,
}

/// One piece of beautified output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Output {
    pub(crate) kind: Kind,
    pub(crate) text: String,
}

impl Output {
    pub(crate) fn new(kind: Kind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    pub(crate) fn line_end(kind: LineEnd) -> Self {
        Self::new(Kind::LineEnd(kind), "\n")
    }

    pub(crate) const fn is_line_end(&self) -> bool {
        matches!(self.kind, Kind::LineEnd(_))
    }

    pub(crate) fn is_opener(&self) -> bool {
        matches!(self.kind, Kind::Lt | Kind::OpNoBlanks)
            && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    pub(crate) fn is_op(&self, text: &str) -> bool {
        self.kind == Kind::Op && self.text == text
    }
}

/// Rendered width of `pieces` in characters.
pub(crate) fn width(pieces: &[Output]) -> usize {
    pieces.iter().map(|piece| piece.text.chars().count()).sum()
}

pub(crate) fn render(pieces: &[Output]) -> String {
    pieces.iter().map(|piece| piece.text.as_str()).collect()
}
