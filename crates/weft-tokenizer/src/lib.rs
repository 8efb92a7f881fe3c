mod adapter;
mod cursor;

pub use adapter::make_tokens;
use cursor::{Cursor, EOF_CHAR};
use text_size::{TextRange, TextSize};
pub use weft_syntax::TokenKind;
use weft_syntax::TokenKind::{Comment, Dedent, EndMarker, Indent, Name, Newline, Nl, Number, Op};

/// A token as produced by the lexer: whitespace between tokens is not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken {
    pub kind: TokenKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub range: TextRange,
}

impl LexError {
    fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }
}

type LexResult<T = ()> = Result<T, LexError>;

const TAB_SIZE: u32 = 8;

pub struct Tokenizer<'src> {
    text: &'src str,
    cursor: Cursor<'src>,
    tokens: Vec<RawToken>,
    /// Indentation columns of the enclosing blocks, innermost last.
    indents: Vec<u32>,
    brackets: Vec<(char, TextSize)>,
    at_line_start: bool,
    /// The current logical line contains a token that is neither a comment nor a line break.
    in_statement: bool,
    /// The current physical line contains any token.
    line_dirty: bool,
}

impl<'src> Tokenizer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            in_statement: false,
            line_dirty: false,
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<RawToken>> {
        loop {
            if self.at_line_start {
                self.at_line_start = false;
                self.indentation()?;
            }

            match self.cursor.peek() {
                ' ' | '\t' | '\x0c' | '\r' if !self.at_newline() => {
                    self.cursor.advance();
                    self.skip();
                }
                _ if self.cursor.is_eof() => break,
                '\\' => self.continuation()?,
                '\n' | '\r' => self.newline(),
                '#' => {
                    self.cursor.advance_while(|c| c != '\n' && c != '\r');
                    self.push(Comment);
                }
                _ => {
                    self.token()?;
                    self.in_statement = true;
                }
            }
        }

        self.finish()
    }

    fn offset(&self) -> TextSize {
        TextSize::of(self.text) - self.cursor.len()
    }

    fn range(&self) -> TextRange {
        let end = self.offset();
        TextRange::new(end - self.cursor.pos_within_token(), end)
    }

    fn text(&self) -> &'src str {
        &self.text[self.range()]
    }

    fn error<T>(&self, message: impl Into<String>) -> LexResult<T> {
        Err(LexError::new(message, self.range()))
    }

    fn push(&mut self, kind: TokenKind) {
        let range = self.range();
        self.cursor.reset_pos_within_token();
        self.tokens.push(RawToken { kind, range });
        self.line_dirty = true;
    }

    fn skip(&mut self) {
        self.cursor.reset_pos_within_token();
    }

    fn at_newline(&self) -> bool {
        match self.cursor.peek() {
            '\n' => true,
            '\r' => self.cursor.second() == '\n',
            _ => false,
        }
    }

    /// Measures the indentation of a new line and emits INDENT or DEDENT tokens.
    ///
    /// Blank lines, comment-only lines and lines inside brackets do not take part.
    fn indentation(&mut self) -> LexResult {
        let mut column = 0;
        let mut width = 0;
        for c in self.text[usize::from(self.offset())..].chars() {
            match c {
                ' ' => column += 1,
                '\t' => column = (column / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => column = 0,
                _ => break,
            }
            width += c.len_utf8();
        }

        let after = &self.text[usize::from(self.offset()) + width..];
        if after.is_empty() || after.starts_with(['#', '\n']) || after.starts_with("\r\n") {
            return Ok(());
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            for _ in 0..width {
                self.cursor.advance();
            }
            self.indents.push(column);
            self.push(Indent);
            return Ok(());
        }

        for _ in 0..width {
            self.cursor.advance();
        }
        self.skip();
        while column < self.indents.last().copied().unwrap_or(0) {
            self.indents.pop();
            self.push(Dedent);
        }
        if column != self.indents.last().copied().unwrap_or(0) {
            return self.error("unindent does not match any outer indentation level");
        }
        Ok(())
    }

    fn continuation(&mut self) -> LexResult {
        self.cursor.advance();
        if !self.at_newline() {
            return self.error("unexpected character after line continuation character");
        }
        self.cursor.eat('\r');
        self.cursor.advance();
        if self.cursor.is_eof() {
            return self.error("unexpected end of file after line continuation");
        }
        self.skip();
        Ok(())
    }

    fn newline(&mut self) {
        self.cursor.eat('\r');
        self.cursor.advance();

        if self.brackets.is_empty() && self.in_statement {
            self.push(Newline);
            self.in_statement = false;
        } else {
            self.push(Nl);
        }
        self.line_dirty = false;
        self.at_line_start = self.brackets.is_empty();
    }

    fn token(&mut self) -> LexResult {
        let first = self.cursor.advance();
        match first {
            '0'..='9' => self.number(first),
            '.' if self.cursor.peek().is_ascii_digit() => self.number(first),
            '\'' | '"' => self.string(first)?,
            c if is_ident_start(c) => {
                self.cursor.advance_while(is_ident_continue);
                if is_string_prefix(self.text()) && matches!(self.cursor.peek(), '\'' | '"') {
                    let quote = self.cursor.advance();
                    self.string(quote)?;
                } else {
                    self.push(Name);
                }
            }
            _ => self.operator(first)?,
        }
        Ok(())
    }

    fn number(&mut self, first: char) {
        let is_digit = |c: char| c.is_ascii_digit() || c == '_';

        if first == '0' && matches!(self.cursor.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            self.cursor.advance();
            self.cursor.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
            self.push(Number);
            return;
        }

        self.cursor.advance_while(is_digit);
        if first != '.' && self.cursor.eat('.') {
            self.cursor.advance_while(is_digit);
        }

        if matches!(self.cursor.peek(), 'e' | 'E') {
            let second = self.cursor.second();
            if second.is_ascii_digit() || second == '+' || second == '-' {
                self.cursor.advance();
                self.cursor.advance();
                self.cursor.advance_while(is_digit);
            }
        }

        if matches!(self.cursor.peek(), 'j' | 'J') {
            self.cursor.advance();
        }
        self.push(Number);
    }

    /// Lexes the rest of a string literal whose opening quote has been consumed.
    fn string(&mut self, quote: char) -> LexResult {
        let triple = self.cursor.peek() == quote && self.cursor.second() == quote;
        if triple {
            self.cursor.advance();
            self.cursor.advance();
        } else if self.cursor.peek() == quote {
            self.cursor.advance();
            self.push(TokenKind::String);
            return Ok(());
        }

        loop {
            if self.cursor.is_eof() {
                return self.error("unterminated string literal");
            }
            match self.cursor.advance() {
                '\\' => {
                    self.cursor.eat('\r');
                    self.cursor.advance();
                }
                '\n' if !triple => return self.error("unterminated string literal"),
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.cursor.peek() == quote && self.cursor.second() == quote {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                }
                _ => {}
            }
        }

        self.push(TokenKind::String);
        Ok(())
    }

    fn operator(&mut self, first: char) -> LexResult {
        let second = self.cursor.peek();
        let third = self.cursor.second();

        let width = match (first, second, third) {
            ('*', '*', '=') | ('/', '/', '=') | ('>', '>', '=') | ('<', '<', '=')
            | ('.', '.', '.') => 3,
            (
                '!' | '%' | '&' | '*' | '+' | '-' | '/' | ':' | '<' | '=' | '>' | '@' | '^' | '|',
                '=',
                _,
            )
            | ('*', '*', _)
            | ('/', '/', _)
            | ('<', '<', _)
            | ('>', '>', _)
            | ('-', '>', _) => 2,
            ('(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | ';' | '.' | '=' | '+' | '-', _, _)
            | ('*' | '/' | '%' | '<' | '>' | '&' | '|' | '^' | '~' | '@', _, _) => 1,
            _ => return self.error(format!("invalid character {first:?}")),
        };
        for _ in 1..width {
            self.cursor.advance();
        }

        match first {
            '(' | '[' | '{' if width == 1 => self.brackets.push((first, self.offset())),
            ')' | ']' | '}' => match self.brackets.pop() {
                Some((open, _)) if closing(open) == first => {}
                Some((open, _)) => {
                    return self.error(format!(
                        "closing parenthesis '{first}' does not match opening parenthesis '{open}'"
                    ));
                }
                None => return self.error(format!("unmatched '{first}'")),
            },
            _ => {}
        }

        self.push(Op);
        Ok(())
    }

    fn finish(mut self) -> LexResult<Vec<RawToken>> {
        if let Some(&(open, offset)) = self.brackets.last() {
            return Err(LexError::new(
                format!("'{open}' was never closed"),
                TextRange::at(offset - TextSize::of(open), TextSize::of(open)),
            ));
        }

        if self.line_dirty {
            self.push(if self.in_statement { Newline } else { Nl });
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Dedent);
        }
        self.push(EndMarker);

        tracing::trace!(tokens = self.tokens.len(), "tokenized");
        debug_assert!(self.tokens.last().is_some_and(|token| token.kind == EndMarker));
        debug_assert_eq!(self.cursor.peek(), EOF_CHAR);
        Ok(self.tokens)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_string_prefix(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

#[cfg(test)]
mod tests {
    use expect_test::{Expect, expect};

    use super::*;

    fn check(text: &str, expect: Expect) {
        let tokens = Tokenizer::new(text).tokenize().unwrap();
        let actual = tokens
            .iter()
            .map(|token| format!("{} {:?}\n", token.kind, &text[token.range]))
            .collect::<std::string::String>();
        expect.assert_eq(&actual);
    }

    fn check_error(text: &str, expect: Expect) {
        let error = Tokenizer::new(text).tokenize().unwrap_err();
        expect.assert_eq(&format!("{} @ {:?}", error.message, error.range));
    }

    #[test]
    fn assignment() {
        check(
            "x = 1+2\n",
            expect![[r#"
                name "x"
                op "="
                number "1"
                op "+"
                number "2"
                newline "\n"
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn blocks() {
        check(
            "if x:\n    pass\nelse:\n  y\n",
            expect![[r#"
                name "if"
                name "x"
                op ":"
                newline "\n"
                indent "    "
                name "pass"
                newline "\n"
                dedent ""
                name "else"
                op ":"
                newline "\n"
                indent "  "
                name "y"
                newline "\n"
                dedent ""
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn comments_and_blank_lines() {
        check(
            "# lead\n\nx  # trail\n    # deeper\ny\n",
            expect![[r##"
                comment "# lead"
                nl "\n"
                nl "\n"
                name "x"
                comment "# trail"
                newline "\n"
                comment "# deeper"
                nl "\n"
                name "y"
                newline "\n"
                endmarker ""
            "##]],
        );
    }

    #[test]
    fn brackets_suppress_newlines() {
        check(
            "f(a,\n  b)\n",
            expect![[r#"
                name "f"
                op "("
                name "a"
                op ","
                nl "\n"
                name "b"
                op ")"
                newline "\n"
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn strings() {
        check(
            "s = rb'a\\'' f\"{x}\" '''one\ntwo''' ''\n",
            expect![[r#"
                name "s"
                op "="
                string "rb'a\\''"
                string "f\"{x}\""
                string "'''one\ntwo'''"
                string "''"
                newline "\n"
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn numbers_and_operators() {
        check(
            "a **= 0x1F + 1_000.5e-3j // .5 ... -> :=",
            expect![[r#"
                name "a"
                op "**="
                number "0x1F"
                op "+"
                number "1_000.5e-3j"
                op "//"
                number ".5"
                op "..."
                op "->"
                op ":="
                newline ""
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn continuation_lines_are_whitespace() {
        check(
            "x = 1 + \\\n    2\n",
            expect![[r#"
                name "x"
                op "="
                number "1"
                op "+"
                number "2"
                newline "\n"
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn missing_final_newline_closes_blocks() {
        check(
            "def f():\n    return 1",
            expect![[r#"
                name "def"
                name "f"
                op "("
                op ")"
                op ":"
                newline "\n"
                indent "    "
                name "return"
                number "1"
                newline ""
                dedent ""
                endmarker ""
            "#]],
        );
    }

    #[test]
    fn errors() {
        check_error("s = 'abc\n", expect!["unterminated string literal @ 4..9"]);
        check_error("f(a))\n", expect!["unmatched ')' @ 4..5"]);
        check_error("f(a\n", expect!["'(' was never closed @ 1..2"]);
        check_error("if x:\n    a\n  b\n", expect![
            "unindent does not match any outer indentation level @ 14..14"
        ]);
        check_error("a $ b\n", expect!["invalid character '$' @ 2..3"]);
    }
}
