use std::sync::Arc;

use text_size::{TextRange, TextSize};
use weft_syntax::{Token, TokenKind, Tokens};

use crate::{LexError, Tokenizer};

/// Tokenizes `text` into the full token sequence, whitespace included.
///
/// Every gap between two lexer tokens becomes a [`TokenKind::Ws`] token, so the
/// concatenated token texts reproduce `text` exactly. This is checked before
/// returning.
pub fn make_tokens(text: &str) -> Result<Tokens, LexError> {
    let raw_tokens = Tokenizer::new(text).tokenize()?;
    let lines = Lines::new(text);

    let mut tokens = Vec::with_capacity(raw_tokens.len() * 2);
    let mut offset = TextSize::new(0);
    for raw in raw_tokens {
        if raw.range.start() > offset {
            let range = TextRange::new(offset, raw.range.start());
            tokens.push(lines.token(tokens.len(), TokenKind::Ws, range, text));
        }
        tokens.push(lines.token(tokens.len(), raw.kind, raw.range, text));
        offset = raw.range.end();
    }

    let tokens = Tokens::new(tokens);
    if tokens.text() != text {
        return Err(LexError {
            message: "tokens do not round-trip to the source text".to_owned(),
            range: TextRange::empty(offset),
        });
    }
    Ok(tokens)
}

struct Lines {
    starts: Vec<TextSize>,
    texts: Vec<Arc<str>>,
}

impl Lines {
    fn new(text: &str) -> Self {
        let mut starts = vec![TextSize::new(0)];
        starts.extend(text.match_indices('\n').map(|(i, _)| TextSize::new(i as u32 + 1)));
        let texts = text.split_inclusive('\n').map(Arc::from).collect();
        Self { starts, texts }
    }

    /// 1-based line containing `offset`.
    fn line_number(&self, offset: TextSize) -> u32 {
        self.starts.partition_point(|&start| start <= offset) as u32
    }

    fn token(&self, index: usize, kind: TokenKind, range: TextRange, text: &str) -> Token {
        let line_number = self.line_number(range.start());
        let line = self
            .texts
            .get(line_number as usize - 1)
            .cloned()
            .unwrap_or_else(|| Arc::from(""));
        Token {
            kind,
            text: text[range].to_owned(),
            index,
            line_number,
            line,
            range,
            node: None,
            statement: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    fn dump(text: &str) -> String {
        let tokens = make_tokens(text).unwrap();
        tokens
            .iter()
            .map(|token| format!("{} {} {:?}\n", token.line_number, token.kind, token.text))
            .collect()
    }

    #[test]
    fn whitespace_is_materialized() {
        expect![[r#"
            1 name "x"
            1 ws " "
            1 op "="
            1 ws " "
            1 number "1"
            1 op "+"
            1 number "2"
            1 newline "\n"
            2 endmarker ""
        "#]]
        .assert_eq(&dump("x = 1+2\n"));
    }

    #[test]
    fn dedent_follows_indentation_whitespace() {
        expect![[r#"
            1 name "if"
            1 ws " "
            1 name "a"
            1 op ":"
            1 newline "\n"
            2 indent "    "
            2 name "if"
            2 ws " "
            2 name "b"
            2 op ":"
            2 newline "\n"
            3 indent "        "
            3 name "c"
            3 newline "\n"
            4 ws "    "
            4 dedent ""
            4 name "d"
            4 newline "\n"
            5 dedent ""
            5 endmarker ""
        "#]]
        .assert_eq(&dump("if a:\n    if b:\n        c\n    d\n"));
    }

    #[test]
    fn continuation_lines_become_whitespace() {
        expect![[r#"
            1 name "x"
            1 ws " "
            1 op "="
            1 ws " \\\n    "
            2 number "1"
            2 newline "\n"
            3 endmarker ""
        "#]]
        .assert_eq(&dump("x = \\\n    1\n"));
    }

    #[test]
    fn round_trips() {
        let sources = [
            "",
            "\n\n",
            "def f(a, *, b=1) -> int:\n    return a  # done\n\n\nclass C: pass\n",
            "x = [\n    1,\n    2,\n]\r\ny = '''a\nb'''\n",
            "if x:\n\ty\n  \n# tail",
        ];
        for source in sources {
            let tokens = make_tokens(source).unwrap();
            assert_eq!(tokens.text(), source);
            assert!(tokens.iter().enumerate().all(|(i, token)| token.index == i));
        }
    }

    #[test]
    fn owning_lines() {
        let tokens = make_tokens("a = 1\nbb = 2\n").unwrap();
        let bb = tokens.iter().find(|token| token.text == "bb").unwrap();
        assert_eq!(&*bb.line, "bb = 2\n");
        assert_eq!(bb.line_number, 2);
    }
}
