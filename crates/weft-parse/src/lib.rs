use text_size::TextRange;
use weft_syntax::SyntaxTree;
use weft_tokenizer::LexError;

mod grammar;
mod parser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{message}")]
    Syntax { message: String, range: TextRange },
}

impl ParseError {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Lex(error) => error.range,
            Self::Syntax { range, .. } => *range,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a whole Python module.
pub fn parse(text: &str) -> ParseResult<SyntaxTree> {
    let mut parser = parser::Parser::new(text)?;
    let root = grammar::module(&mut parser)?;
    let tree = parser.finish(root);
    tracing::trace!(nodes = tree.len(), "parsed");
    Ok(tree)
}
