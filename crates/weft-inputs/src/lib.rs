mod source;

pub use line_index::LineIndex;
use text_size::{TextRange, TextSize};

pub use crate::source::{Source, SourceError, regularize_nls};

#[salsa::input(debug)]
pub struct File {
    #[returns(ref)]
    pub path: camino::Utf8PathBuf,
    #[returns(deref)]
    pub text: String,
}

#[salsa::tracked]
impl File {
    #[salsa::tracked(returns(ref), no_eq)]
    pub fn line_index(self, db: &dyn salsa::Database) -> LineIndex {
        LineIndex::new(self.text(db))
    }
}

impl File {
    /// The range of the 1-based `line`, without its line break.
    pub fn line_range(self, db: &dyn salsa::Database, line: u32) -> Option<TextRange> {
        let range = self.line_index(db).line(line.checked_sub(1)?)?;
        let text = &self.text(db)[range];
        let content = text.trim_end_matches(['\n', '\r']);
        Some(TextRange::at(range.start(), TextSize::of(content)))
    }
}

#[cfg(test)]
mod tests {
    use salsa::DatabaseImpl;

    use super::*;

    #[test]
    fn line_ranges_exclude_line_breaks() {
        let db = DatabaseImpl::default();
        let file = File::new(&db, "t.py".into(), "x = 1\r\nif x:\n    pass".to_owned());

        let text = file.text(&db);
        let lines: Vec<Option<&str>> =
            (0..5).map(|line| file.line_range(&db, line).map(|range| &text[range])).collect();
        assert_eq!(lines, [None, Some("x = 1"), Some("if x:"), Some("    pass"), None]);
    }
}
