//! Positioned messages about a source file, rendered as annotated snippets.

use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The file could not be processed.
    Error,
    /// The file was processed but part of it was left alone.
    Warning,
}

impl Severity {
    const fn level(self) -> Level {
        match self {
            Self::Error => Level::Error,
            Self::Warning => Level::Warning,
        }
    }
}

#[salsa::accumulator]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    range: TextRange,
    label: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { severity: Severity::Error, message: message.into(), range, label: None }
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self { severity: Severity::Warning, message: message.into(), range, label: None }
    }

    /// Replaces the default `here` annotation under the range.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn range(&self) -> TextRange {
        self.range
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("here")
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let level = self.severity.level();
        let message = level.title(&self.message).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(level.span(self.clamped(text)).label(self.label()))
                .fold(true),
        );
        renderer.render(message)
    }

    /// The range as byte offsets that are valid for `text`.
    fn clamped(&self, text: &str) -> std::ops::Range<usize> {
        let end = usize::from(self.range.end()).min(text.len());
        let start = usize::from(self.range.start()).min(end);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextSize;

    use super::*;

    fn render(diagnostic: &Diagnostic, text: &str) -> String {
        diagnostic.render(&Renderer::plain(), "t.py", text).to_string()
    }

    #[test]
    fn errors_point_at_their_range() {
        let text = "x = 1\ny = (2\n";
        let range = TextRange::at(TextSize::new(10), TextSize::new(1));
        let diagnostic = Diagnostic::error("'(' was never closed", range);

        let rendered = render(&diagnostic, text);
        assert!(rendered.starts_with("error: '(' was never closed"), "{rendered}");
        assert!(rendered.contains("t.py"), "{rendered}");
        assert!(rendered.contains("y = (2"), "{rendered}");
        assert!(rendered.contains("here"), "{rendered}");
    }

    #[test]
    fn warnings_carry_their_label() {
        let text = "msg = '%s' % (a, b)\n";
        let range = TextRange::up_to(TextSize::of(text.trim_end()));
        let diagnostic = Diagnostic::warning("interpolation left alone", range)
            .with_label("2 values for 1 specifier");

        assert_eq!(diagnostic.severity(), Severity::Warning);
        assert_eq!(diagnostic.label(), "2 values for 1 specifier");
        let rendered = render(&diagnostic, text);
        assert!(rendered.starts_with("warning: interpolation left alone"), "{rendered}");
        assert!(rendered.contains("2 values for 1 specifier"), "{rendered}");
    }

    #[test]
    fn ranges_past_the_end_are_clamped() {
        let diagnostic = Diagnostic::error("unexpected end of file", TextRange::empty(40.into()));
        assert_eq!(diagnostic.clamped("pass\n"), 5..5);
        assert!(render(&diagnostic, "pass\n").contains("unexpected end of file"));
    }
}
