use salsa::{Accumulator as _, Database};
use weft_errors::{Diagnostic, TextRange};
use weft_inputs::File;
use weft_sync::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    Fstringify,
    Beautify,
}

/// One pass over one file.
#[salsa::input(debug)]
pub(crate) struct Job {
    pub(crate) file: File,
    pub(crate) pass: Pass,
    pub(crate) options: weft_fmt::Options,
}

/// Returns the rewritten text of the job's file, or `None` if it could not be
/// processed. Failures and interpolations left alone are accumulated as
/// [`Diagnostic`]s.
#[salsa::tracked]
pub(crate) fn run_job(db: &dyn Database, job: Job) -> Option<String> {
    let file = job.file(db);
    let mut linked = match weft_sync::link(file.path(db).as_str(), file.text(db)) {
        Ok(linked) => linked,
        Err(error) => {
            link_diagnostic(db, file, &error).accumulate(db);
            return None;
        }
    };

    match job.pass(db) {
        Pass::Beautify => Some(weft_fmt::beautify(&linked, &job.options(db))),
        Pass::Fstringify => match weft_fstring::rewrite_interpolations(&mut linked) {
            Ok(report) => {
                for (line, reason) in &report.skipped {
                    let range = line_range(db, file, *line);
                    Diagnostic::warning("interpolation left alone", range)
                        .with_label(reason.to_string())
                        .accumulate(db);
                }
                Some(linked.text())
            }
            Err(error) => {
                Diagnostic::error(error.to_string(), TextRange::empty(0.into())).accumulate(db);
                None
            }
        },
    }
}

fn link_diagnostic(db: &dyn Database, file: File, error: &LinkError) -> Diagnostic {
    match error {
        LinkError::Lex(error) => Diagnostic::error(error.to_string(), error.range),
        LinkError::Parse(error) => Diagnostic::error(error.to_string(), error.range()),
        LinkError::Sync(error) => Diagnostic::error(
            format!("expected {}, found {}", error.expected, error.found),
            line_range(db, file, error.line),
        )
        .with_label(format!("token {}", error.index)),
    }
}

fn line_range(db: &dyn Database, file: File, line: u32) -> TextRange {
    file.line_range(db, line).unwrap_or_else(|| TextRange::empty(0.into()))
}

#[cfg(test)]
mod tests {
    use salsa::DatabaseImpl;
    use weft_errors::Severity;

    use super::*;

    fn run(pass: Pass, text: &str) -> (Option<String>, Vec<(Severity, String, String)>) {
        let db = DatabaseImpl::default();
        let file = File::new(&db, "t.py".into(), text.to_owned());
        let job = Job::new(&db, file, pass, weft_fmt::Options::default());

        let output = run_job(&db, job);
        let diagnostics = run_job::accumulated::<Diagnostic>(&db, job)
            .into_iter()
            .map(|diagnostic| {
                let at = &text[diagnostic.range()];
                (diagnostic.severity(), diagnostic.message().to_owned(), at.to_owned())
            })
            .collect();
        (output, diagnostics)
    }

    #[test]
    fn passes_rewrite_the_text() {
        let (output, diagnostics) = run(Pass::Beautify, "x=[1,2]\n");
        assert_eq!(output.as_deref(), Some("x = [1, 2]\n"));
        assert!(diagnostics.is_empty());

        let (output, diagnostics) = run(Pass::Fstringify, "msg = '%s is %d' % (name, age)\n");
        assert_eq!(output.as_deref(), Some("msg = f'{name} is {age}'\n"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn skipped_interpolations_are_warnings() {
        let text = "a = 1\nb = '%s %s' % (x,)\n";
        let (output, diagnostics) = run(Pass::Fstringify, text);
        assert_eq!(output.as_deref(), Some(text));
        let warning = (
            Severity::Warning,
            "interpolation left alone".to_owned(),
            "b = '%s %s' % (x,)".to_owned(),
        );
        assert_eq!(diagnostics, [warning]);
    }

    #[test]
    fn syntax_errors_are_reported_at_their_range() {
        let (output, diagnostics) = run(Pass::Beautify, "x = (1,\n");
        assert_eq!(output, None);
        let [(severity, _, at)] = diagnostics.as_slice() else {
            panic!("expected one diagnostic, got {diagnostics:?}");
        };
        assert_eq!(*severity, Severity::Error);
        assert_eq!(at, "(");
    }
}
