use std::sync::LazyLock;

use regex::Regex;

use crate::RewriteSkipped;

static SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"%(?P<flags>[-+ 0#]*)(?P<width>[0-9]*)",
        r"(?P<precision>\.[0-9]+)?(?P<conversion>[bcdeEfFgGnoxrsX%])",
    ))
    .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'s> {
    Text(&'s str),
    Specifier(Specifier<'s>),
}

/// A `%` conversion specifier such as `%-10s` or `%5.2f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Specifier<'s> {
    text: &'s str,
    flags: &'s str,
    width: &'s str,
    /// Includes the leading `.`.
    precision: &'s str,
    conversion: char,
}

/// Splits the body of a `%` format string into literal text and specifiers.
///
/// `%%` becomes the literal text `%`. Any other `%` that does not start a
/// supported specifier rejects the whole string.
pub(crate) fn parse(body: &str) -> Result<Vec<Piece<'_>>, RewriteSkipped> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    for captures in SPECIFIER.captures_iter(body) {
        let Some(whole) = captures.get(0) else { continue };
        push_text(&mut pieces, &body[pos..whole.start()])?;
        pos = whole.end();

        let group = |name| captures.name(name).map_or("", |m| m.as_str());
        let specifier = Specifier {
            text: whole.as_str(),
            flags: group("flags"),
            width: group("width"),
            precision: group("precision"),
            conversion: group("conversion").chars().next().unwrap_or('%'),
        };
        if specifier.conversion == '%' {
            if specifier.text != "%%" {
                return Err(specifier.unsupported());
            }
            pieces.push(Piece::Text("%"));
        } else {
            pieces.push(Piece::Specifier(specifier));
        }
    }

    push_text(&mut pieces, &body[pos..])?;
    Ok(pieces)
}

fn push_text<'s>(pieces: &mut Vec<Piece<'s>>, text: &'s str) -> Result<(), RewriteSkipped> {
    if let Some(percent) = text.find('%') {
        let rest = &text[percent..];
        return Err(if rest.starts_with("%(") {
            RewriteSkipped::MappingKey
        } else {
            RewriteSkipped::UnsupportedSpecifier(rest.chars().take(2).collect())
        });
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(())
}

impl Specifier<'_> {
    /// The replacement field for `value`, braces included.
    pub(crate) fn render(&self, value: &str) -> Result<String, RewriteSkipped> {
        let left = self.flags.contains('-');

        let (conversion, spec) = match self.conversion {
            's' | 'r' => {
                if self.flags.chars().any(|flag| flag != '-') {
                    return Err(self.unsupported());
                }
                let mut spec = String::new();
                if !self.width.is_empty() {
                    spec.push(if left { '<' } else { '>' });
                    spec.push_str(self.width);
                }
                spec.push_str(self.precision);

                let conversion = match self.conversion {
                    'r' => "!r",
                    _ if spec.is_empty() => "",
                    _ => "!s",
                };
                (conversion, spec)
            }
            'd' if self.text == "%d" => ("", String::new()),
            'b' | 'c' | 'n' => return Err(self.unsupported()),
            'd' | 'o' | 'x' | 'X' if !self.precision.is_empty() => return Err(self.unsupported()),
            conversion => {
                let mut spec = String::new();
                if left {
                    spec.push('<');
                }
                if self.flags.contains('+') {
                    spec.push('+');
                } else if self.flags.contains(' ') {
                    spec.push(' ');
                }
                if self.flags.contains('#') {
                    spec.push('#');
                }
                if self.flags.contains('0') && !left {
                    spec.push('0');
                }
                spec.push_str(self.width);
                spec.push_str(self.precision);
                spec.push(conversion);
                ("", spec)
            }
        };

        let mut field = format!("{{{value}{conversion}");
        if !spec.is_empty() {
            field.push(':');
            field.push_str(&spec);
        }
        field.push('}');
        Ok(field)
    }

    fn unsupported(&self) -> RewriteSkipped {
        RewriteSkipped::UnsupportedSpecifier(self.text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use expect_test::{Expect, expect};

    use super::*;

    fn check(body: &str, expect: Expect) {
        let rendered = match parse(body) {
            Ok(pieces) => pieces
                .iter()
                .map(|piece| match piece {
                    Piece::Text(text) => format!("{text:?}\n"),
                    Piece::Specifier(specifier) => match specifier.render("v") {
                        Ok(field) => format!("{} => {field}\n", specifier.text),
                        Err(err) => format!("{} => {err}\n", specifier.text),
                    },
                })
                .collect(),
            Err(err) => format!("error: {err}\n"),
        };
        expect.assert_eq(&rendered);
    }

    #[test]
    fn strings_and_reprs() {
        check(
            "%s|%r|%10s|%-10s|%.3s|%5r",
            expect![[r#"
                %s => {v}
                "|"
                %r => {v!r}
                "|"
                %10s => {v!s:>10}
                "|"
                %-10s => {v!s:<10}
                "|"
                %.3s => {v!s:.3}
                "|"
                %5r => {v!r:>5}
            "#]],
        );
    }

    #[test]
    fn numbers() {
        check(
            "%d %5d %-5d %05d %+d % d %.2f %8.3e %#x %X %-05d",
            expect![[r#"
                %d => {v}
                " "
                %5d => {v:5d}
                " "
                %-5d => {v:<5d}
                " "
                %05d => {v:05d}
                " "
                %+d => {v:+d}
                " "
                % d => {v: d}
                " "
                %.2f => {v:.2f}
                " "
                %8.3e => {v:8.3e}
                " "
                %#x => {v:#x}
                " "
                %X => {v:X}
                " "
                %-05d => {v:<5d}
            "#]],
        );
    }

    #[test]
    fn literal_percent() {
        check(
            "100%% of %s",
            expect![[r#"
                "100"
                "%"
                " of "
                %s => {v}
            "#]],
        );
    }

    #[test]
    fn rejected_specifiers() {
        check("%(name)s", expect!["error: mapping keys are not supported\n"]);
        check("%i", expect!["error: unsupported specifier \"%i\"\n"]);
        check("%5%", expect!["error: unsupported specifier \"%5%\"\n"]);
        check("50%", expect!["error: unsupported specifier \"%\"\n"]);
        check(
            "%c %.3d %+s",
            expect![[r#"
                %c => unsupported specifier "%c"
                " "
                %.3d => unsupported specifier "%.3d"
                " "
                %+s => unsupported specifier "%+s"
            "#]],
        );
    }
}
