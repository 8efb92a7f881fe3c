//! Splitting of long lines and joining of lines continued inside brackets.

use crate::Options;
use crate::output::{self, Kind, LineEnd, Output};

/// Splits `line` after its first opening bracket, putting each top-level element
/// of the bracket on its own line and the closing bracket on the last one.
///
/// Emitted lines that are still too long are split again. Returns `None` if the
/// line fits or has no complete bracket to split at.
pub(crate) fn split(line: &[Output], options: &Options) -> Option<Vec<Vec<Output>>> {
    if output::width(line) <= options.max_split_width {
        return None;
    }
    if line.iter().any(|piece| piece.kind == Kind::Verbatim || piece.text.contains('\n')) {
        return None;
    }

    let open = line.iter().position(|piece| piece.kind == Kind::Lt)?;
    let close = matching_close(line, open)?;
    let (elements, trailing_comma) = elements(&line[open + 1..close]);
    if elements.is_empty() {
        return None;
    }

    let indent = match line.first() {
        Some(first) if matches!(first.kind, Kind::LineIndent | Kind::HardBlank) => {
            first.text.as_str()
        }
        _ => "",
    };
    let inner = format!("{indent}{}", " ".repeat(options.tab_width));
    let add_commas = elements.len() > 1 || trailing_comma;

    let mut lines = vec![line[..=open].to_vec()];
    for element in elements {
        let mut next = vec![Output::new(Kind::LineIndent, inner.as_str())];
        next.extend_from_slice(element);
        if add_commas {
            next.push(Output::new(Kind::Op, ","));
        }
        lines.push(next);
    }
    let mut last = vec![Output::new(Kind::LineIndent, indent)];
    last.extend_from_slice(&line[close..]);
    lines.push(last);

    Some(
        lines
            .into_iter()
            .flat_map(|line| split(&line, options).unwrap_or_else(|| vec![line]))
            .collect(),
    )
}

fn matching_close(line: &[Output], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, piece) in line.iter().enumerate().skip(open) {
        if piece.is_opener() {
            depth += 1;
        } else if piece.kind == Kind::Rt {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// The comma-separated elements of a bracket's contents, and whether the last
/// one is followed by a comma.
///
/// Commas in a comprehension target (`for k, v in`) and in lambda parameters
/// (`lambda a, b:`) do not separate elements.
fn elements(contents: &[Output]) -> (Vec<&[Output]>, bool) {
    let mut elements = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    // The word that ends the current target or parameter list.
    let mut until: Option<(Kind, &str)> = None;
    for (i, piece) in contents.iter().enumerate() {
        if piece.is_opener() {
            depth += 1;
        } else if piece.kind == Kind::Rt {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            if let Some((kind, text)) = until {
                if piece.kind == kind && piece.text == text {
                    until = None;
                }
            } else if piece.kind == Kind::WordOp && piece.text == "for" {
                until = Some((Kind::WordOp, "in"));
            } else if piece.kind == Kind::Word && piece.text == "lambda" {
                until = Some((Kind::Op, ":"));
            } else if piece.is_op(",") {
                elements.push(trim_blanks(&contents[start..i]));
                start = i + 1;
            }
        }
    }

    let last = trim_blanks(&contents[start..]);
    let trailing_comma = last.is_empty() && !elements.is_empty();
    if !last.is_empty() {
        elements.push(last);
    }
    (elements, trailing_comma)
}

fn trim_blanks(pieces: &[Output]) -> &[Output] {
    let start = pieces.iter().position(|piece| piece.kind != Kind::Blank).unwrap_or(pieces.len());
    let end = pieces.iter().rposition(|piece| piece.kind != Kind::Blank).map_or(start, |i| i + 1);
    &pieces[start..end]
}

/// Joins the physical lines of one logical line into a single line of text.
///
/// `region` holds the line's pieces after its indentation `indent`. Lines stay
/// apart when they hold a comment, a string (unless allowed), a backslash
/// continuation, a line split earlier, or a trailing comma before the closing
/// bracket, and when the joined line would be wider than the join width.
pub(crate) fn join(indent: &str, region: &[Output], options: &Options) -> Option<String> {
    let mut line_ends = 0;
    for piece in region {
        match piece.kind {
            Kind::Comment | Kind::Verbatim | Kind::LineEnd(LineEnd::Split) => return None,
            Kind::String if !options.allow_joined_strings => return None,
            Kind::LineEnd(_) => line_ends += 1,
            _ if piece.text.contains('\n') => return None,
            _ => {}
        }
    }
    if line_ends == 0 {
        return None;
    }

    let mut joined = String::new();
    let mut prev: Option<&Output> = None;
    let mut after_line_end = false;
    for piece in region {
        if piece.is_line_end() {
            after_line_end = true;
            continue;
        }
        if after_line_end {
            if matches!(piece.kind, Kind::LineIndent | Kind::HardBlank) {
                continue;
            }
            after_line_end = false;
            let after_comma = prev.is_some_and(|prev| prev.is_op(","));
            if piece.kind == Kind::Rt && after_comma {
                return None;
            }
            if piece.kind != Kind::Rt && prev.is_some_and(|prev| !prev.is_opener()) {
                joined.push(' ');
            }
        }
        joined.push_str(&piece.text);
        prev = Some(piece);
    }

    let joined = joined.trim_end();
    if indent.chars().count() + joined.chars().count() > options.max_join_width {
        return None;
    }
    Some(joined.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(list: &[(Kind, &str)]) -> Vec<Output> {
        list.iter().map(|&(kind, text)| Output::new(kind, text)).collect()
    }

    #[test]
    fn elements_at_top_level_only() {
        let contents = pieces(&[
            (Kind::Word, "a"),
            (Kind::Op, ","),
            (Kind::Blank, " "),
            (Kind::Word, "g"),
            (Kind::Lt, "("),
            (Kind::Word, "b"),
            (Kind::Op, ","),
            (Kind::Blank, " "),
            (Kind::Word, "c"),
            (Kind::Rt, ")"),
            (Kind::Op, ","),
        ]);
        let (elements, trailing_comma) = elements(&contents);
        let rendered: Vec<String> = elements.iter().copied().map(output::render).collect();
        assert_eq!(rendered, ["a", "g(b, c)"]);
        assert!(trailing_comma);
    }

    #[test]
    fn targets_and_parameters_are_not_elements() {
        let contents = pieces(&[
            (Kind::Word, "k"),
            (Kind::WordOp, "for"),
            (Kind::Word, "k"),
            (Kind::Op, ","),
            (Kind::Word, "v"),
            (Kind::WordOp, "in"),
            (Kind::Word, "items"),
        ]);
        let (elements, _) = elements(&contents);
        assert_eq!(elements.len(), 1);

        let contents = pieces(&[
            (Kind::Word, "xs"),
            (Kind::Op, ","),
            (Kind::Word, "key"),
            (Kind::OpNoBlanks, "="),
            (Kind::Word, "lambda"),
            (Kind::Word, "a"),
            (Kind::Op, ","),
            (Kind::Word, "b"),
            (Kind::Op, ":"),
            (Kind::Word, "a"),
            (Kind::Op, ","),
            (Kind::Word, "ys"),
        ]);
        let (elements, _) = super::elements(&contents);
        let rendered: Vec<String> = elements.iter().copied().map(output::render).collect();
        assert_eq!(rendered, ["xs", "key=lambdaab:a", "ys"]);
    }

    #[test]
    fn unbalanced_lines_are_not_split() {
        let options = Options { max_split_width: 4, ..Options::default() };
        let line = pieces(&[
            (Kind::LineIndent, ""),
            (Kind::Word, "call"),
            (Kind::Lt, "("),
            (Kind::Word, "argument"),
            (Kind::Op, ","),
        ]);
        assert_eq!(split(&line, &options), None);
    }

    #[test]
    fn joins_skip_continuation_indentation() {
        let region = pieces(&[
            (Kind::Word, "f"),
            (Kind::Lt, "("),
            (Kind::LineEnd(LineEnd::Nl), "\n"),
            (Kind::HardBlank, "    "),
            (Kind::Word, "a"),
            (Kind::Op, ","),
            (Kind::LineEnd(LineEnd::Nl), "\n"),
            (Kind::HardBlank, "    "),
            (Kind::Word, "b"),
            (Kind::LineEnd(LineEnd::Nl), "\n"),
            (Kind::LineIndent, ""),
            (Kind::Rt, ")"),
        ]);
        let options = Options::default();
        assert_eq!(join("    ", &region, &options).as_deref(), Some("f(a, b)"));

        let narrow = Options { max_join_width: 10, ..options };
        assert_eq!(join("    ", &region, &narrow), None);
    }
}
