use std::fmt::Write as _;

use expect_test::{Expect, expect};
use weft_sync::{link, traverse};
use weft_syntax::{Constant, NodeKind, TokenKind};

use crate::{RewriteReport, rewrite_interpolations};

fn fstringify(text: &str) -> (String, RewriteReport) {
    let mut linked = link("t.py", text).unwrap();
    let report = rewrite_interpolations(&mut linked).unwrap();
    traverse(&linked.tree, |_| {}).unwrap();
    (linked.text(), report)
}

fn check(text: &str, expect: Expect) {
    let (mut actual, report) = fstringify(text);
    for (line, reason) in &report.skipped {
        writeln!(actual, "-- line {line}: {reason}").unwrap();
    }
    expect.assert_eq(&actual);
}

#[test]
fn tuple_of_values() {
    check(
        "msg = '%s is %d' % (name, age)\n",
        expect![[r#"
            msg = f'{name} is {age}'
        "#]],
    );
}

#[test]
fn single_value_inside_a_call() {
    check(
        "print('hello %s' % name)\n",
        expect![[r#"
            print(f'hello {name}')
        "#]],
    );
}

#[test]
fn specifiers_become_format_specs() {
    check(
        "row = '%5.2f|%-10s|%r|%03d|100%%' % (a, b, c, d)\n",
        expect![[r#"
            row = f'{a:5.2f}|{b!s:<10}|{c!r}|{d:03d}|100%'
        "#]],
    );
}

#[test]
fn literal_braces_are_doubled() {
    check(
        "s = '{%s}' % x\n",
        expect![[r#"
            s = f'{{{x}}}'
        "#]],
    );
}

#[test]
fn values_keep_their_leading_parentheses() {
    check(
        "x = '%s' % (a, b)[0]\ny = '%s' % (a + b).c\nz = '%s and %s' % ((a)[1], (b))\n",
        expect![[r#"
            x = f'{(a, b)[0]}'
            y = f'{(a + b).c}'
            z = f'{(a)[1]} and {b}'
        "#]],
    );
}

#[test]
fn quotes_switch_when_a_value_needs_them() {
    check(
        "s = '%s' % d['k']\nt = '\"%s\"' % d['k']\n",
        expect![[r#"
            s = f"{d['k']}"
            t = '"%s"' % d['k']
            -- line 2: no quote character fits
        "#]],
    );
}

#[test]
fn unconvertible_interpolations_are_left_alone() {
    check(
        r#"a = '%(x)s' % m
b = '%s %s' % x
c = '%s' % '\n'
d = r'%s' % x
e = '%c' % x
f = '%s' % (lambda: 1)
g = '''%s''' % x
h = '%s' 'tail' % x
i = '%s' % (*xs,)
"#,
        expect![[r#"
            a = '%(x)s' % m
            b = '%s %s' % x
            c = '%s' % '\n'
            d = r'%s' % x
            e = '%c' % x
            f = '%s' % (lambda: 1)
            g = '''%s''' % x
            h = '%s' 'tail' % x
            i = '%s' % (*xs,)
            -- line 1: mapping keys are not supported
            -- line 2: 2 specifiers for 1 values
            -- line 3: backslash in a value
            -- line 4: string literal has a prefix
            -- line 5: unsupported specifier "%c"
            -- line 6: value would need parentheses
            -- line 7: triple-quoted string literal
            -- line 8: implicitly concatenated string literals
            -- line 9: starred value
        "#]],
    );
}

#[test]
fn expressions_spanning_lines_are_skipped() {
    check(
        "s = ('%s' %\n     x)\nt = '%s' % y  # note\n",
        expect![[r#"
            s = ('%s' %
                 x)
            t = f'{y}'  # note
            -- line 1: expression spans lines
        "#]],
    );
}

#[test]
fn nested_interpolation_is_rewritten_once() {
    let (text, report) = fstringify("s = '%s!' % ('%s' % x)\n");
    assert_eq!(text, "s = f\"{'%s' % x}!\"\n");
    assert_eq!(report.rewritten, [(1, "f\"{'%s' % x}!\"".to_owned())]);
    assert!(report.skipped.is_empty());
}

#[test]
fn tree_and_tokens_follow_the_rewrite() {
    let mut linked = link("t.py", "msg = '%s is %d' % (name, age)\n").unwrap();
    rewrite_interpolations(&mut linked).unwrap();

    let first = linked.tokens.iter().find(|token| token.kind == TokenKind::String).unwrap();
    assert_eq!(first.text, "f'{name} is {age}'");
    let literal = first.node.unwrap();
    assert!(matches!(
        linked.tree.kind(literal),
        NodeKind::Constant(Constant::Str(literals)) if literals == &[first.text.clone()]
    ));
    assert!(linked.tree.is_attached(literal));

    let range = linked.tree[literal].token_range.unwrap();
    assert!(range.indices().skip(1).all(|index| linked.tokens[index].kind == TokenKind::Killed));

    link("t.py", &linked.text()).unwrap();
}

#[test]
fn files_without_interpolations_are_untouched() {
    let text = "x = 5 % 3\ny = '%s'\nz = f'{x}' % y\n";
    let (actual, report) = fstringify(text);
    assert_eq!(actual, text);
    assert_eq!(report, RewriteReport::default());
}
