use std::fmt::Write as _;

use expect_test::{Expect, expect};
use weft_syntax::{NodeKind, TokenKind, TokenRange};

use crate::{
    ConsistencyError, LinkedTree, link, match_open_parens, match_parens, renumber, synchronize,
    tokens_for_node, traverse,
};

fn sync_text(text: &str) -> LinkedTree {
    link("t.py", text).unwrap()
}

/// Every linked token with the kind of its node.
fn render_links(linked: &LinkedTree) -> String {
    let mut buf = String::new();
    for token in linked.tokens.iter() {
        if let Some(node) = token.node {
            writeln!(buf, "{} {}", token.show(), linked.tree.kind(node).name()).unwrap();
        }
    }
    buf
}

fn check_links(text: &str, expect: Expect) {
    let linked = sync_text(text);
    expect.assert_eq(&render_links(&linked));
}

fn assert_well_formed(linked: &LinkedTree) {
    let tree = &linked.tree;

    for token in linked.tokens.iter() {
        if token.is_significant() {
            assert!(token.node.is_some(), "{} at {} is not linked", token.show(), token.index);
        } else if token.node.is_some() {
            assert!(token.is_op("(") || token.is_op(")"), "{} is linked", token.show());
        }
    }

    traverse(tree, |node| {
        let range = tree[node].token_range;
        if let (Some(parent), Some(range)) = (tree[node].parent, range) {
            let parent_range = tree[parent].token_range.unwrap();
            assert!(parent_range.contains_range(range), "{node:?} escapes its parent");
        }

        let ranges: Vec<TokenRange> =
            tree[node].children.iter().filter_map(|&child| tree[child].token_range).collect();
        for pair in ranges.windows(2) {
            assert!(pair[0].last < pair[1].first, "children of {node:?} out of order");
        }
    })
    .unwrap();
}

#[test]
fn elif_chain_links_each_keyword() {
    check_links(
        "if a:\n    pass\nelif b:\n    pass\n",
        expect![[r#"
            name "if" If
            name "a" Name
            op ":" If
            name "pass" Pass
            name "elif" If
            name "b" Name
            op ":" If
            name "pass" Pass
            end of file Module
        "#]],
    );
}

#[test]
fn else_holding_a_lone_if() {
    check_links(
        "if a:\n    pass\nelse:\n    if b:\n        pass\n",
        expect![[r#"
            name "if" If
            name "a" Name
            op ":" If
            name "pass" Pass
            name "else" If
            op ":" If
            name "if" If
            name "b" Name
            op ":" If
            name "pass" Pass
            end of file Module
        "#]],
    );
}

#[test]
fn call_owns_its_parentheses() {
    let linked = sync_text("f(a, (b))\n");
    expect![[r#"
        name "f" Name
        op "(" Call
        name "a" Name
        name "b" Name
        op ")" Call
        end of file Module
    "#]]
    .assert_eq(&render_links(&linked));

    let call = linked.tokens[1].node.unwrap();
    assert_eq!(linked.tree[call].token_range, Some(TokenRange { first: 0, last: 8 }));
    let statement = linked.tree[call].parent.unwrap();
    assert_eq!(linked.tree[statement].token_range, Some(TokenRange { first: 0, last: 8 }));
}

#[test]
fn keyword_arguments_in_source_order() {
    check_links(
        "f(x, key=1, *rest, **extra)\n",
        expect![[r#"
            name "f" Name
            op "(" Call
            name "x" Name
            name "key" Call
            op "=" Call
            number "1" Constant
            op "*" Starred
            name "rest" Name
            op "**" Call
            name "extra" Name
            op ")" Call
            end of file Module
        "#]],
    );
}

#[test]
fn parameters_with_defaults_and_markers() {
    check_links(
        "def f(a, /, b=1, *, c, **kw) -> int:\n    pass\n",
        expect![[r#"
            name "def" FunctionDef
            name "f" FunctionDef
            name "a" Arg
            op "/" Arguments
            name "b" Arg
            op "=" Arguments
            number "1" Constant
            op "*" Arguments
            name "c" Arg
            op "**" Arguments
            name "kw" Arg
            op "->" FunctionDef
            name "int" Name
            op ":" FunctionDef
            name "pass" Pass
            end of file Module
        "#]],
    );
}

#[test]
fn slices_with_optional_colons() {
    check_links(
        "x[1:2:]\n",
        expect![[r#"
            name "x" Name
            op "[" Subscript
            number "1" Constant
            op ":" Slice
            number "2" Constant
            op ":" Slice
            op "]" Subscript
            end of file Module
        "#]],
    );
    check_links(
        "x[a:, :b]\n",
        expect![[r#"
            name "x" Name
            op "[" Subscript
            name "a" Name
            op ":" Slice
            op ":" Slice
            name "b" Name
            op "]" Subscript
            end of file Module
        "#]],
    );
}

#[test]
fn relative_imports() {
    check_links(
        "from ...pkg import a as b\nfrom .. import c\n",
        expect![[r#"
            name "from" ImportFrom
            op "..." ImportFrom
            name "pkg" ImportFrom
            name "import" ImportFrom
            name "a" ImportFrom
            name "as" ImportFrom
            name "b" ImportFrom
            name "from" ImportFrom
            op "." ImportFrom
            op "." ImportFrom
            name "import" ImportFrom
            name "c" ImportFrom
            end of file Module
        "#]],
    );
}

#[test]
fn ranges_nest_and_cover_every_token() {
    let sources = [
        "x = 1\n",
        "msg = '%s is %d' % (name, age)\n",
        "@decorator(arg)\nclass C(Base, metaclass=Meta):\n    def m(self, *args):\n        \
         return [y for y in args if y]\n",
        "try:\n    pass\nexcept (A, B) as e:\n    raise X from e\nelse:\n    pass\nfinally:\n    \
         del a, b\n",
        "with open(p) as f, lock:\n    while not f.closed:\n        f.read()\n    else:\n        \
         pass\n",
        "async def g():\n    async for i in aiter():\n        await i\n",
        "d = {**base, 'k': v if v else None, 1: lambda: 0}\n",
        "s = {a for a in b}; t = {k: v for k, v in items}\n",
        "global a, b\nassert x, 'msg'\nprint(f'{x}' 'tail')\n",
        "y = a < b <= c is not d not in e\nz = -a ** ~b and not c or d\n",
        "for i, (j, k) in enumerate(pairs):\n    continue\n",
        "n: int = (yield)\nm = (yield from gen())\nx[::2] += 1\n",
    ];
    for text in sources {
        assert_well_formed(&sync_text(text));
    }
}

#[test]
fn synchronization_is_deterministic() {
    let text = "def f(a, b=2):\n    # note\n    return g(a)(b)[1:]\n";
    let first = sync_text(text);
    let second = sync_text(text);
    assert_eq!(render_links(&first), render_links(&second));
    assert_eq!(first.tree.dump(), second.tree.dump());
    assert_eq!(first.text(), text);
}

#[test]
fn comments_attach_to_the_next_node() {
    let linked = sync_text("# lead\nx = 1\n");
    let comment = linked.tokens.iter().position(|t| t.kind == TokenKind::Comment).unwrap();
    let name = linked.tokens.iter().find(|t| t.is_name("x")).unwrap().node.unwrap();
    assert_eq!(linked.tree[name].comments, vec![comment]);

    let linked = sync_text("x = 1  # trailing\n");
    let comment = linked.tokens.iter().position(|t| t.kind == TokenKind::Comment).unwrap();
    assert_eq!(linked.tree[linked.tree.root()].comments, vec![comment]);
}

#[test]
fn line_ends_know_their_statement() {
    let linked = sync_text("def f():\n    return 1\n");
    let line_ends: Vec<_> =
        linked.tokens.iter().filter(|token| token.kind == TokenKind::Newline).collect();
    assert_eq!(line_ends.len(), 2);

    assert_eq!(line_ends[0].statement, None);
    let statement = line_ends[1].statement.unwrap();
    assert!(matches!(linked.tree.kind(statement), NodeKind::Return { .. }));
}

#[test]
fn mismatched_tokens_and_tree() {
    let tokens = weft_tokenizer::make_tokens("x = 1\n").unwrap();
    let tree = weft_parse::parse("y = 1\n").unwrap();
    let error = synchronize("a.py", tokens, tree).unwrap_err();
    expect![[r#"a.py: line 1: expected name "y", found name "x" (token 0)"#]]
        .assert_eq(&error.to_string());

    let tokens = weft_tokenizer::make_tokens("x = 1\ny = 2\n").unwrap();
    let tree = weft_parse::parse("x = 1\n").unwrap();
    let error = synchronize("a.py", tokens, tree).unwrap_err();
    expect![[r#"a.py: line 2: expected end of file, found name "y" (token 6)"#]]
        .assert_eq(&error.to_string());
}

#[test]
fn traverse_checks_visitation_order() {
    let mut linked = sync_text("x = 1\n");
    let mut kinds = Vec::new();
    let count = traverse(&linked.tree, |node| kinds.push(linked.tree.kind(node).name())).unwrap();
    assert_eq!(count, 4);
    assert_eq!(kinds, ["Module", "Assign", "Name", "Constant"]);

    let name = linked.tokens[0].node.unwrap();
    linked.tree[name].node_index = Some(7);
    assert_eq!(
        traverse(&linked.tree, |_| {}),
        Err(ConsistencyError { expected: 2, found: Some(7), node: name })
    );

    renumber(&mut linked.tree);
    assert_eq!(traverse(&linked.tree, |_| {}), Ok(4));
}

#[test]
fn node_tokens_extend_to_balancing_parens() {
    let linked = sync_text("x = a * (b + c)\n");
    let product = linked.tokens[6].node.unwrap();
    assert!(matches!(linked.tree.kind(product), NodeKind::BinOp { .. }));
    assert_eq!(linked.tree[product].token_range, Some(TokenRange { first: 4, last: 13 }));
    assert_eq!(tokens_for_node(&linked, product), Ok(Some(TokenRange { first: 4, last: 14 })));

    let error = match_parens("t.py", &linked.tokens, TokenRange { first: 8, last: 9 }).unwrap_err();
    expect![[r#"t.py: line 1: expected 1 more ')', found op "+" (token 11)"#]]
        .assert_eq(&error.to_string());
}

#[test]
fn node_tokens_extend_back_to_balancing_parens() {
    fn node_text(text: &str, is_target: fn(&NodeKind) -> bool) -> String {
        let linked = sync_text(text);
        let mut target = None;
        traverse(&linked.tree, |node| {
            if target.is_none() && is_target(linked.tree.kind(node)) {
                target = Some(node);
            }
        })
        .unwrap();
        let range = tokens_for_node(&linked, target.unwrap()).unwrap().unwrap();
        range.indices().map(|index| linked.tokens[index].text.as_str()).collect()
    }

    let subscript = |kind: &NodeKind| matches!(kind, NodeKind::Subscript { .. });
    let attribute = |kind: &NodeKind| matches!(kind, NodeKind::Attribute { .. });
    assert_eq!(node_text("x = (a, b)[0]\n", subscript), "(a, b)[0]");
    assert_eq!(node_text("x = ((a + b)).c\n", attribute), "((a + b)).c");
    assert_eq!(node_text("f(x, (a)[1])\n", subscript), "(a)[1]");

    let linked = sync_text("x = (a)\n");
    let name = TokenRange { first: 5, last: 6 };
    assert_eq!(match_open_parens("t.py", &linked.tokens, name), Ok(4));
    let close = TokenRange { first: 6, last: 6 };
    let error = match_open_parens("t.py", &linked.tokens, close).unwrap_err();
    expect![[r#"t.py: line 1: expected 1 more '(', found name "a" (token 5)"#]]
        .assert_eq(&error.to_string());
}
