use std::fmt::{self, Write as _};
use std::ops::{Index, IndexMut};

use la_arena::{Arena, Idx};
use text_size::TextSize;

use crate::NodeKind;

pub type NodeId = Idx<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenRange {
    pub first: usize,
    pub last: usize,
}

impl TokenRange {
    pub const fn single(index: usize) -> Self {
        Self { first: index, last: index }
    }

    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self { first: self.first.min(other.first), last: self.last.max(other.last) }
    }

    pub const fn contains_range(self, other: Self) -> bool {
        self.first <= other.first && other.last <= self.last
    }

    pub fn indices(self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Offset of the node's first character, as reported by the parser.
    pub start: TextSize,
    pub parent: Option<NodeId>,
    /// Children in visitation order.
    pub children: Vec<NodeId>,
    pub node_index: Option<u32>,
    pub token_range: Option<TokenRange>,
    /// Indices of the comment tokens attached to this node.
    pub comments: Vec<usize>,
}

impl Node {
    pub fn new(kind: NodeKind, start: TextSize) -> Self {
        Self {
            kind,
            start,
            parent: None,
            children: Vec::new(),
            node_index: None,
            token_range: None,
            comments: Vec::new(),
        }
    }

    /// Extends the owned token range to include `range`.
    pub fn cover(&mut self, range: TokenRange) {
        self.token_range = Some(self.token_range.map_or(range, |own| own.cover(range)));
    }
}

/// Arena of syntax nodes with a distinguished root.
///
/// Nodes are never removed; a node spliced out by [`SyntaxTree::replace_child`]
/// simply becomes unreachable from the root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Arena<Node>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn new(nodes: Arena<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(node)
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node].kind
    }

    /// `node` followed by its parents up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), |&node| self.nodes[node].parent)
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether `node` can still be reached from the root through child links.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if !self.nodes[parent].children.contains(&current) {
                return false;
            }
            current = parent;
        }
        current == self.root
    }

    /// Swaps `old` for `new` in the children and fields of `parent`.
    ///
    /// `new` takes over the parent link and visitation index of `old`.
    #[track_caller]
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let parent_node = &mut self.nodes[parent];

        let positions: Vec<usize> = parent_node
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, &child)| (child == old).then_some(i))
            .collect();
        assert_eq!(positions.len(), 1, "{old:?} must be a child of {parent:?} exactly once");
        parent_node.children[positions[0]] = new;

        let mut replaced = 0;
        for slot in parent_node.kind.slots_mut() {
            if *slot == old {
                *slot = new;
                replaced += 1;
            }
        }
        assert_eq!(replaced, 1, "{old:?} must fill exactly one field of {parent:?}");

        let node_index = self.nodes[old].node_index;
        let new_node = &mut self.nodes[new];
        new_node.parent = Some(parent);
        new_node.node_index = node_index;
    }

    /// Renders the tree below the root, one node per line.
    pub fn dump(&self) -> String {
        let mut buf = String::new();
        self.dump_node(&mut buf, self.root, 0);
        buf
    }

    fn dump_node(&self, buf: &mut String, node: NodeId, depth: usize) {
        let _ = writeln!(buf, "{:indent$}{}", "", DumpNode(&self.nodes[node]), indent = depth * 2);

        let children = &self.nodes[node].children;
        let children =
            if children.is_empty() { self.nodes[node].kind.slots() } else { children.clone() };
        for child in children {
            self.dump_node(buf, child, depth + 1);
        }
    }
}

struct DumpNode<'a>(&'a Node);

impl fmt::Display for DumpNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::Constant;

        let node = self.0;
        f.write_str(node.kind.name())?;
        match &node.kind {
            NodeKind::Name { id } => write!(f, " {id}")?,
            NodeKind::Attribute { attr, .. } => write!(f, " .{attr}")?,
            NodeKind::Arg { name, .. } => write!(f, " {name}")?,
            NodeKind::FunctionDef(def) => write!(f, " {}", def.name)?,
            NodeKind::ClassDef(def) => write!(f, " {}", def.name)?,
            NodeKind::BinOp { op, .. } | NodeKind::AugAssign { op, .. } => {
                write!(f, " {}", op.as_str())?;
            }
            NodeKind::UnaryOp { op, .. } => write!(f, " {}", op.as_str())?,
            NodeKind::BoolOp { op, .. } => write!(f, " {}", op.as_str())?,
            NodeKind::Compare { ops, .. } => {
                for op in ops {
                    write!(f, " {}", op.as_str())?;
                }
            }
            NodeKind::Constant(Constant::Number(text)) => write!(f, " {text}")?,
            NodeKind::Constant(Constant::Str(literals) | Constant::Bytes(literals))
            | NodeKind::JoinedStr { literals } => write!(f, " {}", literals.join(" "))?,
            NodeKind::Constant(constant) => {
                write!(f, " {}", constant.keyword().unwrap_or("..."))?;
            }
            NodeKind::Import { names } | NodeKind::ImportFrom { names, .. } => {
                for alias in names {
                    write!(f, " {}", alias.name)?;
                    if let Some(asname) = &alias.asname {
                        write!(f, " as {asname}")?;
                    }
                }
            }
            NodeKind::Call { keywords, .. } => {
                for keyword in keywords {
                    write!(f, " {}=", keyword.arg.as_deref().unwrap_or("**"))?;
                }
            }
            _ => {}
        }
        if let Some(range) = node.token_range {
            write!(f, " @{}..={}", range.first, range.last)?;
        }
        Ok(())
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = Node;

    #[track_caller]
    fn index(&self, index: NodeId) -> &Node {
        &self.nodes[index]
    }
}

impl IndexMut<NodeId> for SyntaxTree {
    #[track_caller]
    fn index_mut(&mut self, index: NodeId) -> &mut Node {
        &mut self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::BinOpKind;

    fn name(tree: &mut SyntaxTree, id: &str) -> NodeId {
        tree.alloc(Node::new(NodeKind::Name { id: id.to_owned() }, 0.into()))
    }

    fn sample() -> (SyntaxTree, NodeId, NodeId) {
        let mut nodes = Arena::new();
        let placeholder = nodes.alloc(Node::new(NodeKind::Pass, 0.into()));
        let mut tree = SyntaxTree::new(nodes, placeholder);

        let left = name(&mut tree, "a");
        let right = name(&mut tree, "b");
        let binop = tree.alloc(Node::new(
            NodeKind::BinOp { left, op: BinOpKind::Add, right },
            0.into(),
        ));
        let expr = tree.alloc(Node::new(NodeKind::Expr { value: binop }, 0.into()));
        let module = tree.alloc(Node::new(NodeKind::Module { body: vec![expr] }, 0.into()));
        tree.root = module;

        for (parent, child) in [(module, expr), (expr, binop), (binop, left), (binop, right)] {
            tree[parent].children.push(child);
            tree[child].parent = Some(parent);
        }
        (tree, binop, right)
    }

    #[test]
    fn replace_child_updates_children_and_fields() {
        let (mut tree, binop, right) = sample();
        tree[right].node_index = Some(7);
        let new = name(&mut tree, "c");

        tree.replace_child(binop, right, new);

        assert_eq!(tree[binop].children[1], new);
        assert_eq!(tree[new].parent, Some(binop));
        assert_eq!(tree[new].node_index, Some(7));
        assert!(tree.is_attached(new));
        assert!(!tree.is_attached(right));
        expect![[r#"
            Module
              Expr
                BinOp +
                  Name a
                  Name c
        "#]]
        .assert_eq(&tree.dump());
    }

    #[test]
    #[should_panic(expected = "exactly once")]
    fn replace_child_rejects_strangers() {
        let (mut tree, binop, _) = sample();
        let stranger = name(&mut tree, "x");
        let new = name(&mut tree, "y");
        tree.replace_child(binop, stranger, new);
    }

    #[test]
    fn ranges_cover() {
        let mut node = Node::new(NodeKind::Pass, 0.into());
        node.cover(TokenRange::single(4));
        node.cover(TokenRange::single(2));
        node.cover(TokenRange { first: 3, last: 9 });
        assert_eq!(node.token_range, Some(TokenRange { first: 2, last: 9 }));
        assert!(TokenRange { first: 2, last: 9 }.contains_range(TokenRange::single(9)));
    }
}
