use std::convert::Infallible;

use weft_syntax::{NodeId, SyntaxTree};

/// A node was reached out of the order the generator visited it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("node {node:?} has visitation index {found:?}, expected {expected}")]
pub struct ConsistencyError {
    pub expected: u32,
    pub found: Option<u32>,
    pub node: NodeId,
}

/// Calls `visit` on every node of `tree` in token order, without recursion.
///
/// The n-th visited node must carry visitation index n. Returns the number of
/// visited nodes.
pub fn traverse(
    tree: &SyntaxTree,
    mut visit: impl FnMut(NodeId),
) -> Result<usize, ConsistencyError> {
    let mut count = 0;
    walk(tree, |node| {
        let expected = count;
        if tree[node].node_index != Some(expected) {
            return Err(ConsistencyError { expected, found: tree[node].node_index, node });
        }
        visit(node);
        count += 1;
        Ok(())
    })?;
    Ok(count as usize)
}

/// Reassigns visitation indices in token order, after nodes have been spliced.
pub fn renumber(tree: &mut SyntaxTree) {
    let mut order = Vec::with_capacity(tree.len());
    let Ok(()) = walk(tree, |node| -> Result<(), Infallible> {
        order.push(node);
        Ok(())
    });
    for (index, node) in (0..).zip(order) {
        tree[node].node_index = Some(index);
    }
}

/// Pre-order walk over child links with an explicit stack of child positions.
fn walk<E>(tree: &SyntaxTree, mut f: impl FnMut(NodeId) -> Result<(), E>) -> Result<(), E> {
    let root = tree.root();
    f(root)?;

    // (node, index of the next child to visit)
    let mut stack = vec![(root, 0_usize)];
    while let Some((node, next)) = stack.last_mut() {
        match tree[*node].children.get(*next) {
            Some(&child) => {
                *next += 1;
                f(child)?;
                stack.push((child, 0));
            }
            None => {
                stack.pop();
            }
        }
    }
    Ok(())
}
